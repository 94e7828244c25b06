//! Command-line argument parsing.
//!
//! Usage:
//!   tmpl [-p<prefix>] [-f<defs>]... [-D<name>=<value>]... [-V<name>=<v1,v2,...>]... [-d]
//!        <template> [<output>]

use std::path::PathBuf;

use crate::defs;
use crate::template::{Context, DEFAULT_PREFIX};

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// Directive marker (`-p<prefix>`).
    pub prefix: String,
    /// Definitions files to load, in order (`-f<file>`).
    pub defs_files: Vec<PathBuf>,
    /// Variables and vectors given on the command line, in order.
    pub defines: Vec<Define>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Template to instantiate.
    pub template: PathBuf,
    /// Where to write the result.
    pub output: Output,
}

/// A `-D` or `-V` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Define {
    /// `-D<name>=<value>`
    Variable { name: String, value: String },
    /// `-V<name>=<v1,v2,...>`; an empty list after `=` declares an empty vector.
    Vector { name: String, values: Vec<String> },
}

/// Where the instantiated template goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// No output argument, or `-`.
    Stdout,
    File(PathBuf),
}

impl CliArgs {
    /// Build the context described by `-D`/`-V` options on top of `ctx`.
    pub fn apply_defines(&self, ctx: &mut Context) -> Result<(), String> {
        for define in &self.defines {
            match define {
                Define::Variable { name, value } => defs::define_variable(ctx, name, value)?,
                Define::Vector { name, values } => defs::define_vector(ctx, name, values.as_slice())?,
            }
        }
        Ok(())
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut prefix = DEFAULT_PREFIX.to_owned();
    let mut defs_files = Vec::new();
    let mut defines = Vec::new();
    let mut debug = false;
    let mut positional: Vec<String> = Vec::new();
    let mut args = argv.iter();

    while let Some(arg) = args.next() {
        if arg == "--" {
            positional.extend(args.by_ref().cloned());
            break;
        }

        // A bare `-` names stdout, so it is positional too.
        let Some(flags) = arg.strip_prefix('-').filter(|f| !f.is_empty()) else {
            positional.push(arg.clone());
            continue;
        };

        for (at, flag) in flags.char_indices() {
            match flag {
                'd' => debug = true,
                'p' | 'f' | 'D' | 'V' => {
                    let value = option_value(flag, &flags[at + flag.len_utf8()..], &mut args)?;
                    match flag {
                        'p' if value.is_empty() => return Err("-p: prefix cannot be empty".to_owned()),
                        'p' => prefix = value,
                        'f' => defs_files.push(PathBuf::from(value)),
                        'D' => defines.push(parse_variable(&value)?),
                        _ => defines.push(parse_vector(&value)?),
                    }
                    // The value consumed the rest of this argument.
                    break;
                }
                c => return Err(format!("unknown option: -{c}")),
            }
        }
    }

    // Positional arguments → template and output.
    let mut positional = positional.into_iter();
    let template = positional
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| "missing template argument".to_owned())?;
    let output = match positional.next().as_deref() {
        None | Some("-") => Output::Stdout,
        Some(path) => Output::File(PathBuf::from(path)),
    };
    let extra = positional.count();
    if extra > 0 {
        return Err(format!("too many arguments ({})", extra + 2));
    }

    Ok(CliArgs {
        prefix,
        defs_files,
        defines,
        debug,
        template,
        output,
    })
}

/// Value of an option: the rest of its own argument (`-p%`) or, when that
/// is empty, the next argument (`-p %`).
fn option_value<'a>(
    flag: char,
    attached: &str,
    rest: &mut impl Iterator<Item = &'a String>,
) -> Result<String, String> {
    if !attached.is_empty() {
        return Ok(attached.to_owned());
    }
    rest.next()
        .cloned()
        .ok_or_else(|| format!("-{flag} requires an argument"))
}

fn split_definition<'a>(flag: char, s: &'a str) -> Result<(&'a str, &'a str), String> {
    match s.split_once('=') {
        Some((name, _)) if name.is_empty() => Err(format!("-{flag}: name cannot be empty")),
        Some(pair) => Ok(pair),
        None => Err(format!("-{flag}: expected <name>=<value>, got '{s}'")),
    }
}

fn parse_variable(s: &str) -> Result<Define, String> {
    let (name, value) = split_definition('D', s)?;
    Ok(Define::Variable {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_vector(s: &str) -> Result<Define, String> {
    let (name, list) = split_definition('V', s)?;
    let values = if list.is_empty() {
        Vec::new()
    } else {
        list.split(',').map(str::to_owned).collect()
    };
    Ok(Define::Vector {
        name: name.to_owned(),
        values,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
