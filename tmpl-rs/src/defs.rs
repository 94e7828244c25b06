//! Definitions files: populate a [`Context`] from text.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | set a variable |
//! | `/vector <name> [<value> …]` | declare (or clear) a vector and fill it |
//! | `/append <name> <value> …` | append to a declared vector |
//! | Lines starting with `;` | comment, ignored |
//!
//! Arguments are split on whitespace; double quotes group words and `\"`
//! escapes a quote inside them.  Errors are reported per line and do not stop
//! the remaining lines from being applied.

use std::path::Path;

use crate::template::Context;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a definitions file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefsError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for DefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for DefsError {}

/// Apply the definitions in `s` to `ctx`.
///
/// Returns the errors found on individual lines; every other line is applied.
pub fn load_str(s: &str, ctx: &mut Context) -> Vec<DefsError> {
    let mut errors = Vec::new();

    for (i, raw) in s.lines().enumerate() {
        let lineno = i + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let result = match line.strip_prefix('/') {
            Some(rest) => {
                let (cmd, args_str) = rest
                    .split_once(|c: char| c.is_ascii_whitespace())
                    .unwrap_or((rest, ""));
                let tokens = split_args(args_str.trim());
                match cmd {
                    "set" => parse_set(&tokens, ctx),
                    "vector" => parse_vector(&tokens, ctx),
                    "append" => parse_append(&tokens, ctx),
                    other => Err(format!("unknown command '/{other}'")),
                }
            }
            None => Err(format!("expected a /command, got '{line}'")),
        };

        if let Err(message) = result {
            errors.push(DefsError { line: lineno, message });
        }
    }

    errors
}

/// Read a definitions file from disk and apply it to `ctx`.
pub fn load_file(path: &Path, ctx: &mut Context) -> std::io::Result<Vec<DefsError>> {
    let s = std::fs::read_to_string(path)?;
    Ok(load_str(&s, ctx))
}

/// Set variable `name`, refusing to shadow a vector.
pub fn define_variable(ctx: &mut Context, name: &str, value: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("variable name cannot be empty".into());
    }
    if ctx.is_vector(name) {
        return Err(format!("'{name}' is already defined as a vector"));
    }
    ctx.add_variable(name, value);
    Ok(())
}

/// Declare vector `name` holding `values`, refusing to shadow a variable.
pub fn define_vector<S: AsRef<str>>(ctx: &mut Context, name: &str, values: &[S]) -> Result<(), String> {
    if name.is_empty() {
        return Err("vector name cannot be empty".into());
    }
    if ctx.is_variable(name) {
        return Err(format!("'{name}' is already defined as a variable"));
    }
    ctx.add_vector(name);
    for value in values {
        ctx.add_to_vector(name, value.as_ref());
    }
    Ok(())
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    // Distinguishes `""` (an empty argument) from no argument at all.
    let mut quoted = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() || quoted {
                    args.push(std::mem::take(&mut cur));
                    quoted = false;
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() || quoted {
        args.push(cur);
    }
    args
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn parse_set(tokens: &[String], ctx: &mut Context) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("/set: requires an argument".into());
    }

    let (name, value) = if let Some((name, first)) = tokens[0].split_once('=') {
        let mut words = vec![first];
        words.extend(tokens[1..].iter().map(String::as_str));
        (name.to_owned(), words.join(" "))
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{}'", tokens[0]));
    };

    define_variable(ctx, &name, &value).map_err(|e| format!("/set: {e}"))
}

fn parse_vector(tokens: &[String], ctx: &mut Context) -> Result<(), String> {
    let Some((name, values)) = tokens.split_first() else {
        return Err("/vector: requires a name".into());
    };
    define_vector(ctx, name, values).map_err(|e| format!("/vector: {e}"))
}

fn parse_append(tokens: &[String], ctx: &mut Context) -> Result<(), String> {
    let Some((name, values)) = tokens.split_first() else {
        return Err("/append: requires a name".into());
    };
    if values.is_empty() {
        return Err(format!("/append: missing value for '{name}'"));
    }
    if !ctx.is_vector(name) {
        return Err(format!("/append: '{name}' is not a declared vector"));
    }
    for value in values {
        ctx.add_to_vector(name, value.as_str());
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
