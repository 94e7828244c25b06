use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use tmpl::cli::{self, CliArgs, Output};
use tmpl::defs;
use tmpl::template::{self, Context};

const USAGE: &str = "Usage: tmpl [-p<prefix>] [-f<defs>]... [-D<name>=<value>]... \
                     [-V<name>=<v1,v2,...>]... [-d] <template> [<output>]";

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("tmpl: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tmpl: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-d` selects `debug` and the default
/// is `warn`.
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &CliArgs) -> Result<(), String> {
    // ── Build the context ─────────────────────────────────────────────────────
    let mut ctx = Context::new();
    let mut defs_failed = false;
    for path in &args.defs_files {
        let errors = defs::load_file(path, &mut ctx)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        for e in &errors {
            eprintln!("tmpl: {}: {e}", path.display());
        }
        defs_failed |= !errors.is_empty();
    }
    if defs_failed {
        return Err("invalid definitions".to_owned());
    }
    args.apply_defines(&mut ctx)?;
    debug!(
        variables = ctx.variables().count(),
        vectors = ctx.vectors().count(),
        "context ready"
    );

    // ── Instantiate ───────────────────────────────────────────────────────────
    let template_err = |e: template::Error| format!("{}: {e}", args.template.display());
    match &args.output {
        Output::File(path) => {
            template::instantiate_file(&ctx, &args.template, path, &args.prefix)
                .map_err(template_err)
        }
        Output::Stdout => {
            let input = File::open(&args.template).map_err(|e| template_err(e.into()))?;
            let stdout = io::stdout();
            template::instantiate_with_prefix(
                &ctx,
                BufReader::new(input),
                BufWriter::new(stdout.lock()),
                &args.prefix,
            )
            .map_err(template_err)
        }
    }
}
