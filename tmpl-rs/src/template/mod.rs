//! Line-directive template engine.
//!
//! A template is ordinary text in which lines starting with a marker prefix
//! (`%` by default) are directives:
//!
//! ```text
//! Hello %value name
//! %loop items i
//! item: %vector-value items i
//! %endloop
//! Count: %vector-length items
//! ```
//!
//! Data comes from a [`Context`] filled in by the caller.  Instantiation is a
//! single forward pass over the input; loops seek the input back to replay
//! their bodies, so the input must be seekable.
//!
//! # Quick start
//!
//! ```rust
//! use tmpl::template::{instantiate_str, Context};
//!
//! let mut ctx = Context::new();
//! ctx.add_variable("name", "kyua");
//! let out = instantiate_str(&ctx, "%value name\n").unwrap();
//! assert_eq!(out, "kyua\n");
//! ```

pub mod context;
pub mod directive;
pub mod error;
pub mod interp;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

// Re-exports for convenience.
pub use context::Context;
pub use directive::{Directive, DirectiveKind};
pub use error::{Error, SyntaxError};
pub use interp::Interpreter;

/// Marker that introduces a directive line unless told otherwise.
pub const DEFAULT_PREFIX: &str = "%";

/// Instantiate `input` into `output` using the default prefix.
///
/// `context` is copied; loop iterators never leak into the caller's copy.
pub fn instantiate<R, W>(context: &Context, input: R, output: W) -> Result<(), Error>
where
    R: BufRead + Seek,
    W: Write,
{
    instantiate_with_prefix(context, input, output, DEFAULT_PREFIX)
}

/// Instantiate `input` into `output`, recognising directives by `prefix`.
pub fn instantiate_with_prefix<R, W>(
    context: &Context,
    input: R,
    output: W,
    prefix: &str,
) -> Result<(), Error>
where
    R: BufRead + Seek,
    W: Write,
{
    Interpreter::new(context.clone(), prefix).run(input, output)
}

/// Instantiate an in-memory template and return the result.
pub fn instantiate_str(context: &Context, template: &str) -> Result<String, Error> {
    let mut out = Vec::new();
    instantiate(context, Cursor::new(template), &mut out)?;
    // Output is made only of UTF-8 input lines and context strings.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Instantiate the file at `input` into the file at `output`.
///
/// The result is written to a temporary file next to `output` and moved into
/// place only once instantiation succeeds, so a failed run leaves any
/// previous `output` untouched.
pub fn instantiate_file(
    context: &Context,
    input: &Path,
    output: &Path,
    prefix: &str,
) -> Result<(), Error> {
    info!(input = %input.display(), output = %output.display(), "instantiating template");

    let reader = BufReader::new(File::open(input)?);
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        instantiate_with_prefix(context, reader, &mut writer, prefix)?;
        writer.flush()?;
    }
    tmp.persist(output).map_err(|e| e.error)?;

    info!(output = %output.display(), "template instantiated");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
