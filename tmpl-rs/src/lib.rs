//! Streaming template engine for rendering test reports.
//!
//! - [`template`] — the engine: [`Context`](template::Context), directive
//!   parser and the single-pass [`Interpreter`](template::Interpreter).
//! - [`defs`] — definitions files that fill a context from text.
//! - [`cli`] — argument parsing for the `tmpl` binary.

pub mod cli;
pub mod defs;
pub mod template;
