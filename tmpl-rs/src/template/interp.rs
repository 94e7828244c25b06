//! Single-pass template interpreter.
//!
//! The interpreter reads the template one line at a time and never builds a
//! tree.  Literal lines go straight to the output; directive lines are parsed
//! on the spot and dispatched.  Loops remember the input offset just past
//! their `loop` line and seek back to it for every further element, so the
//! body is re-read (and re-parsed) from the input on each iteration.  Memory
//! use is bounded by nesting depth, not by the size of loop bodies.
//!
//! There are two modes:
//!
//! - **Normal** — lines are emitted and directives evaluated.
//! - **Skip** — entered on a false `if` or a loop over an empty vector.
//!   Nothing is emitted or evaluated; nested `if`/`loop` lines only adjust the
//!   depth counters so that the *matching* `endif`/`endloop` can be found.
//!
//! Blocks must nest: an `endif` or `endloop` that would close a block opened
//! outside the innermost open block is a syntax error in either mode.
//!
//! Lines are read as bytes.  Literal text is copied unchanged even when it is
//! not valid UTF-8; only directives and inline substitutions need to decode.

use std::borrow::Cow;
use std::io::{self, BufRead, Seek, SeekFrom, Write};

use tracing::{debug, trace};

use super::context::Context;
use super::directive::Directive;
use super::error::{Error, SyntaxError};

// ── State ─────────────────────────────────────────────────────────────────────

/// Which closing directive ends a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipExit {
    EndIf,
    EndLoop,
}

/// An active skip and the depths it started at.
///
/// The block that started the skip is the only one at the base depth that
/// may be closed while skipping; closing anything below it is unbalanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Skip {
    exit: SkipExit,
    if_base: usize,
    loop_base: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Skip(Skip),
}

/// An open `loop` directive.
#[derive(Debug)]
struct LoopFrame {
    vector: String,
    iterator: String,
    /// Input offset of the first line after the `loop` line.
    resume: u64,
    /// Line number of the `loop` line itself.
    resume_line: usize,
    /// `if_depth` at the `loop` line; the matching `endloop` must see it again.
    if_depth: usize,
}

/// Failure inside a line handler, before it is pinned to a line number.
enum Fault {
    Syntax(SyntaxError),
    Io(io::Error),
}

impl From<SyntaxError> for Fault {
    fn from(e: SyntaxError) -> Self {
        Fault::Syntax(e)
    }
}

impl From<io::Error> for Fault {
    fn from(e: io::Error) -> Self {
        Fault::Io(e)
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// Template interpreter state for one instantiation.
#[derive(Debug)]
pub struct Interpreter {
    context: Context,
    prefix: String,
    mode: Mode,
    if_depth: usize,
    /// Open loops, including those nested inside a skipped region.
    loop_depth: usize,
    loops: Vec<LoopFrame>,
    line_no: usize,
}

impl Interpreter {
    /// Create an interpreter over `context`, recognising directive lines by
    /// `prefix`.
    ///
    /// # Panics
    ///
    /// If `prefix` is empty.
    pub fn new(context: Context, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        assert!(!prefix.is_empty(), "directive prefix must not be empty");
        Self {
            context,
            prefix,
            mode: Mode::Normal,
            if_depth: 0,
            loop_depth: 0,
            loops: Vec::new(),
            line_no: 0,
        }
    }

    /// The live context, including any loop iterators currently bound.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns `true` while the interpreter is discarding lines.
    pub fn is_skipping(&self) -> bool {
        matches!(self.mode, Mode::Skip(_))
    }

    /// Number of loops whose bodies are still being executed or skipped.
    pub fn open_loops(&self) -> usize {
        self.loops.len()
    }

    /// Instantiate the whole of `input` into `output`.
    ///
    /// Stops at the first error; whatever was written before it stays written.
    pub fn run<R, W>(&mut self, mut input: R, mut output: W) -> Result<(), Error>
    where
        R: BufRead + Seek,
        W: Write,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            self.line_no += 1;
            let line = buf.strip_suffix(b"\n").unwrap_or(buf.as_slice());

            let handled = match self.mode {
                Mode::Normal => self.handle_normal(line, &mut input, &mut output),
                Mode::Skip(skip) => self.handle_skip(line, skip),
            };
            handled.map_err(|fault| match fault {
                Fault::Syntax(kind) => Error::Syntax {
                    line: self.line_no,
                    kind,
                },
                Fault::Io(e) => Error::Io(e),
            })?;
        }
        output.flush()?;
        Ok(())
    }

    // ── Normal mode ───────────────────────────────────────────────────────────

    /// The directive text after the prefix, if `line` is a directive line.
    fn directive_text<'a>(&self, line: &'a [u8]) -> Option<Cow<'a, str>> {
        line.strip_prefix(self.prefix.as_bytes())
            .map(String::from_utf8_lossy)
    }

    fn handle_normal<R, W>(&mut self, line: &[u8], input: &mut R, output: &mut W) -> Result<(), Fault>
    where
        R: BufRead + Seek,
        W: Write,
    {
        let Some(rest) = self.directive_text(line) else {
            return self.emit_text(line, output);
        };

        let directive = Directive::parse(&rest)?;
        trace!(line = self.line_no, ?directive, "directive");

        match &directive {
            Directive::EndIf => {
                if self.loops.last().is_some_and(|frame| frame.if_depth == self.if_depth) {
                    // The innermost open block is a loop.
                    return Err(SyntaxError::UnbalancedEndIf.into());
                }
                self.if_depth = self
                    .if_depth
                    .checked_sub(1)
                    .ok_or(SyntaxError::UnbalancedEndIf)?;
            }
            Directive::EndLoop => self.next_iteration(input)?,
            Directive::If { name } => {
                self.if_depth += 1;
                if !self.context.exists(name) {
                    self.enter_skip(SkipExit::EndIf);
                }
            }
            Directive::Loop { vector, iterator } => self.start_loop(vector, iterator, input)?,
            Directive::Value { .. } | Directive::VectorLength { .. } | Directive::VectorValue { .. } => {
                self.substitute(&directive, output)?;
            }
        }
        Ok(())
    }

    /// Emit a line that does not start with the prefix.
    ///
    /// If the line embeds a substitution directive, the text before the prefix
    /// is copied and the directive's value replaces the rest of the line.  The
    /// embedded directive is evaluated like a directive line, so
    /// `Run %value name` fails the run when `name` is unbound; text whose
    /// remainder is not a complete substitution (`100% done`) stays literal.
    /// Lines that are not valid UTF-8 are never scanned and pass through as is.
    fn emit_text<W: Write>(&self, line: &[u8], output: &mut W) -> Result<(), Fault> {
        let inline = std::str::from_utf8(line)
            .ok()
            .and_then(|text| self.find_inline(text));
        match inline {
            Some((literal, directive)) => {
                output.write_all(literal.as_bytes())?;
                self.substitute(&directive, output)
            }
            None => {
                output.write_all(line)?;
                output.write_all(b"\n")?;
                Ok(())
            }
        }
    }

    /// Locate the first prefix occurrence whose remainder is a complete
    /// substitution directive.
    fn find_inline<'a>(&self, line: &'a str) -> Option<(&'a str, Directive)> {
        line.match_indices(self.prefix.as_str()).find_map(|(at, _)| {
            match Directive::parse(&line[at + self.prefix.len()..]) {
                Ok(directive) if directive.kind().is_substitution() => Some((&line[..at], directive)),
                _ => None,
            }
        })
    }

    fn substitute<W: Write>(&self, directive: &Directive, output: &mut W) -> Result<(), Fault> {
        match directive {
            Directive::Value { name } => {
                writeln!(output, "{}", self.context.get_variable(name)?)?;
            }
            Directive::VectorLength { name } => {
                writeln!(output, "{}", self.context.get_vector(name)?.len())?;
            }
            Directive::VectorValue { vector, index } => {
                writeln!(output, "{}", self.context.get_vector_element(vector, index)?)?;
            }
            // Control flow is dispatched by the caller.
            Directive::EndIf | Directive::EndLoop | Directive::If { .. } | Directive::Loop { .. } => {}
        }
        Ok(())
    }

    fn start_loop<R: Seek>(&mut self, vector: &str, iterator: &str, input: &mut R) -> Result<(), Fault> {
        let len = self.context.get_vector(vector)?.len();
        if len > 0 && self.context.is_vector(iterator) {
            return Err(SyntaxError::IteratorIsVector(iterator.to_owned()).into());
        }

        self.loops.push(LoopFrame {
            vector: vector.to_owned(),
            iterator: iterator.to_owned(),
            resume: input.stream_position()?,
            resume_line: self.line_no,
            if_depth: self.if_depth,
        });
        self.loop_depth += 1;

        if len == 0 {
            debug!(line = self.line_no, vector, "loop over empty vector");
            self.enter_skip(SkipExit::EndLoop);
        } else {
            debug!(line = self.line_no, vector, iterator, len, "loop start");
            self.context.add_variable(iterator, "0");
        }
        Ok(())
    }

    /// Advance the innermost loop: rewind for the next element, or close it.
    fn next_iteration<R: Seek>(&mut self, input: &mut R) -> Result<(), Fault> {
        let frame = self.loops.last().ok_or(SyntaxError::UnbalancedEndLoop)?;
        if frame.if_depth != self.if_depth {
            // An `if` opened inside the body is still open.
            return Err(SyntaxError::UnbalancedEndLoop.into());
        }
        let next = self.context.get_index(&frame.iterator)? + 1;

        if next < self.context.get_vector(&frame.vector)?.len() {
            trace!(iterator = %frame.iterator, next, "loop rewind");
            self.context.add_variable(frame.iterator.as_str(), next.to_string());
            input.seek(SeekFrom::Start(frame.resume))?;
            self.line_no = frame.resume_line;
        } else {
            debug!(line = self.line_no, vector = %frame.vector, iterations = next, "loop done");
            self.context.remove_variable(&frame.iterator);
            self.loops.pop();
            self.loop_depth = self
                .loop_depth
                .checked_sub(1)
                .ok_or(SyntaxError::UnbalancedEndLoop)?;
        }
        Ok(())
    }

    // ── Skip mode ─────────────────────────────────────────────────────────────

    fn handle_skip(&mut self, line: &[u8], skip: Skip) -> Result<(), Fault> {
        let Some(rest) = self.directive_text(line) else {
            return Ok(());
        };

        match Directive::parse(&rest)? {
            Directive::If { .. } => self.if_depth += 1,
            Directive::EndIf => {
                if self.if_depth == skip.if_base {
                    if skip.exit != SkipExit::EndIf {
                        return Err(SyntaxError::UnbalancedEndIf.into());
                    }
                    self.leave_skip();
                }
                self.if_depth = self
                    .if_depth
                    .checked_sub(1)
                    .ok_or(SyntaxError::UnbalancedEndIf)?;
            }
            Directive::Loop { .. } => self.loop_depth += 1,
            Directive::EndLoop => {
                if self.loop_depth == skip.loop_base {
                    if skip.exit != SkipExit::EndLoop {
                        return Err(SyntaxError::UnbalancedEndLoop.into());
                    }
                    // Close the frame pushed by the empty loop that started
                    // this skip.
                    self.loops.pop();
                    self.leave_skip();
                }
                self.loop_depth = self
                    .loop_depth
                    .checked_sub(1)
                    .ok_or(SyntaxError::UnbalancedEndLoop)?;
            }
            Directive::Value { .. } | Directive::VectorLength { .. } | Directive::VectorValue { .. } => {}
        }
        Ok(())
    }

    fn enter_skip(&mut self, exit: SkipExit) {
        debug!(line = self.line_no, ?exit, "skip start");
        self.mode = Mode::Skip(Skip {
            exit,
            if_base: self.if_depth,
            loop_base: self.loop_depth,
        });
    }

    fn leave_skip(&mut self) {
        debug!(line = self.line_no, "skip end");
        self.mode = Mode::Normal;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
