//! Directive lines and their parser.
//!
//! A directive line is a line of the template that starts with the marker
//! prefix (`%` by default).  What follows the prefix is a keyword and a fixed
//! number of whitespace-separated arguments:
//!
//! | Directive | Arguments | Effect |
//! |-----------|-----------|--------|
//! | `endif` | — | close the innermost `if` |
//! | `endloop` | — | close (or repeat) the innermost `loop` |
//! | `if <name>` | 1 | body runs if `name` is a variable or vector |
//! | `loop <vector> <iterator>` | 2 | run body once per element of `vector` |
//! | `value <name>` | 1 | emit the value of variable `name` |
//! | `vector-length <name>` | 1 | emit the length of vector `name` |
//! | `vector-value <name> <index>` | 2 | emit `name[index]` |
//!
//! The three substitution directives may also follow literal text on the same
//! line (`Count: %vector-length items`); see [`Interpreter`](super::Interpreter).
//!
//! Parsing only checks the shape of the line.  Whether the names exist is
//! decided later, against the live [`Context`](super::Context).

use super::error::SyntaxError;

// ── Public types ──────────────────────────────────────────────────────────────

/// The kind of a directive, independent of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    EndIf,
    EndLoop,
    If,
    Loop,
    Value,
    VectorLength,
    VectorValue,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 7] = [
        DirectiveKind::EndIf,
        DirectiveKind::EndLoop,
        DirectiveKind::If,
        DirectiveKind::Loop,
        DirectiveKind::Value,
        DirectiveKind::VectorLength,
        DirectiveKind::VectorValue,
    ];

    /// The keyword that introduces this directive in a template.
    pub fn keyword(self) -> &'static str {
        match self {
            DirectiveKind::EndIf => "endif",
            DirectiveKind::EndLoop => "endloop",
            DirectiveKind::If => "if",
            DirectiveKind::Loop => "loop",
            DirectiveKind::Value => "value",
            DirectiveKind::VectorLength => "vector-length",
            DirectiveKind::VectorValue => "vector-value",
        }
    }

    /// Number of arguments the directive takes.
    pub fn arity(self) -> usize {
        match self {
            DirectiveKind::EndIf | DirectiveKind::EndLoop => 0,
            DirectiveKind::If | DirectiveKind::Value | DirectiveKind::VectorLength => 1,
            DirectiveKind::Loop | DirectiveKind::VectorValue => 2,
        }
    }

    /// Returns `true` for directives that emit a value instead of steering
    /// control flow.  Only these may appear after literal text on a line.
    pub fn is_substitution(self) -> bool {
        matches!(
            self,
            DirectiveKind::Value | DirectiveKind::VectorLength | DirectiveKind::VectorValue
        )
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

/// A parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    EndIf,
    EndLoop,
    If { name: String },
    Loop { vector: String, iterator: String },
    Value { name: String },
    VectorLength { name: String },
    VectorValue { vector: String, index: String },
}

// ── Parser ────────────────────────────────────────────────────────────────────

impl Directive {
    /// Parse the text of a directive line with the prefix already removed.
    pub fn parse(line: &str) -> Result<Self, SyntaxError> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or(SyntaxError::EmptyDirective)?;
        let kind = DirectiveKind::from_keyword(keyword)
            .ok_or_else(|| SyntaxError::UnknownDirective(keyword.to_owned()))?;
        let args: Vec<&str> = words.collect();

        let directive = match kind {
            DirectiveKind::EndIf => {
                take::<0>(kind, &args)?;
                Directive::EndIf
            }
            DirectiveKind::EndLoop => {
                take::<0>(kind, &args)?;
                Directive::EndLoop
            }
            DirectiveKind::If => {
                let [name] = take::<1>(kind, &args)?;
                Directive::If { name }
            }
            DirectiveKind::Loop => {
                let [vector, iterator] = take::<2>(kind, &args)?;
                Directive::Loop { vector, iterator }
            }
            DirectiveKind::Value => {
                let [name] = take::<1>(kind, &args)?;
                Directive::Value { name }
            }
            DirectiveKind::VectorLength => {
                let [name] = take::<1>(kind, &args)?;
                Directive::VectorLength { name }
            }
            DirectiveKind::VectorValue => {
                let [vector, index] = take::<2>(kind, &args)?;
                Directive::VectorValue { vector, index }
            }
        };
        Ok(directive)
    }

    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::EndIf => DirectiveKind::EndIf,
            Directive::EndLoop => DirectiveKind::EndLoop,
            Directive::If { .. } => DirectiveKind::If,
            Directive::Loop { .. } => DirectiveKind::Loop,
            Directive::Value { .. } => DirectiveKind::Value,
            Directive::VectorLength { .. } => DirectiveKind::VectorLength,
            Directive::VectorValue { .. } => DirectiveKind::VectorValue,
        }
    }
}

/// Check that `args` has exactly `N` words and copy them out.
fn take<const N: usize>(kind: DirectiveKind, args: &[&str]) -> Result<[String; N], SyntaxError> {
    debug_assert_eq!(kind.arity(), N);
    let words: &[&str; N] = args.try_into().map_err(|_| SyntaxError::WrongArity {
        keyword: kind.keyword(),
        expected: N,
        found: args.len(),
    })?;
    Ok(words.map(str::to_owned))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Directive {
        Directive::parse(line).expect("parse failed")
    }

    #[test]
    fn endif_and_endloop() {
        assert_eq!(parse("endif"), Directive::EndIf);
        assert_eq!(parse("endloop"), Directive::EndLoop);
    }

    #[test]
    fn if_stmt() {
        assert_eq!(parse("if debug"), Directive::If { name: "debug".to_owned() });
    }

    #[test]
    fn loop_stmt() {
        assert_eq!(
            parse("loop items i"),
            Directive::Loop {
                vector: "items".to_owned(),
                iterator: "i".to_owned()
            }
        );
    }

    #[test]
    fn substitutions() {
        assert_eq!(parse("value name"), Directive::Value { name: "name".to_owned() });
        assert_eq!(
            parse("vector-length items"),
            Directive::VectorLength { name: "items".to_owned() }
        );
        assert_eq!(
            parse("vector-value items i"),
            Directive::VectorValue {
                vector: "items".to_owned(),
                index: "i".to_owned()
            }
        );
    }

    #[test]
    fn extra_whitespace_is_ignored() {
        assert_eq!(
            parse("  loop\titems   i \r"),
            Directive::Loop {
                vector: "items".to_owned(),
                iterator: "i".to_owned()
            }
        );
    }

    #[test]
    fn empty() {
        assert_eq!(Directive::parse(""), Err(SyntaxError::EmptyDirective));
        assert_eq!(Directive::parse("   "), Err(SyntaxError::EmptyDirective));
    }

    #[test]
    fn unknown_keyword() {
        assert_eq!(
            Directive::parse("else"),
            Err(SyntaxError::UnknownDirective("else".to_owned()))
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert!(matches!(
            Directive::parse("ENDIF"),
            Err(SyntaxError::UnknownDirective(_))
        ));
    }

    #[test]
    fn too_many_arguments() {
        assert_eq!(
            Directive::parse("endif foo"),
            Err(SyntaxError::WrongArity {
                keyword: "endif",
                expected: 0,
                found: 1
            })
        );
    }

    #[test]
    fn too_few_arguments() {
        assert_eq!(
            Directive::parse("vector-value items"),
            Err(SyntaxError::WrongArity {
                keyword: "vector-value",
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn every_kind_round_trips_through_its_keyword() {
        for kind in DirectiveKind::ALL {
            let args = vec!["x"; kind.arity()];
            let line = format!("{} {}", kind.keyword(), args.join(" "));
            assert_eq!(parse(&line).kind(), kind);
            assert_eq!(DirectiveKind::from_keyword(kind.keyword()), Some(kind));
        }
    }

    #[test]
    fn substitution_kinds() {
        let inline: Vec<_> = DirectiveKind::ALL
            .into_iter()
            .filter(|kind| kind.is_substitution())
            .collect();
        assert_eq!(
            inline,
            vec![
                DirectiveKind::Value,
                DirectiveKind::VectorLength,
                DirectiveKind::VectorValue
            ]
        );
    }
}
