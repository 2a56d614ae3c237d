//! Errors raised while translating.
//!
//! Every error remembers the source text it was raised against and a byte
//! offset into it. The [Display](std::fmt::Display) implementation reproduces
//! the offending line with a caret under the failing position:
//!
//! ```text
//! ParseError:  v^a = g^{ab} \foo
//!                           ^
//! unsupported command '\foo' at position 13
//! ```

use std::fmt;

// Width of the label column in the caret format.
const MARGIN: usize = 13;

/// Which kind of failure an error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Lexical or grammatical error.
    Syntax,
    /// Semantic error in the tensor algebra or storage.
    Tensor,
}

impl Class {
    pub fn label(self) -> &'static str {
        match self {
            Class::Syntax => "ParseError",
            Class::Tensor => "TensorError",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    UnexpectedCharacter(char),
    UnexpectedToken {
        found: String,
        expected: Option<&'static str>,
    },
    UnexpectedEnd {
        expected: Option<&'static str>,
    },
    UnsupportedCommand {
        command: String,
        suggestion: Option<&'static str>,
    },
    UnsupportedOperator(String),
    UnsupportedMacro,
    UnexpectedKeyword,
    DuplicateBasisSymbol(String),
    InvalidIndexRange {
        first: String,
        last: String,
    },
    InvalidInteger(String),
    /// A Christoffel symbol was referenced without an ambient dimension.
    DimensionInference(String),

    InconsistentDimension {
        declared: usize,
        ambient: usize,
    },
    DimensionRequired(String),
    InvalidSymmetry(String),
    NoBasis,
    IllegalBoundIndex(String),
    UnbalancedFreeIndex {
        expected: String,
        found: String,
    },
    InvalidRank {
        construction: &'static str,
        rank: usize,
    },
    UnsupportedDimension(usize),
    UndefinedTensor(String),
    /// An indexed reference to a symbol with no storage.
    MissingStorage(String),
    IndexOutOfRange {
        symbol: String,
        index: Vec<usize>,
    },
}

impl ErrorKind {
    pub fn class(&self) -> Class {
        use ErrorKind::*;
        match self {
            UnexpectedCharacter(_)
            | UnexpectedToken { .. }
            | UnexpectedEnd { .. }
            | UnsupportedCommand { .. }
            | UnsupportedOperator(_)
            | UnsupportedMacro
            | UnexpectedKeyword
            | DuplicateBasisSymbol(_)
            | InvalidIndexRange { .. }
            | InvalidInteger(_)
            | DimensionInference(_) => Class::Syntax,
            InconsistentDimension { .. }
            | DimensionRequired(_)
            | InvalidSymmetry(_)
            | NoBasis
            | IllegalBoundIndex(_)
            | UnbalancedFreeIndex { .. }
            | InvalidRank { .. }
            | UnsupportedDimension(_)
            | UndefinedTensor(_)
            | MissingStorage(_)
            | IndexOutOfRange { .. } => Class::Tensor,
        }
    }
}

impl From<indexedexp::Error> for ErrorKind {
    fn from(err: indexedexp::Error) -> Self {
        use indexedexp::Error as E;
        match err {
            E::InvalidSymmetry(spec) => ErrorKind::InvalidSymmetry(spec),
            E::SymmetrySlotOutOfRange { slot, rank } => {
                ErrorKind::InvalidSymmetry(format!("slot {slot} of a rank {rank} tensor"))
            }
            E::IndexOutOfRange { index, .. } => ErrorKind::IndexOutOfRange {
                symbol: String::new(),
                index,
            },
            E::NotAMatrix { rank } => ErrorKind::InvalidRank {
                construction: "invert",
                rank,
            },
            E::UnsupportedDimension(dimension) => ErrorKind::UnsupportedDimension(dimension),
        }
    }
}

/// Error raised by a parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    source: String,
    offset: usize,
}

impl Error {
    pub fn new(kind: ErrorKind, source: &str, offset: usize) -> Error {
        Error {
            kind,
            source: source.to_string(),
            offset: offset.min(source.len()),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn class(&self) -> Class {
        self.kind.class()
    }

    /// The text that was being parsed when the error was raised.
    ///
    /// For errors inside a macro expansion this is the synthesised text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte offset of the failure in [Error::source].
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn message(&self) -> String {
        use ErrorKind::*;
        let position = self.offset;
        match &self.kind {
            UnexpectedCharacter(c) => format!("unexpected '{c}' at position {position}"),
            UnexpectedToken { found, .. } => {
                format!("unexpected '{found}' at position {position}")
            }
            UnexpectedEnd { .. } => format!("unexpected end of input at position {position}"),
            UnsupportedCommand { command, .. } => {
                format!("unsupported command '{command}' at position {position}")
            }
            UnsupportedOperator(operator) => {
                format!("unsupported operator '{operator}' at position {position}")
            }
            UnsupportedMacro => format!("unsupported macro at position {position}"),
            UnexpectedKeyword => format!("unexpected keyword at position {position}"),
            DuplicateBasisSymbol(symbol) => {
                format!("duplicate basis symbol '{symbol}' at position {position}")
            }
            InvalidIndexRange { first, last } => {
                format!("invalid index range '{first}-{last}' at position {position}")
            }
            InvalidInteger(lexeme) => format!("invalid integer '{lexeme}' at position {position}"),
            DimensionInference(symbol) => {
                format!("cannot instantiate '{symbol}' from inference: no dimension is known")
            }
            InconsistentDimension { declared, ambient } => format!(
                "inconsistent tensor dimension: declared {declared} but the dimension is {ambient}"
            ),
            DimensionRequired(symbol) => {
                format!("dimension only omittable for constant, but '{symbol}' has no dimension")
            }
            InvalidSymmetry(spec) => format!("invalid symmetry '{spec}'"),
            NoBasis => "cannot differentiate symbolically without basis".into(),
            IllegalBoundIndex(index) => format!("illegal bound index '{index}'"),
            UnbalancedFreeIndex { .. } => "unbalanced free index".into(),
            InvalidRank { construction, rank } => {
                format!("cannot {construction} tensor of rank {rank}")
            }
            UnsupportedDimension(dimension) => {
                format!("cannot invert a metric of dimension {dimension}")
            }
            UndefinedTensor(symbol) => format!("cannot update undefined tensor '{symbol}'"),
            MissingStorage(symbol) => format!("tensor '{symbol}' has no storage"),
            IndexOutOfRange { symbol, index } => {
                format!("index {index:?} is out of range for '{symbol}'")
            }
        }
    }

    pub fn notes(&self) -> Vec<String> {
        use ErrorKind::*;
        match &self.kind {
            UnexpectedToken {
                expected: Some(expected),
                ..
            }
            | UnexpectedEnd {
                expected: Some(expected),
            } => vec![format!("expected {expected}")],
            UnsupportedCommand {
                suggestion: Some(suggestion),
                ..
            } => vec![format!("did you mean '\\{suggestion}'?")],
            DimensionInference(_) => {
                vec!["declare a dimension first, e.g. `% define metric gDD (3)`".into()]
            }
            NoBasis => vec!["declare a basis first, e.g. `% define basis [x, y, z]`".into()],
            IllegalBoundIndex(_) => vec![
                "a bound index must appear exactly once as a superscript and once as a subscript in a term"
                    .into(),
            ],
            UnbalancedFreeIndex { expected, found } => vec![
                format!("the left-hand side has free indices {expected}"),
                format!("a term of the right-hand side has free indices {found}"),
            ],
            UnsupportedDimension(_) => vec!["supported dimensions are 2, 3 and 4".into()],
            MissingStorage(symbol) => vec![format!("declare it first, e.g. `% define nosym {symbol} (3)`")],
            _ => vec![],
        }
    }

    // Line containing the offset and the column of the offset in characters.
    fn line(&self) -> (&str, usize) {
        let start = self.source[..self.offset]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = self.source[self.offset..]
            .find('\n')
            .map(|i| i + self.offset)
            .unwrap_or(self.source.len());
        let column = self.source[start..self.offset].chars().count();
        (&self.source[start..end], column)
    }

    /// Span of the failure in characters, as ariadne expects.
    pub fn span(&self) -> std::ops::Range<usize> {
        let start = self.source[..self.offset].chars().count();
        let len = match &self.kind {
            ErrorKind::UnexpectedToken { found, .. } => found.chars().count(),
            ErrorKind::UnsupportedCommand { command, .. } => command.chars().count(),
            _ => 1,
        };
        let total = self.source.chars().count();
        start..(start + len).min(total).max(start)
    }

    #[cfg(feature = "ariadne")]
    pub fn ariadne_report<'a>(
        &self,
        file_name: &'a str,
    ) -> ariadne::Report<'static, (&'a str, std::ops::Range<usize>)> {
        let mut report =
            ariadne::Report::build(ariadne::ReportKind::Error, (file_name, self.span()))
                .with_message(format!("{}: {}", self.class().label(), self.message()));
        report = report.with_label(
            ariadne::Label::new((file_name, self.span()))
                .with_message("the error occurred here")
                .with_color(ariadne::Color::BrightRed),
        );
        for note in self.notes() {
            report = report.with_note(note);
        }
        report.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{}:", self.class().label());
        let (line, column) = self.line();
        writeln!(f, "{label:<MARGIN$}{line}")?;
        writeln!(f, "{}^", " ".repeat(MARGIN + column))?;
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for Error {}

/// Non-fatal notice raised while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notice {
    /// A declaration named a symbol that already has storage. The existing
    /// storage is kept.
    Override(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Override(symbol) => write!(f, "OverrideWarning: {symbol}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_under_offset() {
        let err = Error::new(
            ErrorKind::UnsupportedCommand {
                command: r"\foo".into(),
                suggestion: None,
            },
            r"v^a = \foo",
            6,
        );
        let want = "ParseError:  v^a = \\foo\n                   ^\nunsupported command '\\foo' at position 6";
        assert_eq!(err.to_string(), want);
    }

    #[test]
    fn labels_fit_the_margin() {
        assert!(Class::Syntax.label().len() < MARGIN - 1);
        assert!(Class::Tensor.label().len() < MARGIN - 1);
    }

    #[test]
    fn caret_on_second_line() {
        let err = Error::new(ErrorKind::NoBasis, "a = 1;\nb = c", 11);
        let want = "TensorError: b = c\n                 ^\ncannot differentiate symbolically without basis";
        assert_eq!(err.to_string(), want);
    }

    #[test]
    fn suggestion_note() {
        let err = Error::new(
            ErrorKind::UnsupportedCommand {
                command: r"\sqr".into(),
                suggestion: Some("sqrt"),
            },
            r"\sqr{x}",
            0,
        );
        assert_eq!(err.notes(), vec![r"did you mean '\sqrt'?".to_string()]);
    }

    #[test]
    fn span_counts_characters() {
        let err = Error::new(
            ErrorKind::UnexpectedToken {
                found: "x".into(),
                expected: None,
            },
            "αx",
            2,
        );
        assert_eq!(err.span(), 1..2);
    }
}
