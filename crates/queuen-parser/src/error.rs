use crate::parser::ParseElement;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// An error raised while lexing. Unlike parse errors these are fatal to the
/// current input: the stream cannot make progress past them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A string literal was still open when both the buffer and the refill
    /// source ran out.
    #[error("unterminated string")]
    UnterminatedString { index: usize },
    /// An integer literal does not fit a natural value.
    #[error("integer literal too large")]
    NaturalOverflow { index: usize },
}

impl LexError {
    /// Byte offset of the offending lexeme in the stream's log.
    pub fn index(&self) -> usize {
        match self {
            LexError::UnterminatedString { index } => *index,
            LexError::NaturalOverflow { index } => *index,
        }
    }
}

/// An error produced while parsing a line.
///
/// Carries a message and a highlight: the tokens and subtrees the message is
/// about. `redux` distinguishes multi-span "irreducible residue" errors,
/// which colour each highlighted block separately, from ordinary
/// single-span errors, which underline the whole highlight as one range.
///
/// `ParseError` deliberately does not implement `Display`; render it
/// through [`ParseError::to_diagnostic`] to get a coloured, source-labelled
/// report.
#[derive(Clone, PartialEq)]
pub struct ParseError {
    message: String,
    highlight: Vec<ParseElement>,
    redux: bool,
    index: Option<usize>,
}

impl ParseError {
    /// A single-span error over `highlight`.
    pub fn new<S: Into<String>>(message: S, highlight: Vec<ParseElement>) -> Self {
        Self {
            message: message.into(),
            highlight,
            redux: false,
            index: None,
        }
    }

    /// A multi-span error: the residue could not be reduced any further.
    pub fn irreducible<S: Into<String>>(message: S, highlight: Vec<ParseElement>) -> Self {
        Self {
            message: message.into(),
            highlight,
            redux: true,
            index: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn highlight(&self) -> &[ParseElement] {
        &self.highlight
    }

    pub fn redux(&self) -> bool {
        self.redux
    }

    /// Log offset for errors without a highlight (lexical errors).
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Whether this error came from the lexer. Lexical errors are fatal to
    /// the current input: the stream cannot make progress past them.
    pub fn is_lexical(&self) -> bool {
        self.index.is_some()
    }

    pub(crate) fn spans(&self) -> Vec<Range<usize>> {
        self.highlight
            .iter()
            .filter_map(ParseElement::span)
            .collect()
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        Self {
            message: error.to_string(),
            highlight: Vec::new(),
            redux: false,
            index: Some(error.index()),
        }
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERROR")?;
        let spans = self.spans();
        if spans.is_empty() {
            if let Some(index) = self.index {
                write!(f, "@{index}")?;
            }
        }
        for span in spans {
            write!(f, "@{}:{}", span.start, span.end)?;
        }
        if self.redux {
            write!(f, " redux")?;
        }
        write!(f, " {:?}", self.message)
    }
}
