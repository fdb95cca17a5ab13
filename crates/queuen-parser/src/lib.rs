#![doc = include_str!("../README.md")]

mod buffer;
mod diagnostic;
mod error;
mod lexer;
mod limit;
mod parser;

pub use crate::buffer::TokenBuffer;
pub use crate::diagnostic::Diagnostic;
pub use crate::error::{LexError, ParseError};
pub use crate::lexer::{Refill, Token, TokenKind, TokenStream, TokenValue};
pub use crate::limit::LimitTracker;
pub use crate::parser::{parse_line, ParseElement, ParseTree, TreeKind};
