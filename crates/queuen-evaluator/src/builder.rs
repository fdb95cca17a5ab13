use crate::queue::Queue;
use queuen_parser::{ParseElement, ParseTree, TokenKind, TokenValue, TreeKind};
use thiserror::Error;

/// The builder was handed something it has no queue construction rule for.
///
/// For well-formed expression trees this is unreachable; it is reachable
/// for parsed-but-unevaluated forms (assignments, bare names), so it is an
/// error value rather than a panic and the REPL survives it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Translate a parsed element into a queue graph.
pub fn build(element: &ParseElement) -> Result<Queue, BuildError> {
    match element {
        ParseElement::Token(token) => match (token.kind(), token.value()) {
            (TokenKind::Natural, TokenValue::Natural(value)) => Ok(Queue::natural(*value)),
            (TokenKind::String, TokenValue::Text(value)) => Ok(Queue::string(value.clone())),
            (kind, _) => Err(BuildError::NotImplemented(kind.name().to_string())),
        },
        ParseElement::Tree(tree) => build_tree(tree),
    }
}

fn build_tree(tree: &ParseTree) -> Result<Queue, BuildError> {
    match (tree.kind(), tree.children()) {
        (TreeKind::Literal, children) => {
            let elements = children.iter().map(build).collect::<Result<Vec<_>, _>>()?;
            Ok(Queue::literal(elements))
        }
        (TreeKind::Concat, [first, second]) => Ok(Queue::concat(build(first)?, build(second)?)),
        (TreeKind::Factory, [template]) => {
            let template = build(template)?;
            Ok(Queue::safe_factory(&template))
        }
        (TreeKind::Zip, [first, second]) => Ok(Queue::zip(build(first)?, build(second)?)),
        (TreeKind::Flatten, [outer]) => Ok(Queue::flatten(build(outer)?)),
        (TreeKind::Star, [first, second]) => Ok(Queue::star(build(first)?, build(second)?)),
        (kind, _) => Err(BuildError::NotImplemented(kind.name().to_string())),
    }
}
