mod tree;

pub use tree::{ParseElement, ParseTree, TreeKind};

use crate::error::ParseError;
use crate::lexer::{TokenKind, TokenStream};
use crate::limit::LimitTracker;

/// Words that open an output statement.
const OUTPUT_KEYWORDS: &[&str] = &["print", "printNum", "printStr", "printRepr"];

/// Nesting depth guard for parenthesis and bracket recursion, so that a
/// pathologically nested line errors instead of overflowing the stack.
const DEFAULT_RECURSION_LIMIT: usize = 500;

/// Read one line of tokens from `stream` and parse it into a statement.
///
/// Blank lines are skipped. `Ok(None)` means the stream is exhausted. The
/// result is one of: a bare expression (implicit print), an
/// [`TreeKind::Output`] tree (`printKind expr`), or an
/// [`TreeKind::Assignment`] tree (`name := expr`).
pub fn parse_line(stream: &mut TokenStream) -> Result<Option<ParseElement>, ParseError> {
    let mut line = Vec::new();
    loop {
        match stream.next() {
            Err(error) => return Err(ParseError::from(error)),
            Ok(None) => {
                if line.is_empty() {
                    return Ok(None);
                }
                break;
            }
            Ok(Some(token)) => {
                if token.kind() == TokenKind::Newline {
                    if line.is_empty() {
                        continue;
                    }
                    break;
                }
                line.push(ParseElement::Token(token));
            }
        }
    }

    let mut limit = LimitTracker::new(DEFAULT_RECURSION_LIMIT);
    parse_statement(line, &mut limit).map(Some)
}

/// Reduce a whole line, then require one of the three statement shapes.
fn parse_statement(
    items: Vec<ParseElement>,
    limit: &mut LimitTracker,
) -> Result<ParseElement, ParseError> {
    let mut residue = reduce(items, limit)?;
    match residue.len() {
        1 if !is_output_keyword(&residue[0]) => Ok(residue.remove(0)),
        2 if is_output_keyword(&residue[0]) && !is_output_keyword(&residue[1]) => Ok(
            ParseElement::Tree(ParseTree::new(TreeKind::Output, residue)),
        ),
        3 if is_name_token(&residue[0]) && is_operator_token(&residue[1], ":=") => {
            let expr = residue.remove(2);
            let name = residue.remove(0);
            Ok(ParseElement::Tree(ParseTree::new(
                TreeKind::Assignment,
                vec![name, expr],
            )))
        }
        _ => Err(ParseError::irreducible(
            "not a statement or reducible expression",
            residue,
        )),
    }
}

/// Reduce a parenthesised or bracketed interior. `Ok(None)` is an empty
/// interior; more than one residue is an irreducible expression.
fn parse_expression(
    items: Vec<ParseElement>,
    limit: &mut LimitTracker,
) -> Result<Option<ParseElement>, ParseError> {
    limit.consume();
    if limit.limited() {
        return Err(ParseError::new("parser recursion limit reached", items));
    }
    let result = reduce(items, limit).and_then(|mut residue| match residue.len() {
        0 => Ok(None),
        1 => Ok(Some(residue.remove(0))),
        _ => Err(ParseError::irreducible("irreducible expression", residue)),
    });
    limit.release();
    result
}

fn reduce(
    mut items: Vec<ParseElement>,
    limit: &mut LimitTracker,
) -> Result<Vec<ParseElement>, ParseError> {
    reduce_parentheses(&mut items, limit)?;
    reduce_brackets(&mut items, limit)?;
    reject_braces(&items)?;
    reduce_operators(&mut items)?;
    Ok(items)
}

/// Repeatedly substitute the leftmost `( … )` group with its parsed
/// interior.
fn reduce_parentheses(
    items: &mut Vec<ParseElement>,
    limit: &mut LimitTracker,
) -> Result<(), ParseError> {
    loop {
        let mut open = None;
        for (i, element) in items.iter().enumerate() {
            if is_delimiter_token(element, "(") {
                open = Some(i);
                break;
            }
            if is_delimiter_token(element, ")") {
                return Err(ParseError::new(
                    "missing left parenthesis",
                    vec![element.clone()],
                ));
            }
        }
        let Some(open) = open else {
            return Ok(());
        };

        let Some(close) = matching_close(items, open, "(", ")") else {
            return Err(ParseError::new(
                "missing right parenthesis",
                vec![items[open].clone()],
            ));
        };

        let interior: Vec<ParseElement> = items.drain(open + 1..close).collect();
        match parse_expression(interior, limit)? {
            Some(element) => {
                items.splice(open..=open + 1, [element]);
            }
            None => {
                return Err(ParseError::new(
                    "nothing to parse inside parentheses",
                    vec![items[open].clone(), items[open + 1].clone()],
                ));
            }
        }
    }
}

/// Repeatedly substitute the leftmost `[ … ]` group with a queue literal,
/// splitting its interior at top-level commas.
fn reduce_brackets(
    items: &mut Vec<ParseElement>,
    limit: &mut LimitTracker,
) -> Result<(), ParseError> {
    loop {
        let mut open = None;
        for (i, element) in items.iter().enumerate() {
            if is_delimiter_token(element, "[") {
                open = Some(i);
                break;
            }
            if is_delimiter_token(element, "]") {
                return Err(ParseError::new(
                    "missing left bracket",
                    vec![element.clone()],
                ));
            }
        }
        let Some(open) = open else {
            return Ok(());
        };

        let Some(close) = matching_close(items, open, "[", "]") else {
            return Err(ParseError::new(
                "missing right bracket",
                vec![items[open].clone()],
            ));
        };

        let interior: Vec<ParseElement> = items.drain(open + 1..close).collect();
        let children = parse_literal_elements(interior, limit)?;
        let literal = ParseTree::new(TreeKind::Literal, children);
        items.splice(open..=open + 1, [ParseElement::Tree(literal)]);
    }
}

/// The index of the close delimiter matching the open one at `open`.
fn matching_close(
    items: &[ParseElement],
    open: usize,
    open_text: &str,
    close_text: &str,
) -> Option<usize> {
    let mut depth = 1usize;
    for (i, element) in items.iter().enumerate().skip(open + 1) {
        if is_delimiter_token(element, open_text) {
            depth += 1;
        } else if is_delimiter_token(element, close_text) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Parse the comma-separated elements of a queue literal. An empty interior
/// is the empty literal; an empty element anywhere else is an extraneous
/// delimiter.
fn parse_literal_elements(
    interior: Vec<ParseElement>,
    limit: &mut LimitTracker,
) -> Result<Vec<ParseElement>, ParseError> {
    if interior.is_empty() {
        return Ok(Vec::new());
    }

    let highlight = interior.clone();
    let mut pieces: Vec<Vec<ParseElement>> = vec![Vec::new()];
    let mut depth = 0usize;
    for element in interior {
        if is_delimiter_token(&element, "[") {
            depth += 1;
        } else if is_delimiter_token(&element, "]") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && is_separator_token(&element, ",") {
            pieces.push(Vec::new());
            continue;
        }
        pieces
            .last_mut()
            .expect("pieces always holds at least one element")
            .push(element);
    }

    let singleton = pieces.len() == 1;
    let mut children = Vec::new();
    for piece in pieces {
        match parse_expression(piece, limit)? {
            Some(element) => children.push(element),
            None if singleton => {}
            None => {
                return Err(ParseError::new("extraneous delimiter", highlight));
            }
        }
    }
    Ok(children)
}

/// Braces are reserved; any left over after the other reductions is an
/// error.
fn reject_braces(items: &[ParseElement]) -> Result<(), ParseError> {
    for element in items {
        if is_delimiter_token(element, "{") || is_delimiter_token(element, "}") {
            return Err(ParseError::new("illegal delimiter", vec![element.clone()]));
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Fixity {
    Prefix,
    InfixLeft,
}

/// Operator precedence, high to low.
const PRECEDENCE: &[(&str, Fixity, TreeKind)] = &[
    ("$", Fixity::Prefix, TreeKind::Factory),
    ("_", Fixity::Prefix, TreeKind::Flatten),
    ("~", Fixity::InfixLeft, TreeKind::Zip),
    ("*", Fixity::InfixLeft, TreeKind::Star),
    ("+", Fixity::InfixLeft, TreeKind::Concat),
];

fn reduce_operators(items: &mut Vec<ParseElement>) -> Result<(), ParseError> {
    for &(op, fixity, kind) in PRECEDENCE {
        match fixity {
            Fixity::Prefix => reduce_prefix(items, op, kind)?,
            Fixity::InfixLeft => reduce_infix_left(items, op, kind)?,
        }
    }
    Ok(())
}

/// Fold a right-associative prefix operator: right-to-left, so the
/// innermost occurrence binds first.
fn reduce_prefix(items: &mut Vec<ParseElement>, op: &str, kind: TreeKind) -> Result<(), ParseError> {
    while let Some(i) = items.iter().rposition(|e| is_operator_token(e, op)) {
        if i + 1 >= items.len() {
            return Err(ParseError::new(
                format!("operator {op} is missing an operand"),
                vec![items[i].clone()],
            ));
        }
        if !is_operand(&items[i + 1]) {
            return Err(ParseError::new(
                format!("invalid operand for operator {op}"),
                vec![items[i + 1].clone()],
            ));
        }
        let operand = items.remove(i + 1);
        items[i] = ParseElement::Tree(ParseTree::new(kind, vec![operand]));
    }
    Ok(())
}

/// Fold a left-associative binary operator: left-to-right.
fn reduce_infix_left(
    items: &mut Vec<ParseElement>,
    op: &str,
    kind: TreeKind,
) -> Result<(), ParseError> {
    while let Some(i) = items.iter().position(|e| is_operator_token(e, op)) {
        if i == 0 || i + 1 >= items.len() {
            return Err(ParseError::new(
                format!("operator {op} is missing an operand"),
                vec![items[i].clone()],
            ));
        }
        if !is_operand(&items[i - 1]) {
            return Err(ParseError::new(
                format!("invalid operand for operator {op}"),
                vec![items[i - 1].clone()],
            ));
        }
        if !is_operand(&items[i + 1]) {
            return Err(ParseError::new(
                format!("invalid operand for operator {op}"),
                vec![items[i + 1].clone()],
            ));
        }
        let right = items.remove(i + 1);
        let left = items.remove(i - 1);
        items[i - 1] = ParseElement::Tree(ParseTree::new(kind, vec![left, right]));
    }
    Ok(())
}

fn is_delimiter_token(element: &ParseElement, text: &str) -> bool {
    matches!(element, ParseElement::Token(t) if t.kind() == TokenKind::Delimiter && t.text() == text)
}

fn is_separator_token(element: &ParseElement, text: &str) -> bool {
    matches!(element, ParseElement::Token(t) if t.kind() == TokenKind::Separator && t.text() == text)
}

fn is_operator_token(element: &ParseElement, text: &str) -> bool {
    matches!(element, ParseElement::Token(t) if t.kind() == TokenKind::Operator && t.text() == text)
}

fn is_name_token(element: &ParseElement) -> bool {
    matches!(element, ParseElement::Token(t) if t.kind() == TokenKind::Name)
}

fn is_output_keyword(element: &ParseElement) -> bool {
    matches!(
        element,
        ParseElement::Token(t)
            if matches!(t.kind(), TokenKind::Name | TokenKind::Keyword)
                && OUTPUT_KEYWORDS.contains(&t.text())
    )
}

/// Valid operand for an operator: a reduced subtree, or a token that can
/// stand for a value.
fn is_operand(element: &ParseElement) -> bool {
    match element {
        ParseElement::Tree(_) => true,
        ParseElement::Token(t) => matches!(
            t.kind(),
            TokenKind::Natural | TokenKind::String | TokenKind::Name | TokenKind::Keyword
        ),
    }
}
