//! Fixed character tables driving the lexer.
//!
//! Delimiters, specials, separators and the word-symbol sets hold single
//! characters; operators may be up to three characters long. The keyword,
//! special and word-symbol sets are configuration points that are currently
//! empty.

pub(crate) const STRING_BRACKET: char = '"';
pub(crate) const ESCAPE_CHARACTER: char = '\\';
pub(crate) const COMMENT_PREFIX: char = '#';

/// Reserved words. None are configured; every word lexes as a name.
pub(crate) const KEYWORDS: &[&str] = &[];

/// The operator table, longest entries first so that prefix matching is
/// longest-match.
pub(crate) const OPERATORS: &[&str] = &[
    // three characters
    "<<<", ">>>", "...", "===", "</>", "<-<", ">->", "=/=", "<=>", "=<<", ">>=", "<<=", "=>>",
    // two characters
    "!!", "@@", "$$", "%%", "^^", "&&", "**", "--", "++", "||", "__", "!=", "@=", "$=", "%=",
    "^=", "&=", "*=", "-=", "+=", "|=", "<<", ">>", "..", "==", "::", "??", "//", "\\\\", ".=",
    ":=", "?=", "/=", "\\=", "~=", "/\\", "\\/", "<>", "<:", ":>", "<~", "~>", "<|", "|>", "<-",
    "->", "=<", ">=", "<=", "=>", "×=", "÷=", "⋅=",
    // one character
    "!", "@", "$", "%", "^", "&", "*", "-", "+", "|", "_", "<", ">", ".", "=", ":", "?", "/",
    "\\", "~", "↑", "↓", "←", "→", "≤", "≥", "×", "÷", "⋅", "∘",
];

/// The first operator in the table that is a prefix of `text`.
pub(crate) fn match_operator(text: &str) -> Option<&'static str> {
    OPERATORS.iter().copied().find(|op| text.starts_with(op))
}

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0B' | '\x0C')
}

pub(crate) fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}')
}

pub(crate) fn is_separator(c: char) -> bool {
    matches!(c, ',' | ';')
}

/// Single characters lexed as a class of their own. None are configured.
pub(crate) fn is_special(_c: char) -> bool {
    false
}

/// Characters that can start an entry of [`OPERATORS`].
pub(crate) fn is_operator_start(c: char) -> bool {
    matches!(
        c,
        '!' | '@'
            | '$'
            | '%'
            | '^'
            | '&'
            | '*'
            | '-'
            | '+'
            | '|'
            | '_'
            | '<'
            | '>'
            | '.'
            | '='
            | ':'
            | '?'
            | '/'
            | '\\'
            | '~'
            | '↑'
            | '↓'
            | '←'
            | '→'
            | '≤'
            | '≥'
            | '×'
            | '÷'
            | '⋅'
            | '∘'
    )
}

/// Operator-start characters that may nevertheless appear inside a word.
/// None are configured.
pub(crate) fn is_mid_word_symbol(_c: char) -> bool {
    false
}

/// Characters that end a word while belonging to it. None are configured.
pub(crate) fn is_end_word_symbol(_c: char) -> bool {
    false
}

/// Characters a word may not contain; these terminate word scanning.
pub(crate) fn is_non_word(c: char) -> bool {
    let symbolic = is_delimiter(c)
        || is_special(c)
        || is_separator(c)
        || is_operator_start(c)
        || c == STRING_BRACKET
        || c == COMMENT_PREFIX;
    (symbolic && !is_mid_word_symbol(c)) || is_end_word_symbol(c) || is_whitespace(c)
}
