pub(crate) mod tables;
mod token;

pub use token::{Token, TokenKind, TokenValue};

use crate::error::LexError;
use self::tables::{
    is_delimiter, is_end_word_symbol, is_mid_word_symbol, is_non_word, is_operator_start,
    is_separator, is_special, is_whitespace, match_operator, COMMENT_PREFIX, ESCAPE_CHARACTER,
    KEYWORDS, STRING_BRACKET,
};

/// Called when the buffer runs dry; `None` means no more input exists.
pub type Refill = Box<dyn FnMut() -> Option<String>>;

/// A pull-based lexer over a mutable text buffer.
///
/// The stream owns whatever text it has been given so far and may ask an
/// optional [`Refill`] callback for more whenever the buffer empties, even
/// in the middle of a string literal or comment. Everything it consumes,
/// whitespace and comments included, is appended to a log so that
/// diagnostics can be rendered against the full session source.
///
/// Whitespace is insignificant except that a run containing at least one
/// newline produces a single [`TokenKind::Newline`] token; further newlines
/// are suppressed until a non-newline token has been emitted.
pub struct TokenStream {
    text: String,
    refill: Option<Refill>,
    log: String,
    line: u32,
    column: u32,
    last_emitted_newline: bool,
}

impl TokenStream {
    /// Create a stream over a fixed piece of text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            refill: None,
            log: String::new(),
            line: 1,
            column: 1,
            last_emitted_newline: false,
        }
    }

    /// Create a stream that asks `refill` for more text when the buffer
    /// runs dry.
    pub fn with_refill(text: impl Into<String>, refill: Refill) -> Self {
        Self {
            refill: Some(refill),
            ..Self::new(text)
        }
    }

    /// Every byte consumed so far, in order.
    pub fn log(&self) -> &str {
        &self.log
    }

    /// 1-based line of the next unconsumed character.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column (in characters) of the next unconsumed character.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Pull the next token. `Ok(None)` is the end of the stream.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            // Leading whitespace. A run containing a newline becomes at
            // most one newline token.
            let ws_end = self
                .text
                .find(|c| !is_whitespace(c))
                .unwrap_or(self.text.len());
            if ws_end > 0 {
                let (index, line, column) = (self.log.len(), self.line, self.column);
                let whitespace = self.consume(ws_end);
                if whitespace.contains('\n') && !self.last_emitted_newline {
                    self.last_emitted_newline = true;
                    return Ok(Some(Token::new(
                        whitespace,
                        index,
                        line,
                        column,
                        TokenValue::None,
                        TokenKind::Newline,
                    )));
                }
            }

            if self.text.is_empty() {
                if !self.pull_more() {
                    return Ok(None);
                }
                // Refilled text gets the whitespace treatment too.
                continue;
            }

            // Comments run to the end of the line, refilling as needed.
            if self.text.starts_with(COMMENT_PREFIX) {
                loop {
                    if let Some(end) = self.text.find('\n') {
                        // Leave the newline for the next pass.
                        self.consume(end);
                        break;
                    }
                    let len = self.text.len();
                    self.consume(len);
                    if !self.pull_more() {
                        return Ok(None);
                    }
                }
                continue;
            }

            // Whatever follows is not a newline.
            self.last_emitted_newline = false;

            let (index, line, column) = (self.log.len(), self.line, self.column);

            // Natural number.
            let digits = self.text.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 0 {
                let text = self.consume(digits);
                let value = text
                    .parse::<u64>()
                    .map_err(|_| LexError::NaturalOverflow { index })?;
                return Ok(Some(Token::new(
                    text,
                    index,
                    line,
                    column,
                    TokenValue::Natural(value),
                    TokenKind::Natural,
                )));
            }

            if self.text.starts_with(STRING_BRACKET) {
                return self.string_literal(index, line, column).map(Some);
            }

            let first = self
                .text
                .chars()
                .next()
                .expect("scanner reached an empty buffer");

            if is_delimiter(first) || is_special(first) || is_separator(first) {
                let kind = if is_delimiter(first) {
                    TokenKind::Delimiter
                } else if is_special(first) {
                    TokenKind::Special
                } else {
                    TokenKind::Separator
                };
                let text = self.consume(first.len_utf8());
                let value = TokenValue::Text(text.clone());
                return Ok(Some(Token::new(text, index, line, column, value, kind)));
            }

            if is_operator_start(first) {
                // Longest match over the operator table; a starter that
                // matches no entry lexes as a one-character operator.
                let len = match_operator(&self.text)
                    .map(str::len)
                    .unwrap_or(first.len_utf8());
                let text = self.consume(len);
                let value = TokenValue::Text(text.clone());
                return Ok(Some(Token::new(
                    text,
                    index,
                    line,
                    column,
                    value,
                    TokenKind::Operator,
                )));
            }

            return Ok(Some(self.word(index, line, column)));
        }
    }

    /// A string literal: scan to the matching close bracket, honouring the
    /// escape character and refilling as needed. Only `\"` is rewritten in
    /// the value; other escapes pass through untouched.
    fn string_literal(&mut self, index: usize, line: u32, column: u32) -> Result<Token, LexError> {
        let mut from = STRING_BRACKET.len_utf8();
        let close = loop {
            match self.text[from..].find(STRING_BRACKET).map(|j| j + from) {
                Some(j) => {
                    if j > 1 && self.text.as_bytes()[j - 1] == ESCAPE_CHARACTER as u8 {
                        from = j + 1;
                    } else {
                        break j;
                    }
                }
                None => {
                    from = self.text.len();
                    if !self.pull_more() {
                        return Err(LexError::UnterminatedString { index });
                    }
                }
            }
        };

        let value = self.text[1..close].replace("\\\"", "\"");
        let text = self.consume(close + 1);
        Ok(Token::new(
            text,
            index,
            line,
            column,
            TokenValue::Text(value),
            TokenKind::String,
        ))
    }

    /// A name or keyword: consume up to the first non-word character, trim
    /// trailing mid-word symbols, then re-extend over a single end-word
    /// symbol if one follows.
    fn word(&mut self, index: usize, line: u32, column: u32) -> Token {
        let mut end = self.text.len();
        for (pos, c) in self.text.char_indices() {
            if is_non_word(c) {
                end = pos;
                break;
            }
        }
        while let Some(c) = self.text[..end].chars().next_back() {
            if is_mid_word_symbol(c) {
                end -= c.len_utf8();
            } else {
                break;
            }
        }
        if let Some(c) = self.text[end..].chars().next() {
            if is_end_word_symbol(c) {
                end += c.len_utf8();
            }
        }

        let text = self.consume(end);
        let kind = if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Name
        };
        let value = TokenValue::Text(text.clone());
        Token::new(text, index, line, column, value, kind)
    }

    /// Take `len` bytes off the front of the buffer, folding them into the
    /// log and advancing the position cursor.
    fn consume(&mut self, len: usize) -> String {
        let rest = self.text.split_off(len);
        let eaten = std::mem::replace(&mut self.text, rest);
        self.advance(&eaten);
        self.log.push_str(&eaten);
        eaten
    }

    fn advance(&mut self, consumed: &str) {
        match consumed.rfind('\n') {
            None => self.column += consumed.chars().count() as u32,
            Some(last) => {
                self.line += consumed.matches('\n').count() as u32;
                self.column = consumed[last + 1..].chars().count() as u32 + 1;
            }
        }
    }

    fn pull_more(&mut self) -> bool {
        if let Some(refill) = &mut self.refill {
            if let Some(more) = refill() {
                self.text.push_str(&more);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::{expect, Expect};
    use std::fmt::Write;

    fn drain(stream: &mut TokenStream) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = stream.next().expect("unexpected lex error") {
            tokens.push(token);
        }
        tokens
    }

    fn check(input: &str, expected: Expect) {
        let mut stream = TokenStream::new(input);
        let mut dump = String::new();
        for token in drain(&mut stream) {
            writeln!(dump, "{token:?}").unwrap();
        }
        expected.assert_eq(&dump);
        // Token texts plus elided whitespace reconstruct the input.
        assert_eq!(stream.log(), input);
    }

    #[test]
    fn naturals_and_operators() {
        check(
            "2 + 3\n",
            expect![[r#"
                natural@1:1 "2"
                operator@1:3 "+"
                natural@1:5 "3"
                newline@1:6 "\n"
            "#]],
        );
    }

    #[test]
    fn longest_operator_wins() {
        check(
            "a <=> b =<< c <~",
            expect![[r#"
                name@1:1 "a"
                operator@1:3 "<=>"
                name@1:7 "b"
                operator@1:9 "=<<"
                name@1:13 "c"
                operator@1:15 "<~"
            "#]],
        );
    }

    #[test]
    fn delimiters_and_separators() {
        check(
            "[1,2];(3)",
            expect![[r#"
                delimiter@1:1 "["
                natural@1:2 "1"
                separator@1:3 ","
                natural@1:4 "2"
                delimiter@1:5 "]"
                separator@1:6 ";"
                delimiter@1:7 "("
                natural@1:8 "3"
                delimiter@1:9 ")"
            "#]],
        );
    }

    #[test]
    fn newline_runs_coalesce() {
        check(
            "a\n\n\nb\n",
            expect![[r#"
                name@1:1 "a"
                newline@1:2 "\n\n\n"
                name@4:1 "b"
                newline@4:2 "\n"
            "#]],
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        check(
            "3 # the rest\n4",
            expect![[r#"
                natural@1:1 "3"
                newline@1:13 "\n"
                natural@2:1 "4"
            "#]],
        );
    }

    #[test]
    fn string_literals_unescape_quotes() {
        let mut stream = TokenStream::new(r#""ab\"c" x"#);
        let tokens = drain(&mut stream);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind(), TokenKind::String);
        assert_eq!(tokens[0].text(), r#""ab\"c""#);
        assert_eq!(tokens[0].value(), &TokenValue::Text("ab\"c".into()));
        assert_eq!(tokens[1].text(), "x");
        assert_eq!(tokens[1].column(), 9);
    }

    #[test]
    fn multiline_string_tracks_position() {
        check(
            "\"a\nb\" 5",
            expect![[r#"
                string@1:1 "\"a\nb\""
                natural@2:4 "5"
            "#]],
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let mut stream = TokenStream::new("\"abc");
        assert_eq!(
            stream.next(),
            Err(LexError::UnterminatedString { index: 0 })
        );
    }

    #[test]
    fn huge_natural_is_rejected() {
        let mut stream = TokenStream::new("99999999999999999999999");
        assert_eq!(stream.next(), Err(LexError::NaturalOverflow { index: 0 }));
    }

    #[test]
    fn unicode_operators_count_columns_in_chars() {
        check(
            "× 3 ∘ ≤",
            expect![[r#"
                operator@1:1 "×"
                natural@1:3 "3"
                operator@1:5 "∘"
                operator@1:7 "≤"
            "#]],
        );
    }

    #[test]
    fn token_equality_ignores_position() {
        let mut a = TokenStream::new("3   3");
        let tokens = drain(&mut a);
        assert_eq!(tokens[0], tokens[1]);
        assert!(!tokens[0].is_exactly(&tokens[1]));
        assert!(tokens[0].is_exactly(&tokens[0].clone()));
    }

    #[test]
    fn refill_supplies_more_lines() {
        let mut parts = vec![String::from("1 +"), String::from(" 2\n")].into_iter();
        let mut stream = TokenStream::with_refill("", Box::new(move || parts.next()));
        let tokens = drain(&mut stream);
        let texts: Vec<&str> = tokens.iter().map(Token::text).collect();
        assert_eq!(texts, ["1", "+", "2", "\n"]);
        assert_eq!(stream.log(), "1 + 2\n");
    }

    #[test]
    fn string_crosses_refill_boundary() {
        let mut parts = vec![String::from("cd\" 5\n")].into_iter();
        let mut stream = TokenStream::with_refill("\"ab", Box::new(move || parts.next()));
        let tokens = drain(&mut stream);
        assert_eq!(tokens[0].kind(), TokenKind::String);
        assert_eq!(tokens[0].value(), &TokenValue::Text("abcd".into()));
        assert_eq!(tokens[1].value(), &TokenValue::Natural(5));
    }

    #[test]
    fn comment_crosses_refill_boundary() {
        let mut parts = vec![String::from(" comment\n7")].into_iter();
        let mut stream = TokenStream::with_refill("#start", Box::new(move || parts.next()));
        let tokens = drain(&mut stream);
        let texts: Vec<&str> = tokens.iter().map(Token::text).collect();
        assert_eq!(texts, ["\n", "7"]);
    }

    #[test]
    fn refilled_text_is_stripped_like_any_other() {
        let mut parts = vec![String::from("   9\n")].into_iter();
        let mut stream = TokenStream::with_refill("", Box::new(move || parts.next()));
        let tokens = drain(&mut stream);
        assert_eq!(tokens[0].value(), &TokenValue::Natural(9));
    }

    #[test]
    fn words_absorb_digits_but_not_symbols() {
        check(
            "ab3 cd+ef",
            expect![[r#"
                name@1:1 "ab3"
                name@1:5 "cd"
                operator@1:7 "+"
                name@1:8 "ef"
            "#]],
        );
    }
}
