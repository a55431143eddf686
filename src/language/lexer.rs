use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};

#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Scan a Sol source text into a token sequence terminated by `Eof`.
///
/// Comments run from `#` to the end of the line. Strings are double-quoted
/// and carry no escape sequences; a raw newline terminates the literal with
/// an error. Numbers are decimal integer sequences stored as 64-bit floats.
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<LexError>> {
    let lexer = Lexer::new(source);
    lexer.run()
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::str::Chars<'a>,
    current: Option<char>,
    offset: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let mut chars = src.chars();
        let current = chars.next();
        Self {
            src,
            chars,
            current,
            offset: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, Vec<LexError>> {
        while let Some(ch) = self.current {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => self.eat_line_comment(),
                'a'..='z' => self.lex_identifier(),
                'A'..='Z' => self.lex_type_name(),
                '0'..='9' => self.lex_number(),
                '"' => self.lex_string(),
                _ => self.lex_symbol(),
            }
        }
        self.push_token(TokenKind::Eof, self.offset, self.offset);

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(ch) = self.current {
            self.offset += ch.len_utf8();
        }
        self.current = self.chars.next();
        self.current
    }

    fn push_token(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }

    fn error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        self.errors.push(LexError {
            message: message.into(),
            span: Span::new(start, end),
        });
    }

    fn eat_line_comment(&mut self) {
        while let Some(ch) = self.current {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn eat_word(&mut self) {
        while let Some(ch) = self.current {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_identifier(&mut self) {
        let start = self.offset;
        self.eat_word();
        let end = self.offset;
        let slice = &self.src[start..end];
        let kind = match slice {
            "constant" => TokenKind::Constant,
            "function" => TokenKind::Function,
            "structure" => TokenKind::Structure,
            "variable" => TokenKind::Variable,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Identifier(slice.to_string()),
        };
        self.push_token(kind, start, end);
    }

    fn lex_type_name(&mut self) {
        let start = self.offset;
        self.eat_word();
        let end = self.offset;
        self.push_token(TokenKind::TypeName(self.src[start..end].to_string()), start, end);
    }

    fn lex_number(&mut self) {
        let start = self.offset;
        while let Some(ch) = self.current {
            if ch.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.offset;
        match self.src[start..end].parse::<f64>() {
            Ok(value) => self.push_token(TokenKind::Number(value), start, end),
            Err(_) => self.error(start, end, "Invalid number literal"),
        }
    }

    fn lex_string(&mut self) {
        let start = self.offset;
        self.bump();
        let mut value = String::new();
        while let Some(ch) = self.current {
            match ch {
                '"' => {
                    self.bump();
                    let end = self.offset;
                    self.push_token(TokenKind::String(value), start, end);
                    return;
                }
                '\n' => break,
                _ => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        self.error(start, self.offset, "Unterminated string literal");
    }

    fn lex_symbol(&mut self) {
        let start = self.offset;
        match self.current {
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some('[') => self.single(TokenKind::LBracket),
            Some(']') => self.single(TokenKind::RBracket),
            Some('{') => self.single(TokenKind::LBrace),
            Some('}') => self.single(TokenKind::RBrace),
            Some('+') => self.single(TokenKind::Plus),
            Some('*') => self.single(TokenKind::Star),
            Some('/') => self.single(TokenKind::Slash),
            Some('%') => self.single(TokenKind::Percent),
            Some('.') => self.single(TokenKind::Dot),
            Some(',') => self.single(TokenKind::Comma),
            Some(':') => self.single(TokenKind::Colon),
            Some(';') => self.single(TokenKind::Semi),
            Some('!') => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    self.push_token(TokenKind::BangEq, start, self.offset);
                } else {
                    self.push_token(TokenKind::Bang, start, self.offset);
                }
            }
            Some('=') => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    self.push_token(TokenKind::EqEq, start, self.offset);
                } else {
                    self.push_token(TokenKind::Eq, start, self.offset);
                }
            }
            Some('<') => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    self.push_token(TokenKind::LtEq, start, self.offset);
                } else {
                    self.push_token(TokenKind::Lt, start, self.offset);
                }
            }
            Some('>') => {
                self.bump();
                if self.current == Some('=') {
                    self.bump();
                    self.push_token(TokenKind::GtEq, start, self.offset);
                } else {
                    self.push_token(TokenKind::Gt, start, self.offset);
                }
            }
            Some('-') => {
                self.bump();
                if self.current == Some('>') {
                    self.bump();
                    self.push_token(TokenKind::Arrow, start, self.offset);
                } else {
                    self.push_token(TokenKind::Minus, start, self.offset);
                }
            }
            Some(ch) => {
                self.bump();
                self.error(start, self.offset, format!("Unexpected character '{}'", ch));
            }
            None => {}
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.offset;
        self.bump();
        self.push_token(kind, start, self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lex failed")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn empty_source_yields_only_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn keywords_and_identifiers_are_classified() {
        assert_eq!(
            kinds("function main variable x"),
            vec![
                TokenKind::Function,
                TokenKind::Identifier("main".into()),
                TokenKind::Variable,
                TokenKind::Identifier("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn uppercase_leading_words_are_type_names() {
        assert_eq!(
            kinds("Number myNumber"),
            vec![
                TokenKind::TypeName("Number".into()),
                TokenKind::Identifier("myNumber".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn boolean_literals_keep_their_lexeme() {
        assert_eq!(
            kinds("true false trueish"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Identifier("trueish".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn multi_character_operators_win_over_prefixes() {
        assert_eq!(
            kinds("== = != ! <= < -> -"),
            vec![
                TokenKind::EqEq,
                TokenKind::Eq,
                TokenKind::BangEq,
                TokenKind::Bang,
                TokenKind::LtEq,
                TokenKind::Lt,
                TokenKind::Arrow,
                TokenKind::Minus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_are_integer_sequences_stored_as_floats() {
        assert_eq!(
            kinds("42 007"),
            vec![TokenKind::Number(42.0), TokenKind::Number(7.0), TokenKind::Eof]
        );
    }

    #[test]
    fn fractional_literals_are_not_lexed_as_one_token() {
        assert_eq!(
            kinds("1.5"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Dot,
                TokenKind::Number(5.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_have_no_escape_processing() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::String("a\\nb".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn newline_inside_string_is_an_error() {
        let errors = lex("\"abc\ndef\"").unwrap_err();
        assert_eq!(errors[0].message, "Unterminated string literal");
    }

    #[test]
    fn unterminated_string_at_eof_is_an_error() {
        let errors = lex("\"abc").unwrap_err();
        assert_eq!(errors[0].message, "Unterminated string literal");
        assert_eq!(errors[0].span.start, 0);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("1 # everything here is skipped != ==\n2"),
            vec![TokenKind::Number(1.0), TokenKind::Number(2.0), TokenKind::Eof]
        );
    }

    #[test]
    fn comment_at_eof_without_trailing_newline() {
        assert_eq!(kinds("1 # trailing"), vec![TokenKind::Number(1.0), TokenKind::Eof]);
    }

    #[test]
    fn unexpected_character_reports_its_span() {
        let errors = lex("  @").unwrap_err();
        assert_eq!(errors[0].message, "Unexpected character '@'");
        assert_eq!(errors[0].span.start, 2);
    }

    #[test]
    fn token_spans_point_at_token_starts() {
        let tokens = lex("if x {\n  y\n}").expect("lex failed");
        let starts: Vec<usize> = tokens.iter().map(|token| token.span.start).collect();
        assert_eq!(starts, vec![0, 3, 5, 9, 11, 12]);
    }
}
