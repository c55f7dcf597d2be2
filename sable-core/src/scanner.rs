use phf::{phf_map, Map};

use crate::error::Error;
use crate::token::{Literal, Token, Type};

pub struct Scanner;

/// Best-effort scan result. `tokens` holds everything recognized before the
/// error (or the full sequence, terminated by an `Eof` token, on success).
#[derive(Debug, PartialEq)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub error: Option<Error>,
}

impl Scanner {
    const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "and" => Type::And,
        "else" => Type::Else,
        "false" => Type::False,
        "for" => Type::For,
        "fun" => Type::Fun,
        "if" => Type::If,
        "nil" => Type::Nil,
        "or" => Type::Or,
        "return" => Type::Return,
        "true" => Type::True,
        "var" => Type::Var,
        "while" => Type::While,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens<'a, 'b>(&'a mut self, src: &'b str) -> TokenStream
    where
        'b: 'a,
    {
        TokenStream::new(src)
    }

    /// Drains the token stream into the explicit partial-artifact form.
    pub fn scan(&mut self, src: &str) -> ScanOutput {
        let mut stream = self.scan_tokens(src);
        let tokens = stream.by_ref().collect();
        ScanOutput {
            tokens,
            error: stream.error().cloned(),
        }
    }
}

pub struct TokenStream<'a> {
    src: &'a str,
    line: usize,

    // Offset of the first character of the current line, used to derive
    // column numbers from byte offsets.
    line_start: usize,

    // `start` and `current` point to the start and end of the token being
    // scanned; `start_line`/`start_col` are latched when a token begins so
    // multi-line tokens report their leading position.
    start: usize,
    current: usize,
    start_line: usize,
    start_col: usize,

    // This flag is set to `true` if the eof is reached and the eof token has
    // been emitted. The iterator needs to distinguish between eof reached but
    // token not yet emitted, and eof reached and token emitted.
    eof: bool,
    error: Option<Error>,
}

impl<'a> TokenStream<'a> {
    pub fn new(src: &'a str) -> Self {
        TokenStream {
            src,
            line: 0,
            line_start: 0,
            start: 0,
            current: 0,
            start_line: 0,
            start_col: 0,
            eof: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn scan_token(&mut self) -> Result<Option<Token>, Error> {
        let c = self.advance();

        let token = match c {
            '(' => Some(self.make_token(Type::LeftParen)),
            ')' => Some(self.make_token(Type::RightParen)),
            '{' => Some(self.make_token(Type::LeftBrace)),
            '}' => Some(self.make_token(Type::RightBrace)),
            ',' => Some(self.make_token(Type::Comma)),
            '-' => Some(self.make_token(Type::Minus)),
            '+' => Some(self.make_token(Type::Plus)),
            ';' => Some(self.make_token(Type::SemiColon)),
            '*' => Some(self.make_token(Type::Star)),

            '!' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::BangEqual))
                } else {
                    Some(self.make_token(Type::Bang))
                }
            }

            '=' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::EqualEqual))
                } else {
                    Some(self.make_token(Type::Equal))
                }
            }

            '<' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::LessEqual))
                } else {
                    Some(self.make_token(Type::Less))
                }
            }

            '>' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::GreaterEqual))
                } else {
                    Some(self.make_token(Type::Greater))
                }
            }

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else if self.match_char('*') {
                    let mut done = false;
                    while !self.is_at_end() && !done {
                        if self.current() == '\n' {
                            self.line += 1;
                            self.line_start = self.current + 1;
                        }

                        let now = self.advance();
                        if now == '*' && self.peek() == '/' {
                            self.advance();
                            done = true;
                        }
                    }

                    if done {
                        None
                    } else {
                        return Err(Error::UnterminatedBlockComment {
                            line: self.start_line,
                            col: self.start_col,
                        });
                    }
                } else {
                    Some(self.make_token(Type::Slash))
                }
            }

            '"' => Some(self.string()?),

            // White spaces, do nothing
            ' ' | '\t' | '\r' => None,

            // Increment for new line
            '\n' => {
                self.line += 1;
                self.line_start = self.current;
                None
            }

            _ => {
                if c.is_ascii_digit() {
                    Some(self.number())
                } else if c.is_alphabetic() || c == '_' {
                    Some(self.identifier())
                } else {
                    return Err(Error::UnexpectedCharacter {
                        ch: c,
                        line: self.start_line,
                        col: self.start_col,
                    });
                }
            }
        };

        Ok(token)
    }

    fn string(&mut self) -> Result<Token, Error> {
        let mut decoded = String::new();

        while self.peek() != '"' && !self.is_at_end() {
            let ch = self.advance();
            match ch {
                '\n' => {
                    self.line += 1;
                    self.line_start = self.current;
                    decoded.push('\n');
                }
                '\\' => {
                    if self.is_at_end() {
                        break;
                    }
                    // Position of the backslash, which `advance` just passed.
                    let col = self.current - 1 - self.line_start;
                    let esc = self.advance();
                    match esc {
                        'n' => decoded.push('\n'),
                        't' => decoded.push('\t'),
                        'r' => decoded.push('\r'),
                        '\\' => decoded.push('\\'),
                        '"' => decoded.push('"'),
                        _ => {
                            return Err(Error::UnknownEscape {
                                ch: esc,
                                line: self.line,
                                col,
                            })
                        }
                    }
                }
                _ => decoded.push(ch),
            }
        }

        if self.is_at_end() {
            return Err(Error::UnterminatedString {
                line: self.start_line,
                col: self.start_col,
            });
        }

        // consume the closing "
        self.advance();
        Ok(self.make_token_with_val(Type::String, Literal::from(decoded)))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // The lexeme only ever contains digits and at most one dot, so the
        // parse cannot fail.
        let num = self.src[self.start..self.current].parse::<f64>().unwrap();
        self.make_token_with_val(Type::Number, Literal::Num(num))
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.src[self.start..self.current];

        match Scanner::KEYWORDS.get(text) {
            None => self.make_token(Type::Identifier),
            Some(ty @ Type::True) | Some(ty @ Type::False) => {
                let val = Literal::Bool(matches!(ty, Type::True));
                self.make_token_with_val(*ty, val)
            }
            Some(Type::Nil) => self.make_token_with_val(Type::Nil, Literal::Nil),
            Some(keyword) => self.make_token(*keyword),
        }
    }

    // `start`, `current` and `line_start` are byte offsets, always kept on
    // char boundaries, so lexeme slicing stays valid for multi-byte input.
    fn current(&self) -> char {
        self.src[self.current..].chars().next().unwrap()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.current()
        }
    }

    fn peek_next(&self) -> char {
        let mut chars = self.src[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let res = self.current();
        self.current += res.len_utf8();
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.current() != c {
            false
        } else {
            self.current += c.len_utf8();
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&mut self, ty: Type) -> Token {
        self.make_token_with_val(ty, Literal::Nil)
    }

    fn make_token_with_val(&mut self, ty: Type, val: Literal) -> Token {
        let lexeme = match ty {
            Type::Eof => String::new(),
            _ => String::from(&self.src[self.start..self.current]),
        };

        Token::new(ty, lexeme, self.start_line, self.start_col, val)
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof || self.error.is_some() {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_col = self.current - self.line_start;

            let token = self.scan_token();
            match token {
                Ok(None) => continue,
                Ok(Some(token)) => return Some(token),
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            }
        }

        self.eof = true;
        self.start_line = self.line;
        self.start_col = self.current - self.line_start;
        Some(self.make_token(Type::Eof))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::scanner::Scanner;
    use crate::token::{Literal, Token, Type};

    #[test]
    fn test_basic_scanning() {
        let source = "fun {} var foo bar 12.45 \"hello\" true false nil // this is a comment";
        let mut scanner = Scanner::new();
        let stream = scanner.scan_tokens(source);

        assert_eq!(
            stream.collect::<Vec<Token>>(),
            vec![
                Token::new(Type::Fun, String::from("fun"), 0, 0, Literal::Nil),
                Token::new(Type::LeftBrace, String::from("{"), 0, 4, Literal::Nil),
                Token::new(Type::RightBrace, String::from("}"), 0, 5, Literal::Nil),
                Token::new(Type::Var, String::from("var"), 0, 7, Literal::Nil),
                Token::new(Type::Identifier, String::from("foo"), 0, 11, Literal::Nil),
                Token::new(Type::Identifier, String::from("bar"), 0, 15, Literal::Nil),
                Token::new(
                    Type::Number,
                    String::from("12.45"),
                    0,
                    19,
                    Literal::Num(12.45)
                ),
                Token::new(
                    Type::String,
                    String::from("\"hello\""),
                    0,
                    25,
                    Literal::from("hello")
                ),
                Token::new(
                    Type::True,
                    String::from("true"),
                    0,
                    33,
                    Literal::Bool(true)
                ),
                Token::new(
                    Type::False,
                    String::from("false"),
                    0,
                    38,
                    Literal::Bool(false)
                ),
                Token::new(Type::Nil, String::from("nil"), 0, 44, Literal::Nil),
                Token::new(Type::Eof, String::new(), 0, 68, Literal::Nil),
            ]
        );
    }

    #[test]
    fn test_line_and_column_positions() {
        let source = "var x;\nx = 10;";
        let mut scanner = Scanner::new();
        let tokens: Vec<Token> = scanner.scan_tokens(source).collect();

        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.col)).collect();
        assert_eq!(
            positions,
            vec![(0, 0), (0, 4), (0, 5), (1, 0), (1, 2), (1, 4), (1, 6), (1, 7)]
        );
    }

    #[test]
    fn test_maximal_munch_operators() {
        let source = "= == ! != < <= > >=";
        let mut scanner = Scanner::new();
        let types: Vec<Type> = scanner.scan_tokens(source).map(|t| t.ty).collect();

        assert_eq!(
            types,
            vec![
                Type::Equal,
                Type::EqualEqual,
                Type::Bang,
                Type::BangEqual,
                Type::Less,
                Type::LessEqual,
                Type::Greater,
                Type::GreaterEqual,
                Type::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let source = "\"a\\tb\\n\\\"c\\\"\"";
        let mut scanner = Scanner::new();
        let tokens: Vec<Token> = scanner.scan_tokens(source).collect();

        assert_eq!(tokens[0].value, Literal::from("a\tb\n\"c\""));
    }

    #[test]
    fn test_unknown_escape() {
        let source = "\"a\\qb\"";
        let mut scanner = Scanner::new();
        let out = scanner.scan(source);

        assert_eq!(
            out.error,
            Some(Error::UnknownEscape {
                ch: 'q',
                line: 0,
                col: 2
            })
        );
    }

    #[test]
    fn test_multiline_comment() {
        let source = "/*\n\
            this is a multiline comment \n\
        */";
        let mut scanner = Scanner::new();
        let stream = scanner.scan_tokens(source);

        assert_eq!(
            stream.collect::<Vec<Token>>(),
            vec![Token::new(Type::Eof, String::new(), 2, 2, Literal::Nil)]
        );
    }

    #[test]
    fn test_unterminated_multiline_comment() {
        let source = "/*";
        let mut scanner = Scanner::new();
        let mut stream = scanner.scan_tokens(source);
        stream.by_ref().last();

        assert_eq!(
            stream.error().unwrap(),
            &Error::UnterminatedBlockComment { line: 0, col: 0 }
        );
    }

    #[test]
    fn test_unterminated_string_keeps_prior_tokens() {
        let source = "var s = \"hello";
        let mut scanner = Scanner::new();
        let out = scanner.scan(source);

        // Everything before the offending string is still returned.
        let types: Vec<Type> = out.tokens.iter().map(|t| t.ty).collect();
        assert_eq!(types, vec![Type::Var, Type::Identifier, Type::Equal]);
        assert_eq!(out.error, Some(Error::UnterminatedString { line: 0, col: 8 }));
    }

    #[test]
    fn test_unexpected_character() {
        let source = "1 + @";
        let mut scanner = Scanner::new();
        let out = scanner.scan(source);

        assert_eq!(
            out.error,
            Some(Error::UnexpectedCharacter {
                ch: '@',
                line: 0,
                col: 4
            })
        );
        assert_eq!(out.tokens.len(), 2);
    }

    #[test]
    fn test_non_ascii_source() {
        // Multi-byte characters in literals, identifiers and comments must
        // scan like any others, with lexemes sliced on char boundaries.
        let source = "var café = \"über\"; // àéîõü\nprint(café);";
        let mut scanner = Scanner::new();
        let out = scanner.scan(source);

        assert_eq!(out.error, None);
        let types: Vec<Type> = out.tokens.iter().map(|t| t.ty).collect();
        assert_eq!(
            types,
            vec![
                Type::Var,
                Type::Identifier,
                Type::Equal,
                Type::String,
                Type::SemiColon,
                Type::Identifier,
                Type::LeftParen,
                Type::Identifier,
                Type::RightParen,
                Type::SemiColon,
                Type::Eof,
            ]
        );
        assert_eq!(out.tokens[1].lexeme, "café");
        assert_eq!(out.tokens[3].value, Literal::from("über"));
    }

    #[test]
    fn test_unterminated_string_with_non_ascii_content() {
        let mut scanner = Scanner::new();
        let out = scanner.scan("var s = \"café");

        let types: Vec<Type> = out.tokens.iter().map(|t| t.ty).collect();
        assert_eq!(types, vec![Type::Var, Type::Identifier, Type::Equal]);
        assert_eq!(out.error, Some(Error::UnterminatedString { line: 0, col: 8 }));
    }

    #[test]
    fn test_scan_ends_with_eof_on_success() {
        let mut scanner = Scanner::new();
        let out = scanner.scan("1 + 2;");

        assert!(out.error.is_none());
        assert_eq!(out.tokens.last().unwrap().ty, Type::Eof);
    }
}
