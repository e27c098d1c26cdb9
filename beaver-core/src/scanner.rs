use phf::{phf_map, Map};

use crate::error::Error;
use crate::token::{Token, Type};

pub struct Scanner;

impl Scanner {
    const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "function" => Type::Function,
        "let" => Type::Let,
        "true" => Type::True,
        "false" => Type::False,
        "if" => Type::If,
        "else" => Type::Else,
        "return" => Type::Return,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens(&mut self, src: &str) -> TokenStream {
        TokenStream::new(src)
    }

    pub fn lookup_identifier(ident: &str) -> Type {
        Scanner::KEYWORDS
            .get(ident)
            .copied()
            .unwrap_or(Type::Identifier)
    }
}

pub struct TokenStream {
    src: Vec<char>,
    line: usize,

    // Index of the first character of the current line, used to derive columns
    line_start: usize,

    // `start` and `current` points to the start and end of the token being scanned
    start: usize,
    current: usize,

    // Set once the eof token has been emitted, so the iterator can tell "reached the end" apart
    // from "reached the end and already handed out Eof".
    eof: bool,
    error: Option<Error>,
}

impl TokenStream {
    pub fn new(src: &str) -> Self {
        TokenStream {
            src: src.chars().collect(),
            line: 1,
            line_start: 0,
            start: 0,
            current: 0,
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
            ';' => Some(self.make_token(Type::SemiColon)),
            '+' => Some(self.make_token(Type::Plus)),
            '-' => Some(self.make_token(Type::Minus)),
            '*' => Some(self.make_token(Type::Star)),
            '<' => Some(self.make_token(Type::Less)),
            '>' => Some(self.make_token(Type::Greater)),

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
                    Some(self.make_token(Type::Assign))
                }
            }

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else {
                    Some(self.make_token(Type::Slash))
                }
            }

            '"' => Some(self.string()?),

            ' ' | '\t' | '\r' => None,

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
                    Some(self.make_token(Type::Illegal))
                }
            }
        };

        Ok(token)
    }

    fn string(&mut self) -> Result<Token, Error> {
        let line = self.line;
        let col = self.start - self.line_start;

        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
                self.line_start = self.current + 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::UnterminatedString { line });
        }

        // consume the closing "
        self.advance();
        let text = self.src[self.start + 1..self.current - 1].iter().collect();
        Ok(Token::new(Type::String, text, line, col))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        self.make_token(Type::Int)
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.src[self.start..self.current].iter().collect();
        let ty = Scanner::lookup_identifier(&text);
        Token::new(ty, text, self.line, self.start - self.line_start)
    }

    fn peek(&self) -> char {
        self.src.get(self.current).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let res = self.peek();
        self.current += 1;
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.peek() != c {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&mut self, ty: Type) -> Token {
        let lexeme = match ty {
            Type::Eof => String::new(),
            _ => self.src[self.start..self.current].iter().collect(),
        };

        Token::new(ty, lexeme, self.line, self.start - self.line_start)
    }
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof || self.error.is_some() {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.current;

            match self.scan_token() {
                Ok(None) => continue,
                Ok(Some(token)) => return Some(token),
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            }
        }

        self.eof = true;
        self.start = self.current;
        Some(self.make_token(Type::Eof))
    }
}
