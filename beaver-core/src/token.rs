use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Illegal,
    Eof,

    Identifier,
    Int,
    String,

    Assign,
    Plus,
    Minus,
    Bang,
    Star,
    Slash,
    Less,
    Greater,
    EqualEqual,
    BangEqual,

    Comma,
    SemiColon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

impl Type {
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Illegal => "ILLEGAL",
            Type::Eof => "EOF",
            Type::Identifier => "IDENT",
            Type::Int => "INT",
            Type::String => "STRING",
            Type::Assign => "=",
            Type::Plus => "+",
            Type::Minus => "-",
            Type::Bang => "!",
            Type::Star => "*",
            Type::Slash => "/",
            Type::Less => "<",
            Type::Greater => ">",
            Type::EqualEqual => "==",
            Type::BangEqual => "!=",
            Type::Comma => ",",
            Type::SemiColon => ";",
            Type::LeftParen => "(",
            Type::RightParen => ")",
            Type::LeftBrace => "{",
            Type::RightBrace => "}",
            Type::Function => "FUNCTION",
            Type::Let => "LET",
            Type::True => "TRUE",
            Type::False => "FALSE",
            Type::If => "IF",
            Type::Else => "ELSE",
            Type::Return => "RETURN",
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub ty: Type,

    // Raw text of the token. String literals keep only what is between the quotes.
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(ty: Type, lexeme: String, line: usize, col: usize) -> Self {
        Token {
            ty,
            lexeme,
            line,
            col,
        }
    }

    pub fn is(&self, ty: Type) -> bool {
        self.ty == ty
    }
}
