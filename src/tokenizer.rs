use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Position of a token in the source text (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// All token kinds in OperatorLang
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Str(String),
    Boolean(bool),
    Null,

    // Identifiers and keywords
    Identifier(String),
    Let,
    If,
    Else,
    While,
    For,
    In,
    Range,
    Func,
    Return,
    Break,
    Continue,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Not,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Str(s) => write!(f, "\"{}\"", s),
            TokenKind::Boolean(b) => write!(f, "{}", b),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// A token with its kind and position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedChar { ch: char, line: usize, column: usize },
    #[error("Unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

/// Tokenizer for OperatorLang source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    keywords: HashMap<String, TokenKind>,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("let".to_string(), TokenKind::Let);
        keywords.insert("if".to_string(), TokenKind::If);
        keywords.insert("else".to_string(), TokenKind::Else);
        keywords.insert("while".to_string(), TokenKind::While);
        keywords.insert("for".to_string(), TokenKind::For);
        keywords.insert("in".to_string(), TokenKind::In);
        keywords.insert("range".to_string(), TokenKind::Range);
        keywords.insert("func".to_string(), TokenKind::Func);
        keywords.insert("return".to_string(), TokenKind::Return);
        keywords.insert("break".to_string(), TokenKind::Break);
        keywords.insert("continue".to_string(), TokenKind::Continue);
        keywords.insert("true".to_string(), TokenKind::Boolean(true));
        keywords.insert("false".to_string(), TokenKind::Boolean(false));
        keywords.insert("null".to_string(), TokenKind::Null);

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            // Comments run to end of line
            if self.current_char() == '#' {
                self.handle_comment();
                continue;
            }

            if self.current_char() == '"' || self.current_char() == '\'' {
                self.handle_string()?;
                continue;
            }

            if self.current_char().is_ascii_digit() {
                self.handle_number();
                continue;
            }

            if self.current_char().is_alphabetic() || self.current_char() == '_' {
                self.handle_identifier();
                continue;
            }

            self.handle_operator_or_delimiter()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, self.current_position()));
        Ok(self.tokens.clone())
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.current_char();
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn handle_comment(&mut self) {
        while !self.is_at_end() && self.current_char() != '\n' {
            self.advance();
        }
    }

    fn handle_string(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        let quote = self.advance();

        let mut value = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            if self.current_char() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    // Unknown escapes keep the escaped character
                    other => value.push(other),
                }
                self.advance();
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(LexError::UnterminatedString {
                line: start.line,
                column: start.column,
            });
        }

        self.advance();
        self.tokens.push(Token::new(TokenKind::Str(value), start));
        Ok(())
    }

    fn handle_number(&mut self) {
        let start = self.current_position();
        let mut number = String::new();
        let mut has_dot = false;

        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || self.current_char() == '.')
        {
            if self.current_char() == '.' {
                if has_dot {
                    break;
                }
                has_dot = true;
            }
            number.push(self.advance());
        }

        // The scanned text is digits with at most one dot, so this cannot fail
        let value = number.parse::<f64>().unwrap_or(f64::NAN);
        self.tokens
            .push(Token::new(TokenKind::Number(value), start));
    }

    fn handle_identifier(&mut self) {
        let start = self.current_position();
        let mut identifier = String::new();
        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            identifier.push(self.advance());
        }
        let kind = self
            .keywords
            .get(&identifier)
            .cloned()
            .unwrap_or(TokenKind::Identifier(identifier));
        self.tokens.push(Token::new(kind, start));
    }

    fn handle_operator_or_delimiter(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        let ch = self.advance();

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::NotEqual
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '&' => {
                if self.current_char() == '&' {
                    self.advance();
                    TokenKind::And
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        line: start.line,
                        column: start.column,
                    });
                }
            }
            '|' => {
                if self.current_char() == '|' {
                    self.advance();
                    TokenKind::Or
                } else {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        line: start.line,
                        column: start.column,
                    });
                }
            }
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            _ => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    line: start.line,
                    column: start.column,
                });
            }
        };

        self.tokens.push(Token::new(kind, start));
        Ok(())
    }
}
