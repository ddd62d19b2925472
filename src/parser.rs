use std::fmt;

use crate::ast::{BinaryOp, Expr, Literal, Stmt, UnaryOp};
use crate::tokenizer::{Position, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        position: Position,
    },
    UnexpectedEndOfInput {
        expected: String,
        position: Position,
    },
    InvalidSyntax {
        message: String,
        position: Position,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                position,
            } => write!(
                f,
                "Expected {} but found {:?} at {}",
                expected, found, position
            ),
            ParseError::UnexpectedEndOfInput { expected, position } => {
                write!(f, "Unexpected end of input, expected {} at {}", expected, position)
            }
            ParseError::InvalidSyntax { message, position } => {
                write!(f, "{} at {}", message, position)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Recursive-descent parser with one token of lookahead.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, Position::new(1, 1)));
        }
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    //=============================================
    //            Statements
    //=============================================

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Func => self.parse_function(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Identifier(_) if matches!(self.peek_next().kind, TokenKind::Equal) => {
                self.parse_assignment()
            }
            _ => {
                let expression = self.parse_expression()?;
                Ok(Stmt::Expression { expression })
            }
        }
    }

    fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'let'
        let variable = self.consume_identifier("variable name")?;
        self.consume(&TokenKind::Equal, "'='")?;
        let expression = self.parse_expression()?;
        Ok(Stmt::Assign {
            variable,
            expression,
        })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, ParseError> {
        let variable = self.consume_identifier("variable name")?;
        self.consume(&TokenKind::Equal, "'='")?;
        let expression = self.parse_expression()?;
        Ok(Stmt::Assign {
            variable,
            expression,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'if'
        let condition = self.parse_expression()?;
        self.consume(&TokenKind::LeftBrace, "'{'")?;
        let body = self.parse_block()?;

        let else_body = if self.check(&TokenKind::Else) {
            self.advance();
            self.consume(&TokenKind::LeftBrace, "'{'")?;
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            body,
            else_body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'while'
        let condition = self.parse_expression()?;
        self.consume(&TokenKind::LeftBrace, "'{'")?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'for'
        let variable = self.consume_identifier("loop variable")?;
        self.consume(&TokenKind::In, "'in'")?;
        self.consume(&TokenKind::Range, "'range'")?;
        self.consume(&TokenKind::LeftParen, "'('")?;
        let start = self.parse_expression()?;
        self.consume(&TokenKind::Comma, "','")?;
        let end = self.parse_expression()?;
        self.consume(&TokenKind::RightParen, "')'")?;
        self.consume(&TokenKind::LeftBrace, "'{'")?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            variable,
            start,
            end,
            body,
        })
    }

    fn parse_function(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'func'
        let name = self.consume_identifier("function name")?;
        self.consume(&TokenKind::LeftParen, "'('")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.consume_identifier("parameter name")?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.consume(&TokenKind::RightParen, "')'")?;
        self.consume(&TokenKind::LeftBrace, "'{'")?;
        let body = self.parse_block()?;
        Ok(Stmt::Function { name, params, body })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'return'
        let expression = self.parse_expression()?;
        Ok(Stmt::Return { expression })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::Eof) {
            statements.push(self.parse_statement()?);
        }
        self.consume(&TokenKind::RightBrace, "'}'")?;
        Ok(statements)
    }

    //=============================================
    //            Expressions
    //=============================================

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expr::Binary {
                operator: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary {
                operator: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::NotEqual => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::LessEqual => BinaryOp::Lte,
                TokenKind::GreaterEqual => BinaryOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let operator = match self.peek().kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let expression = self.parse_unary()?;
            return Ok(Expr::Unary {
                operator,
                expression: Box::new(expression),
            });
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        while self.check(&TokenKind::LeftParen) {
            // Callees are restricted to plain function names
            let function = match expr {
                Expr::Variable { name } => name,
                other => {
                    return Err(ParseError::InvalidSyntax {
                        message: format!("Expected function name, found {:?}", other),
                        position: self.peek().position,
                    });
                }
            };
            self.advance(); // consume '('

            let mut arguments = Vec::new();
            if !self.check(&TokenKind::RightParen) {
                loop {
                    arguments.push(self.parse_expression()?);
                    if !self.check(&TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
            }
            self.consume(&TokenKind::RightParen, "')'")?;

            expr = Expr::Call {
                function,
                arguments,
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Value {
                    value: Literal::Number(n),
                })
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Value {
                    value: Literal::Str(s),
                })
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Value {
                    value: Literal::Boolean(b),
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Value {
                    value: Literal::Null,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Variable { name })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.check(&TokenKind::Comma) {
                            break;
                        }
                        self.advance();
                    }
                }
                self.consume(&TokenKind::RightBracket, "']'")?;
                Ok(Expr::Array { elements })
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEndOfInput {
                expected: "expression".to_string(),
                position: token.position,
            }),
            found => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found,
                position: token.position,
            }),
        }
    }

    //=============================================
    //            Utilities
    //=============================================

    // Utility: current token without consuming it
    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    // Utility: the token after the current one
    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    // Utility: does the current token match this kind exactly?
    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn consume(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.clone(),
                position: token.position,
            })
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            found => Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found,
                position: token.position,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn parse_source(input: &str) -> Result<Vec<Stmt>, ParseError> {
        let mut tokenizer = Tokenizer::new(input);
        let tokens = tokenizer.tokenize().unwrap();
        Parser::new(tokens).parse()
    }

    fn number(n: f64) -> Expr {
        Expr::Value {
            value: Literal::Number(n),
        }
    }

    fn variable(name: &str) -> Expr {
        Expr::Variable {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_let_and_bare_assignment_produce_the_same_node() {
        let with_let = parse_source("let x = 1").unwrap();
        let bare = parse_source("x = 1").unwrap();
        assert_eq!(with_let, bare);
        assert_eq!(
            with_let[0],
            Stmt::Assign {
                variable: "x".to_string(),
                expression: number(1.0),
            }
        );
    }

    #[test]
    fn test_precedence_mul_binds_tighter_than_add() {
        let program = parse_source("let y = 1 + 2 * 3").unwrap();
        let Stmt::Assign { expression, .. } = &program[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expression,
            Expr::Binary {
                operator: BinaryOp::Add,
                left: Box::new(number(1.0)),
                right: Box::new(Expr::Binary {
                    operator: BinaryOp::Mul,
                    left: Box::new(number(2.0)),
                    right: Box::new(number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_same_precedence_is_left_associative() {
        let program = parse_source("let y = 10 - 4 - 3").unwrap();
        let Stmt::Assign { expression, .. } = &program[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expression,
            Expr::Binary {
                operator: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    operator: BinaryOp::Sub,
                    left: Box::new(number(10.0)),
                    right: Box::new(number(4.0)),
                }),
                right: Box::new(number(3.0)),
            }
        );
    }

    #[test]
    fn test_if_else_statement() {
        let program = parse_source("if x > 0 { print(x) } else { print(0) }").unwrap();
        let Stmt::If {
            condition,
            body,
            else_body,
        } = &program[0]
        else {
            panic!("expected if");
        };
        assert_eq!(
            *condition,
            Expr::Binary {
                operator: BinaryOp::Gt,
                left: Box::new(variable("x")),
                right: Box::new(number(0.0)),
            }
        );
        assert_eq!(body.len(), 1);
        assert_eq!(else_body.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_for_range_statement() {
        let program = parse_source("for i in range(0, 10) { print(i) }").unwrap();
        let Stmt::For {
            variable: var,
            start,
            end,
            body,
        } = &program[0]
        else {
            panic!("expected for");
        };
        assert_eq!(var, "i");
        assert_eq!(*start, number(0.0));
        assert_eq!(*end, number(10.0));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_function_declaration() {
        let program = parse_source("func add(a, b) { return a + b }").unwrap();
        let Stmt::Function { name, params, body } = &program[0] else {
            panic!("expected function declaration");
        };
        assert_eq!(name, "add");
        assert_eq!(params, &["a".to_string(), "b".to_string()]);
        assert!(matches!(body[0], Stmt::Return { .. }));
    }

    #[test]
    fn test_call_arguments() {
        let program = parse_source("print(1, \"two\", x)").unwrap();
        let Stmt::Expression {
            expression: Expr::Call {
                function,
                arguments,
            },
        } = &program[0]
        else {
            panic!("expected call");
        };
        assert_eq!(function, "print");
        assert_eq!(arguments.len(), 3);
    }

    #[test]
    fn test_array_literal() {
        let program = parse_source("let xs = [1, 2, 3]").unwrap();
        let Stmt::Assign { expression, .. } = &program[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expression,
            Expr::Array {
                elements: vec![number(1.0), number(2.0), number(3.0)],
            }
        );
    }

    #[test]
    fn test_unary_operators_nest() {
        let program = parse_source("let v = !-x").unwrap();
        let Stmt::Assign { expression, .. } = &program[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expression,
            Expr::Unary {
                operator: UnaryOp::Not,
                expression: Box::new(Expr::Unary {
                    operator: UnaryOp::Minus,
                    expression: Box::new(variable("x")),
                }),
            }
        );
    }

    #[test]
    fn test_callee_must_be_a_name() {
        let error = parse_source("[1](0)").unwrap_err();
        assert!(matches!(error, ParseError::InvalidSyntax { .. }));

        // The result of a call is not itself callable
        let chained = parse_source("f(1)(2)").unwrap_err();
        assert!(matches!(chained, ParseError::InvalidSyntax { .. }));

        // A parenthesized name still reduces to a plain name
        assert!(parse_source("(f)(1)").is_ok());
    }

    #[test]
    fn test_missing_brace_reports_current_position() {
        let error = parse_source("if x > 0 print(x)").unwrap_err();
        let ParseError::UnexpectedToken {
            expected, position, ..
        } = error
        else {
            panic!("expected UnexpectedToken");
        };
        assert_eq!(expected, "'{'");
        assert_eq!(position, Position::new(1, 10));
    }

    #[test]
    fn test_end_of_input_error_carries_position() {
        let error = parse_source("let x =").unwrap_err();
        let ParseError::UnexpectedEndOfInput { expected, position } = error else {
            panic!("expected UnexpectedEndOfInput");
        };
        assert_eq!(expected, "expression");
        assert_eq!(position, Position::new(1, 8));
    }

    #[test]
    fn test_unclosed_block_fails() {
        let error = parse_source("while true { print(1)").unwrap_err();
        assert!(matches!(error, ParseError::UnexpectedToken { .. }));
    }
}
