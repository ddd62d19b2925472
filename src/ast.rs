use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal values as they appear in source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    Str(String),
}

/// Binary operators, serialized with their surface spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Lte => "<=",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Minus,
}

/// Expression nodes. The serialized form tags each node with `type`,
/// matching the program interchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Expr {
    Value {
        value: Literal,
    },
    Variable {
        name: String,
    },
    Call {
        function: String,
        arguments: Vec<Expr>,
    },
    Binary {
        operator: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        operator: UnaryOp,
        expression: Box<Expr>,
    },
    Array {
        elements: Vec<Expr>,
    },
    // No surface grammar produces this node; it survives for snapshot
    // compatibility and host-constructed programs.
    Object {
        properties: Vec<(String, Expr)>,
    },
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Stmt {
    Assign {
        variable: String,
        expression: Expr,
    },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        #[serde(rename = "elseBody", default)]
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        variable: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Return {
        expression: Expr,
    },
    Expression {
        expression: Expr,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_json_shape() {
        let stmt = Stmt::Assign {
            variable: "x".to_string(),
            expression: Expr::Value {
                value: Literal::Number(5.0),
            },
        };
        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "assign",
                "variable": "x",
                "expression": { "type": "value", "value": 5.0 }
            })
        );
    }

    #[test]
    fn test_binary_operator_spelling() {
        let expr = Expr::Binary {
            operator: BinaryOp::Lte,
            left: Box::new(Expr::Variable {
                name: "n".to_string(),
            }),
            right: Box::new(Expr::Value {
                value: Literal::Number(1.0),
            }),
        };
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["operator"], "<=");
    }

    #[test]
    fn test_if_round_trips_without_else() {
        let stmt = Stmt::If {
            condition: Expr::Value {
                value: Literal::Boolean(true),
            },
            body: vec![],
            else_body: None,
        };
        let json = serde_json::to_string(&stmt).unwrap();
        let back: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
    }
}
