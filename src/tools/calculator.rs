//! Arithmetic for agents: a small recursive-descent evaluator.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '×' | '÷') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! number  := digits ['.' digits] [('e' | 'E') ['+' | '-'] digits]
//! ```
//!
//! Nothing outside this grammar is evaluated.

use super::{Tool, ToolFuture};
use crate::PlannerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deepest nesting of parentheses and unary signs accepted.
pub const MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected trailing input at position {position}")]
    TrailingInput { position: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("expression nested deeper than 64 levels")]
    TooDeep,

    #[error("result is not a finite number")]
    NonFinite,
}

/// Evaluate an arithmetic expression such as `"(100 + 50) × 3 ÷ 2"`.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut parser = Parser {
        chars: expression.chars().collect(),
        pos: 0,
        depth: 0,
    };

    let value = parser.expr()?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(CalcError::TrailingInput {
            position: parser.pos,
        });
    }
    if !value.is_finite() {
        return Err(CalcError::NonFinite);
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ ('*' | '/' | '×' | '÷')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' | '×' => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                _ => value / rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(sign @ ('+' | '-')) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(if sign == '-' { -value } else { value })
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                self.descend()?;
                let value = self.expr()?;
                match self.peek() {
                    Some(')') => self.pos += 1,
                    Some(ch) => {
                        return Err(CalcError::UnexpectedChar {
                            ch,
                            position: self.pos,
                        })
                    }
                    None => return Err(CalcError::UnexpectedEnd),
                }
                self.depth -= 1;
                Ok(value)
            }
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.number(),
            Some(ch) => Err(CalcError::UnexpectedChar {
                ch,
                position: self.pos,
            }),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        self.digits();
        if self.chars.get(self.pos) == Some(&'.') {
            self.pos += 1;
            self.digits();
        }
        if let Some('e' | 'E') = self.chars.get(self.pos) {
            self.pos += 1;
            if let Some('+' | '-') = self.chars.get(self.pos) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return match self.chars.get(self.pos) {
                    Some(&ch) => Err(CalcError::UnexpectedChar {
                        ch,
                        position: self.pos,
                    }),
                    None => Err(CalcError::UnexpectedEnd),
                };
            }
        }

        let literal: String = self.chars[start..self.pos].iter().collect();
        literal.parse::<f64>().map_err(|_| CalcError::UnexpectedChar {
            ch: self.chars[start],
            position: start,
        })
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }
}

/// Parameters for the calculator tool
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CalculatorParams {
    /// Arithmetic expression using numbers, + - * / × ÷ and parentheses
    pub expression: String,
}

/// Evaluates arithmetic expressions for cost calculations
#[derive(Debug, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        "calculator"
    }

    fn description(&self) -> &'static str {
        "Evaluate an arithmetic expression (numbers, + - * / × ÷, parentheses)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. (100 + 50) * 3"
                }
            },
            "required": ["expression"]
        })
    }

    fn execute(&self, parameters: serde_json::Value) -> ToolFuture<'_> {
        Box::pin(async move {
            let params: CalculatorParams = serde_json::from_value(parameters)
                .map_err(|e| PlannerError::ToolExecution(format!("Invalid parameters: {}", e)))?;

            let result = evaluate(&params.expression).map_err(|e| {
                PlannerError::ToolExecution(format!("Cannot evaluate '{}': {}", params.expression, e))
            })?;

            Ok(serde_json::json!({
                "expression": params.expression,
                "result": result
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4"), Ok(14.0));
        assert_eq!(evaluate("(2 + 3) * 4"), Ok(20.0));
        assert_eq!(evaluate("10 - 4 - 3"), Ok(3.0));
        assert_eq!(evaluate("100 ÷ 4 × 2"), Ok(50.0));
    }

    #[test]
    fn numbers_and_signs() {
        assert_eq!(evaluate("-3 + +5"), Ok(2.0));
        assert_eq!(evaluate("--2"), Ok(2.0));
        assert_eq!(evaluate(".5 * 4"), Ok(2.0));
        assert_eq!(evaluate("1.5e2"), Ok(150.0));
        assert_eq!(evaluate("2E-1 * 10"), Ok(2.0));
    }

    #[test]
    fn reports_errors() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("1 +"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate(""), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("(1 + 2"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("2 3"), Err(CalcError::TrailingInput { position: 2 }));
        assert_eq!(
            evaluate("__import__('os')"),
            Err(CalcError::UnexpectedChar {
                ch: '_',
                position: 0
            })
        );
        assert_eq!(
            evaluate("1e"),
            Err(CalcError::UnexpectedEnd)
        );
        assert_eq!(evaluate("1e308 * 10"), Err(CalcError::NonFinite));
    }

    #[test]
    fn nesting_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(evaluate(&shallow), Ok(1.0));

        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(evaluate(&deep), Err(CalcError::TooDeep));
        assert_eq!(evaluate(&"-".repeat(MAX_DEPTH + 1)), Err(CalcError::TooDeep));
    }

    #[tokio::test]
    async fn tool_returns_result_or_error() {
        let tool = CalculatorTool::new();
        let value = tool
            .execute(serde_json::json!({"expression": "(100 + 50) * 3"}))
            .await
            .unwrap();
        assert_eq!(value["result"], 450.0);

        let err = tool
            .execute(serde_json::json!({"expression": "5 / 0"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }
}
