//! Arithmetic tools.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

/// Add two integers.
pub struct Add;

#[async_trait]
impl Tool for Add {
    fn name(&self) -> &str {
        "add"
    }

    fn description(&self) -> &str {
        "Add two numbers together."
    }

    fn parameters_schema(&self) -> Value {
        integer_pair_schema()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let (a, b) = integer_pair(&args)?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| anyhow::anyhow!("Integer overflow adding {} and {}", a, b))?;
        Ok(sum.to_string())
    }
}

/// Multiply two integers.
pub struct Multiply;

#[async_trait]
impl Tool for Multiply {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers together."
    }

    fn parameters_schema(&self) -> Value {
        integer_pair_schema()
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let (a, b) = integer_pair(&args)?;
        let product = a
            .checked_mul(b)
            .ok_or_else(|| anyhow::anyhow!("Integer overflow multiplying {} and {}", a, b))?;
        Ok(product.to_string())
    }
}

/// Evaluate an arithmetic expression.
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression with +, -, *, / and parentheses. Use this for any calculation instead of doing math in your head."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '25*17' or '(2 + 3) / 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let expression = args["expression"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'expression' argument"))?;

        let value = evaluate(expression)?;
        Ok(format_number(value))
    }
}

fn integer_pair_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "a": { "type": "integer", "description": "First operand" },
            "b": { "type": "integer", "description": "Second operand" }
        },
        "required": ["a", "b"]
    })
}

fn integer_pair(args: &Value) -> anyhow::Result<(i64, i64)> {
    let a = args["a"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("Missing 'a' argument"))?;
    let b = args["b"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("Missing 'b' argument"))?;
    Ok((a, b))
}

/// Print integral results without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Evaluate `expression` with the usual precedence rules.
pub(crate) fn evaluate(expression: &str) -> anyhow::Result<f64> {
    let mut parser = Parser {
        chars: expression.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };
    if parser.chars.is_empty() {
        anyhow::bail!("Empty expression");
    }
    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        anyhow::bail!("Unexpected '{}' at position {}", c, parser.pos);
    }
    if !value.is_finite() {
        anyhow::bail!("Result is not a finite number");
    }
    Ok(value)
}

/// Deepest run of unary signs and parentheses the parser will follow.
const MAX_DEPTH: usize = 256;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> anyhow::Result<f64> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> anyhow::Result<f64> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    anyhow::bail!("Division by zero");
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> anyhow::Result<f64> {
        if self.depth >= MAX_DEPTH {
            anyhow::bail!("Expression nested too deeply");
        }
        self.depth += 1;
        let value = self.unary();
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> anyhow::Result<f64> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('+') => {
                self.pos += 1;
                self.factor()
            }
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(')') {
                    anyhow::bail!("Missing closing parenthesis");
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => anyhow::bail!("Unexpected '{}' at position {}", c, self.pos),
            None => anyhow::bail!("Unexpected end of expression"),
        }
    }

    fn number(&mut self) -> anyhow::Result<f64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid number '{}'", literal))
    }
}
