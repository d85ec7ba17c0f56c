//! General-expression grammar.
//!
//! A small recursive-descent parser and tree-walking evaluator for formula
//! bodies that are not a single built-in call. Precedence, lowest first:
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := eq ( "&&" eq )*
//! eq      := cmp ( ( "==" | "=" | "!=" | "<>" ) cmp )*
//! cmp     := add ( ( "<" | ">" | "<=" | ">=" ) add )*
//! add     := mul ( ( "+" | "-" ) mul )*
//! mul     := unary ( ( "*" | "/" ) unary )*
//! unary   := ( "-" | "+" | "!" ) unary | primary
//! primary := NUMBER | STRING | TRUE | FALSE | #ERR | REF | REF ":" REF
//!          | NAME "(" args ")" | NAME | "(" expr ")"
//! ```
//!
//! Cell references and function calls are resolved through a [`Resolver`],
//! so the grammar knows nothing about grids or the function table. Function
//! arguments are handed over as raw text, which lets handlers like `IF`
//! evaluate only the branch they select.

use super::cell_ref::CellRef;
use super::tokenize::{find_matching_paren, split_arguments};
use super::value::{CellError, Value};

/// Maximum nesting of parentheses and unary operators.
pub const MAX_DEPTH: usize = 64;

/// Host hooks the evaluator calls for names it cannot resolve itself.
pub trait Resolver {
    /// Value of a cell reference such as `B3`.
    /// `Err` is a lookup failure (bad or out-of-bounds reference, circular
    /// read) and becomes the expression's result unchanged.
    fn lookup(&self, reference: &str) -> Result<Value, CellError>;

    /// Invoke function `name` with raw argument texts.
    /// Unknown names must return `Err(CellError::Name)`.
    fn call(&self, name: &str, args: &[String]) -> Result<Value, CellError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

/// Parsed expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Error(CellError),
    Reference(String),
    Range(String, String),
    Call { name: String, args: Vec<String> },
    Name(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    ErrorLit(CellError),
    Colon,
    LParen,
    RParen,
    Comma,
    Op(&'static str),
}

/// Parse a formula body (without the leading `=`).
pub fn parse(source: &str) -> Result<Expr, CellError> {
    let mut parser = Parser {
        src: source,
        pos: 0,
        peeked: None,
        depth: 0,
    };
    let expr = parser.expression()?;
    match parser.next_token()? {
        None => Ok(expr),
        Some((token, at)) => {
            log::trace!("unexpected {:?} at byte {} in '{}'", token, at, source);
            Err(CellError::Error)
        }
    }
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    peeked: Option<(Token, usize)>,
    depth: usize,
}

impl<'s> Parser<'s> {
    fn expression(&mut self) -> Result<Expr, CellError> {
        self.descend()?;
        let expr = self.binary_level(0);
        self.depth -= 1;
        expr
    }

    fn descend(&mut self) -> Result<(), CellError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CellError::Error);
        }
        Ok(())
    }

    /// Operators accepted at each precedence level, lowest first.
    const LEVELS: [&'static [(&'static str, BinaryOp)]; 6] = [
        &[("||", BinaryOp::Or)],
        &[("&&", BinaryOp::And)],
        &[
            ("==", BinaryOp::Eq),
            ("=", BinaryOp::Eq),
            ("!=", BinaryOp::Ne),
            ("<>", BinaryOp::Ne),
        ],
        &[
            ("<", BinaryOp::Lt),
            (">", BinaryOp::Gt),
            ("<=", BinaryOp::Le),
            (">=", BinaryOp::Ge),
        ],
        &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
        &[("*", BinaryOp::Mul), ("/", BinaryOp::Div)],
    ];

    fn binary_level(&mut self, level: usize) -> Result<Expr, CellError> {
        if level == Self::LEVELS.len() {
            return self.unary();
        }
        let mut lhs = self.binary_level(level + 1)?;
        loop {
            let op = match self.peek()? {
                Some(Token::Op(symbol)) => Self::LEVELS[level]
                    .iter()
                    .find(|(s, _)| s == symbol)
                    .map(|(_, op)| *op),
                _ => None,
            };
            let Some(op) = op else {
                return Ok(lhs);
            };
            self.bump();
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, CellError> {
        let op = match self.peek()? {
            Some(Token::Op("-")) => UnaryOp::Neg,
            Some(Token::Op("+")) => UnaryOp::Plus,
            Some(Token::Op("!")) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.bump();
        self.descend()?;
        let operand = self.unary();
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand?)))
    }

    fn primary(&mut self) -> Result<Expr, CellError> {
        let Some((token, _)) = self.next_token()? else {
            return Err(CellError::Error);
        };
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Text(s)),
            Token::ErrorLit(e) => Ok(Expr::Error(e)),
            Token::LParen => {
                let inner = self.expression()?;
                match self.next_token()? {
                    Some((Token::RParen, _)) => Ok(inner),
                    _ => Err(CellError::Error),
                }
            }
            Token::Ident(name) => self.identifier(name),
            _ => Err(CellError::Error),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Expr, CellError> {
        let (is_call, is_range) = match self.peek()? {
            Some(Token::LParen) => (true, false),
            Some(Token::Colon) => (false, CellRef::is_reference(&name)),
            _ => (false, false),
        };

        if is_call {
            let Some((_, open)) = self.peeked.take() else {
                return Err(CellError::Error);
            };
            let close = find_matching_paren(self.src, open).ok_or(CellError::Error)?;
            let args = split_arguments(&self.src[open + 1..close]);
            self.pos = close + 1;
            return Ok(Expr::Call { name, args });
        }

        if is_range {
            self.bump();
            return match self.next_token()? {
                Some((Token::Ident(end), _)) if CellRef::is_reference(&end) => {
                    Ok(Expr::Range(name, end))
                }
                _ => Err(CellError::Error),
            };
        }

        if CellRef::is_reference(&name) {
            return Ok(Expr::Reference(name));
        }
        match name.to_ascii_uppercase().as_str() {
            "TRUE" => Ok(Expr::Bool(true)),
            "FALSE" => Ok(Expr::Bool(false)),
            _ => Ok(Expr::Name(name)),
        }
    }

    fn peek(&mut self) -> Result<Option<&Token>, CellError> {
        if self.peeked.is_none() {
            self.peeked = self.lex()?;
        }
        Ok(self.peeked.as_ref().map(|(token, _)| token))
    }

    fn bump(&mut self) {
        self.peeked = None;
    }

    fn next_token(&mut self) -> Result<Option<(Token, usize)>, CellError> {
        match self.peeked.take() {
            Some(peeked) => Ok(Some(peeked)),
            None => self.lex(),
        }
    }

    fn lex(&mut self) -> Result<Option<(Token, usize)>, CellError> {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(&b) = bytes.get(start) else {
            return Ok(None);
        };
        let rest = &self.src[start..];

        let token = match b {
            b'0'..=b'9' | b'.' => {
                let len = number_len(rest);
                let n = rest[..len].parse::<f64>().map_err(|_| CellError::Error)?;
                self.pos += len;
                Token::Number(n)
            }
            b'"' => {
                let (text, len) = string_literal(rest).ok_or(CellError::Error)?;
                self.pos += len;
                Token::Str(text)
            }
            b'#' => {
                let (err, len) = CellError::parse_prefix(rest).ok_or(CellError::Error)?;
                self.pos += len;
                Token::ErrorLit(err)
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let len = rest
                    .bytes()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == b'_')
                    .count();
                self.pos += len;
                Token::Ident(rest[..len].to_string())
            }
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b',' => self.single(Token::Comma),
            b':' => self.single(Token::Colon),
            _ => {
                let symbol = [
                    "||", "&&", "==", "!=", "<>", "<=", ">=", "<", ">", "=", "+", "-", "*", "/",
                    "!",
                ]
                .into_iter()
                .find(|op| rest.starts_with(op))
                .ok_or(CellError::Error)?;
                self.pos += symbol.len();
                Token::Op(symbol)
            }
        };
        Ok(Some((token, start)))
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }
}

/// Length of the numeric literal at the start of `text`: digits, an optional
/// fraction and an optional exponent.
fn number_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let mut len = digits(0);
    if bytes.get(len) == Some(&b'.') {
        len += 1 + digits(len + 1);
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            len = exp + exp_digits;
        }
    }
    len
}

/// Decode the string literal at the start of `text`, returning its contents
/// and the byte length consumed including both quotes.
fn string_literal(text: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut chars = text.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => out.push(chars.next()?.1),
            '"' => return Some((out, idx + 1)),
            _ => out.push(ch),
        }
    }
    None
}

/// Evaluate a parsed expression.
pub fn evaluate(expr: &Expr, resolver: &dyn Resolver) -> Result<Value, CellError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        // Error literals left behind by structure edits behave like failed lookups.
        Expr::Error(e) => Err(*e),
        Expr::Reference(name) => resolver.lookup(name),
        // A range only means something as a function argument.
        Expr::Range(..) => Err(CellError::Value),
        Expr::Call { name, args } => resolver.call(name, args),
        Expr::Name(_) => Err(CellError::Name),
        Expr::Unary(op, inner) => {
            let value = operand(evaluate(inner, resolver)?)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => Ok(Value::Number(-arithmetic_number(&value)?)),
                UnaryOp::Plus => Ok(Value::Number(arithmetic_number(&value)?)),
            }
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            if !operand(evaluate(lhs, resolver)?)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(operand(evaluate(rhs, resolver)?)?.is_truthy()))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            if operand(evaluate(lhs, resolver)?)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(operand(evaluate(rhs, resolver)?)?.is_truthy()))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = operand(evaluate(lhs, resolver)?)?;
            let rhs = operand(evaluate(rhs, resolver)?)?;
            apply_binary(*op, &lhs, &rhs)
        }
    }
}

/// Parse and evaluate `source` in one step.
pub fn eval_str(source: &str, resolver: &dyn Resolver) -> Result<Value, CellError> {
    evaluate(&parse(source)?, resolver)
}

/// Values carrying an error marker cannot take part in an operation.
fn operand(value: Value) -> Result<Value, CellError> {
    match value {
        Value::Error(_) => Err(CellError::Error),
        other => Ok(other),
    }
}

/// Numeric reading of an operand for arithmetic and comparison.
/// Empty counts as 0 and booleans as 1/0.
fn operand_number(value: &Value) -> Option<f64> {
    match value {
        Value::Empty => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_number(),
    }
}

fn arithmetic_number(value: &Value) -> Result<f64, CellError> {
    operand_number(value).ok_or(CellError::Value)
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, CellError> {
    let n = match op {
        BinaryOp::Add => match (operand_number(lhs), operand_number(rhs)) {
            (Some(a), Some(b)) => a + b,
            _ => return Ok(Value::Text(format!("{}{}", lhs, rhs))),
        },
        BinaryOp::Sub => arithmetic_number(lhs)? - arithmetic_number(rhs)?,
        BinaryOp::Mul => arithmetic_number(lhs)? * arithmetic_number(rhs)?,
        BinaryOp::Div => {
            let a = arithmetic_number(lhs)?;
            let b = arithmetic_number(rhs)?;
            if b == 0.0 {
                return Err(CellError::DivZero);
            }
            a / b
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            return Ok(Value::Bool(compare(op, lhs, rhs)));
        }
        BinaryOp::And => return Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Or => return Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
    };
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(CellError::Value)
    }
}

/// Numeric comparison when both sides read as numbers, text comparison otherwise.
fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
    let ordering = match (operand_number(lhs), operand_number(rhs)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => Some(lhs.to_string().cmp(&rhs.to_string())),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::Ne => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => false,
    }
}
