//! Restricted arithmetic expression evaluator.
//!
//! Template formulas are untrusted admin input, so they are parsed into a
//! small AST and interpreted - never handed to anything that can execute
//! host code. Supported: `+ - * / ^`, parentheses, unary minus, comparison
//! operators (yielding 1 or 0), numeric literals, variable references, the
//! constants `pi` and `e`, and a closed whitelist of math functions.
//!
//! Parsing is separate from evaluation so the validator can check a formula
//! is well-formed and collect its referenced names without a scope.

use std::collections::BTreeSet;

use crate::domain::Value;
use crate::engine::Scope;

/// Whitelisted functions with their arity. Anything else fails to parse.
static FUNCTIONS: &[(&str, usize)] = &[
  ("abs", 1),
  ("sqrt", 1),
  ("cbrt", 1),
  ("sin", 1),
  ("cos", 1),
  ("tan", 1),
  ("asin", 1),
  ("acos", 1),
  ("atan", 1),
  ("atan2", 2),
  ("ln", 1),
  ("log10", 1),
  ("exp", 1),
  ("pow", 2),
  ("min", 2),
  ("max", 2),
  ("floor", 1),
  ("ceil", 1),
  ("round", 1),
];

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
  Syntax(String),
  UnknownFunction(String),
  WrongArity { function: String, expected: usize, got: usize },
  UnknownName(String),
  NotNumeric(String),
}

impl std::fmt::Display for EvalError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Syntax(msg) => write!(f, "Syntax error: {}", msg),
      Self::UnknownFunction(name) => write!(f, "Unknown function: {}", name),
      Self::WrongArity { function, expected, got } => {
        write!(f, "Function {} takes {} argument(s), got {}", function, expected, got)
      }
      Self::UnknownName(name) => write!(f, "Unknown name: {}", name),
      Self::NotNumeric(name) => write!(f, "Variable '{}' is not numeric", name),
    }
  }
}

impl std::error::Error for EvalError {}

// ============================================================================
// Tokenizer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
  Num(f64),
  Ident(String),
  Plus,
  Minus,
  Star,
  Slash,
  Caret,
  LParen,
  RParen,
  Comma,
  Lt,
  Le,
  Gt,
  Ge,
  EqEq,
  NotEq,
}

fn tokenize(src: &str) -> Result<Vec<Token>, EvalError> {
  let mut tokens = Vec::new();
  let chars: Vec<char> = src.chars().collect();
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    match c {
      ' ' | '\t' | '\n' | '\r' => i += 1,
      '+' => {
        tokens.push(Token::Plus);
        i += 1;
      }
      '-' => {
        tokens.push(Token::Minus);
        i += 1;
      }
      '*' => {
        tokens.push(Token::Star);
        i += 1;
      }
      '/' => {
        tokens.push(Token::Slash);
        i += 1;
      }
      '^' => {
        tokens.push(Token::Caret);
        i += 1;
      }
      '(' => {
        tokens.push(Token::LParen);
        i += 1;
      }
      ')' => {
        tokens.push(Token::RParen);
        i += 1;
      }
      ',' => {
        tokens.push(Token::Comma);
        i += 1;
      }
      '<' => {
        if chars.get(i + 1) == Some(&'=') {
          tokens.push(Token::Le);
          i += 2;
        } else {
          tokens.push(Token::Lt);
          i += 1;
        }
      }
      '>' => {
        if chars.get(i + 1) == Some(&'=') {
          tokens.push(Token::Ge);
          i += 2;
        } else {
          tokens.push(Token::Gt);
          i += 1;
        }
      }
      '=' => {
        if chars.get(i + 1) == Some(&'=') {
          tokens.push(Token::EqEq);
          i += 2;
        } else {
          return Err(EvalError::Syntax("single '=' is not an operator".to_string()));
        }
      }
      '!' => {
        if chars.get(i + 1) == Some(&'=') {
          tokens.push(Token::NotEq);
          i += 2;
        } else {
          return Err(EvalError::Syntax("unexpected '!'".to_string()));
        }
      }
      '0'..='9' | '.' => {
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
          i += 1;
        }
        let text: String = chars[start..i].iter().collect();
        let value = text
          .parse::<f64>()
          .map_err(|_| EvalError::Syntax(format!("bad number literal '{}'", text)))?;
        tokens.push(Token::Num(value));
      }
      c if c.is_ascii_alphabetic() || c == '_' => {
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
          i += 1;
        }
        tokens.push(Token::Ident(chars[start..i].iter().collect()));
      }
      other => {
        return Err(EvalError::Syntax(format!("unexpected character '{}'", other)));
      }
    }
  }

  Ok(tokens)
}

// ============================================================================
// Parser (recursive descent)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Pow,
  Lt,
  Le,
  Gt,
  Ge,
  Eq,
  Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Num(f64),
  Var(String),
  Neg(Box<Expr>),
  Binary(BinOp, Box<Expr>, Box<Expr>),
  Call(String, Vec<Expr>),
}

struct Parser {
  tokens: Vec<Token>,
  pos: usize,
}

impl Parser {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn advance(&mut self) -> Option<Token> {
    let t = self.tokens.get(self.pos).cloned();
    if t.is_some() {
      self.pos += 1;
    }
    t
  }

  fn expect(&mut self, expected: Token) -> Result<(), EvalError> {
    match self.advance() {
      Some(t) if t == expected => Ok(()),
      Some(t) => Err(EvalError::Syntax(format!("expected {:?}, found {:?}", expected, t))),
      None => Err(EvalError::Syntax(format!("expected {:?}, found end of input", expected))),
    }
  }

  // comparison := additive (cmp additive)*
  fn comparison(&mut self) -> Result<Expr, EvalError> {
    let mut left = self.additive()?;
    loop {
      let op = match self.peek() {
        Some(Token::Lt) => BinOp::Lt,
        Some(Token::Le) => BinOp::Le,
        Some(Token::Gt) => BinOp::Gt,
        Some(Token::Ge) => BinOp::Ge,
        Some(Token::EqEq) => BinOp::Eq,
        Some(Token::NotEq) => BinOp::Ne,
        _ => break,
      };
      self.advance();
      let right = self.additive()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn additive(&mut self) -> Result<Expr, EvalError> {
    let mut left = self.multiplicative()?;
    loop {
      let op = match self.peek() {
        Some(Token::Plus) => BinOp::Add,
        Some(Token::Minus) => BinOp::Sub,
        _ => break,
      };
      self.advance();
      let right = self.multiplicative()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn multiplicative(&mut self) -> Result<Expr, EvalError> {
    let mut left = self.unary()?;
    loop {
      let op = match self.peek() {
        Some(Token::Star) => BinOp::Mul,
        Some(Token::Slash) => BinOp::Div,
        _ => break,
      };
      self.advance();
      let right = self.unary()?;
      left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  // Unary minus binds looser than '^': -2^2 is -(2^2)
  fn unary(&mut self) -> Result<Expr, EvalError> {
    if self.peek() == Some(&Token::Minus) {
      self.advance();
      let inner = self.unary()?;
      return Ok(Expr::Neg(Box::new(inner)));
    }
    self.power()
  }

  // power := primary ('^' unary)?  - right-associative
  fn power(&mut self) -> Result<Expr, EvalError> {
    let base = self.primary()?;
    if self.peek() == Some(&Token::Caret) {
      self.advance();
      let exponent = self.unary()?;
      return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
    }
    Ok(base)
  }

  fn primary(&mut self) -> Result<Expr, EvalError> {
    match self.advance() {
      Some(Token::Num(n)) => Ok(Expr::Num(n)),
      Some(Token::LParen) => {
        let inner = self.comparison()?;
        self.expect(Token::RParen)?;
        Ok(inner)
      }
      Some(Token::Ident(name)) => {
        if self.peek() == Some(&Token::LParen) {
          self.advance();
          let mut args = Vec::new();
          if self.peek() != Some(&Token::RParen) {
            loop {
              args.push(self.comparison()?);
              if self.peek() == Some(&Token::Comma) {
                self.advance();
              } else {
                break;
              }
            }
          }
          self.expect(Token::RParen)?;

          // Whitelist and arity are enforced at parse time so a bad
          // function is a validation error, not a generation-time surprise
          let expected = FUNCTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, arity)| *arity)
            .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
          if args.len() != expected {
            return Err(EvalError::WrongArity { function: name, expected, got: args.len() });
          }
          Ok(Expr::Call(name, args))
        } else {
          Ok(Expr::Var(name))
        }
      }
      Some(t) => Err(EvalError::Syntax(format!("unexpected token {:?}", t))),
      None => Err(EvalError::Syntax("unexpected end of input".to_string())),
    }
  }
}

/// Parse an expression string into an AST.
pub fn parse(src: &str) -> Result<Expr, EvalError> {
  let tokens = tokenize(src)?;
  if tokens.is_empty() {
    return Err(EvalError::Syntax("empty expression".to_string()));
  }
  let mut parser = Parser { tokens, pos: 0 };
  let expr = parser.comparison()?;
  if parser.pos != parser.tokens.len() {
    return Err(EvalError::Syntax(format!(
      "trailing input after expression (at token {})",
      parser.pos
    )));
  }
  Ok(expr)
}

/// Collect every variable name an expression references, excluding the
/// built-in constants.
pub fn referenced_names(expr: &Expr) -> BTreeSet<String> {
  let mut names = BTreeSet::new();
  collect_names(expr, &mut names);
  names
}

fn collect_names(expr: &Expr, out: &mut BTreeSet<String>) {
  match expr {
    Expr::Num(_) => {}
    Expr::Var(name) => {
      if name != "pi" && name != "e" {
        out.insert(name.clone());
      }
    }
    Expr::Neg(inner) => collect_names(inner, out),
    Expr::Binary(_, left, right) => {
      collect_names(left, out);
      collect_names(right, out);
    }
    Expr::Call(_, args) => {
      for arg in args {
        collect_names(arg, out);
      }
    }
  }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Expr {
  /// Evaluate against a scope. Division by zero yields infinity; callers
  /// treat non-finite results as a failed sample and retry.
  pub fn eval(&self, scope: &Scope) -> Result<f64, EvalError> {
    match self {
      Self::Num(n) => Ok(*n),
      Self::Var(name) => match scope.get(name) {
        Some(Value::Num(n)) => Ok(*n),
        Some(Value::Text(_)) => Err(EvalError::NotNumeric(name.clone())),
        None => match name.as_str() {
          "pi" => Ok(std::f64::consts::PI),
          "e" => Ok(std::f64::consts::E),
          _ => Err(EvalError::UnknownName(name.clone())),
        },
      },
      Self::Neg(inner) => Ok(-inner.eval(scope)?),
      Self::Binary(op, left, right) => {
        let l = left.eval(scope)?;
        let r = right.eval(scope)?;
        Ok(match op {
          BinOp::Add => l + r,
          BinOp::Sub => l - r,
          BinOp::Mul => l * r,
          BinOp::Div => l / r,
          BinOp::Pow => l.powf(r),
          BinOp::Lt => bool_num(l < r),
          BinOp::Le => bool_num(l <= r),
          BinOp::Gt => bool_num(l > r),
          BinOp::Ge => bool_num(l >= r),
          BinOp::Eq => bool_num(l == r),
          BinOp::Ne => bool_num(l != r),
        })
      }
      Self::Call(name, args) => {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
          values.push(arg.eval(scope)?);
        }
        Ok(apply_function(name, &values))
      }
    }
  }
}

fn bool_num(b: bool) -> f64 {
  if b { 1.0 } else { 0.0 }
}

fn apply_function(name: &str, args: &[f64]) -> f64 {
  match (name, args) {
    ("abs", [x]) => x.abs(),
    ("sqrt", [x]) => x.sqrt(),
    ("cbrt", [x]) => x.cbrt(),
    ("sin", [x]) => x.sin(),
    ("cos", [x]) => x.cos(),
    ("tan", [x]) => x.tan(),
    ("asin", [x]) => x.asin(),
    ("acos", [x]) => x.acos(),
    ("atan", [x]) => x.atan(),
    ("atan2", [y, x]) => y.atan2(*x),
    ("ln", [x]) => x.ln(),
    ("log10", [x]) => x.log10(),
    ("exp", [x]) => x.exp(),
    ("pow", [b, e]) => b.powf(*e),
    ("min", [a, b]) => a.min(*b),
    ("max", [a, b]) => a.max(*b),
    ("floor", [x]) => x.floor(),
    ("ceil", [x]) => x.ceil(),
    ("round", [x]) => x.round(),
    // Unreachable: whitelist and arity are checked at parse time
    _ => f64::NAN,
  }
}

/// Parse and evaluate in one step.
pub fn eval_formula(src: &str, scope: &Scope) -> Result<f64, EvalError> {
  parse(src)?.eval(scope)
}

/// Evaluate a constraint predicate: any non-zero finite result is true.
pub fn eval_predicate(src: &str, scope: &Scope) -> Result<bool, EvalError> {
  let value = eval_formula(src, scope)?;
  Ok(value.is_finite() && value != 0.0)
}
