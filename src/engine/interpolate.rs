//! Token interpolation for question text and solution steps.
//!
//! Templates embed `{name}` tokens; numeric values are formatted with the
//! template's default decimal count unless the token carries an explicit
//! override (`{name:3}`). The validator guarantees every token resolves, so
//! rendering never fails - an unknown token is left verbatim as a visible
//! authoring artifact rather than a panic.

use crate::domain::Value;
use crate::engine::Scope;

/// A `{name}` or `{name:decimals}` token found in a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef {
  pub name: String,
  pub decimals: Option<u8>,
}

/// Scan a template string for tokens.
pub fn collect_tokens(template: &str) -> Vec<TokenRef> {
  let mut tokens = Vec::new();
  let chars: Vec<char> = template.chars().collect();
  let mut i = 0;

  while i < chars.len() {
    if chars[i] == '{' {
      if let Some(close) = chars[i + 1..].iter().position(|&c| c == '}') {
        let body: String = chars[i + 1..i + 1 + close].iter().collect();
        if let Some(token) = parse_token(&body) {
          tokens.push(token);
        }
        i += close + 2;
        continue;
      }
    }
    i += 1;
  }

  tokens
}

/// Parse a token body: `name` or `name:decimals`.
fn parse_token(body: &str) -> Option<TokenRef> {
  let (name, decimals) = match body.split_once(':') {
    Some((name, suffix)) => (name.trim(), Some(suffix.trim().parse::<u8>().ok()?)),
    None => (body.trim(), None),
  };
  if name.is_empty() || !is_identifier(name) {
    return None;
  }
  Some(TokenRef { name: name.to_string(), decimals })
}

fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render a template string against a scope.
pub fn render(template: &str, scope: &Scope, default_decimals: u8) -> String {
  let mut result = String::with_capacity(template.len());
  let chars: Vec<char> = template.chars().collect();
  let mut i = 0;

  while i < chars.len() {
    if chars[i] == '{' {
      if let Some(close) = chars[i + 1..].iter().position(|&c| c == '}') {
        let body: String = chars[i + 1..i + 1 + close].iter().collect();
        if let Some(token) = parse_token(&body) {
          if let Some(value) = scope.get(&token.name) {
            let decimals = token.decimals.unwrap_or(default_decimals);
            result.push_str(&format_value(value, decimals));
            i += close + 2;
            continue;
          }
        }
        // Unknown token or malformed body: emit verbatim
        result.push('{');
        result.push_str(&body);
        result.push('}');
        i += close + 2;
        continue;
      }
    }
    result.push(chars[i]);
    i += 1;
  }

  result
}

/// Format a scope value for display.
pub fn format_value(value: &Value, decimals: u8) -> String {
  match value {
    Value::Text(s) => s.clone(),
    Value::Num(n) => format_number(*n, decimals),
  }
}

/// Round to `decimals` places and trim trailing fractional zeros, so 12.50
/// renders as "12.5" and 4.00 as "4".
pub fn format_number(value: f64, decimals: u8) -> String {
  let formatted = format!("{:.*}", decimals as usize, value);
  if !formatted.contains('.') {
    return formatted;
  }
  let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
  // "-0" after trimming means the value rounded to zero
  if trimmed == "-0" {
    return "0".to_string();
  }
  trimmed.to_string()
}
