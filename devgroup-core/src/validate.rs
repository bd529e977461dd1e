//! # Input Validation
//!
//! Parsers for connection parameters and command option values. All of them
//! double as clap value parsers.

use std::net::IpAddr;

use serde_json::Value;

use crate::error::UsageError;

/// Required token length (hex-encoded 16-byte key)
pub const TOKEN_LENGTH: usize = 32;

/// Validate a device address. Accepts IPv4 and IPv6.
pub fn parse_address(value: &str) -> Result<String, UsageError> {
    value
        .parse::<IpAddr>()
        .map(|_| value.to_string())
        .map_err(|e| UsageError::InvalidAddress {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Validate a device token
pub fn parse_token(value: &str) -> Result<String, UsageError> {
    let actual = value.chars().count();
    if actual != TOKEN_LENGTH {
        return Err(UsageError::InvalidToken {
            expected: TOKEN_LENGTH,
            actual,
        });
    }
    Ok(value.to_string())
}

/// Parse a literal value: JSON, or the capitalized spellings `True`, `False`,
/// `None`, single-quoted strings, tuples, trailing commas and `0x`/`0o`/`0b`
/// integers.
pub fn parse_literal(value: &str) -> Result<Value, UsageError> {
    if let Ok(parsed) = serde_json::from_str(value) {
        return Ok(parsed);
    }

    let normalized =
        normalize_literal(value).ok_or_else(|| UsageError::MalformedLiteral(value.to_string()))?;
    serde_json::from_str(&normalized).map_err(|_| UsageError::MalformedLiteral(value.to_string()))
}

fn normalize_literal(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.trim().chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                loop {
                    match chars.next()? {
                        '\\' => s.push(chars.next()?),
                        ch if ch == quote => break,
                        ch => s.push(ch),
                    }
                }
                out.push_str(&serde_json::to_string(&s).ok()?);
            }
            '(' => out.push('['),
            ')' => out.push(']'),
            // Trailing comma before a closing bracket, as in `(1,)` or `[1, 2,]`
            ',' if matches!(
                chars.clone().find(|ch| !ch.is_whitespace()),
                Some(']' | '}' | ')')
            ) => {}
            c if c.is_ascii_digit() => {
                let mut token = c.to_string();
                while let Some(&next) = chars.peek() {
                    let exponent_sign = (next == '+' || next == '-')
                        && token.ends_with(|ch: char| ch == 'e' || ch == 'E')
                        && !token.starts_with("0x")
                        && !token.starts_with("0X");
                    let in_number = next.is_ascii_alphanumeric() || next == '_' || next == '.';
                    if !in_number && !exponent_sign {
                        break;
                    }
                    token.push(next);
                    chars.next();
                }
                out.push_str(&normalize_number(&token)?);
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = c.to_string();
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_alphanumeric() && next != '_' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                match word.as_str() {
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    "None" => out.push_str("null"),
                    _ => return None,
                }
            }
            c => out.push(c),
        }
    }

    Some(out)
}

/// Rewrite `0x`, `0o` and `0b` integers in decimal. Digit separators are dropped.
fn normalize_number(token: &str) -> Option<String> {
    let token = token.replace('_', "");
    let radix = match token.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0o" | "0O") => 8,
        Some("0b" | "0B") => 2,
        _ => return Some(token),
    };
    i64::from_str_radix(&token[2..], radix)
        .ok()
        .map(|n| n.to_string())
}

/// Match `value` case-insensitively against `choices`, returning the canonical spelling
pub fn parse_choice(value: &str, choices: &[&str]) -> Result<String, UsageError> {
    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(value))
        .map(|choice| choice.to_string())
        .ok_or_else(|| {
            let mut sorted: Vec<String> = choices.iter().map(|c| c.to_lowercase()).collect();
            sorted.sort();
            sorted.dedup();
            UsageError::InvalidChoice {
                value: value.to_string(),
                choices: sorted,
            }
        })
}
