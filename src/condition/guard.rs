//! Conservative client-side screening of manual condition expressions.
//!
//! The server is the authority on whether an expression evaluates; this guard
//! only rejects text that could never be embedded safely as a boolean
//! sub-expression (unbalanced brackets, unterminated strings, statements,
//! calls outside the evaluator's helper set).

use serde::{Deserialize, Serialize};

use crate::error::ExpressionError;

/// Helper functions the expression evaluator exposes. Any other call target
/// is rejected.
pub const ALLOWED_CALLS: [&str; 19] = [
    "field",
    "contains",
    "startswith",
    "endswith",
    "lower",
    "upper",
    "empty",
    "len",
    "int",
    "float",
    "str",
    "bool",
    "abs",
    "any",
    "all",
    "min",
    "max",
    "round",
    "not",
];

const FORBIDDEN_KEYWORDS: [&str; 16] = [
    "import",
    "lambda",
    "exec",
    "eval",
    "open",
    "compile",
    "input",
    "getattr",
    "setattr",
    "delattr",
    "globals",
    "locals",
    "vars",
    "dir",
    "type",
    "object",
];

/// Screens an expression for local embedding safety.
pub fn check_expression(expression: &str) -> Result<(), ExpressionError> {
    let text = expression.trim();
    if text.is_empty() {
        return Err(ExpressionError::Empty);
    }
    scan_structure(text)?;
    scan_tokens(text)?;
    scan_identifiers(text)?;
    Ok(())
}

/// Balanced-bracket and string-literal scan.
fn scan_structure(text: &str) -> Result<(), ExpressionError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut chars = text.char_indices();
    while let Some((position, ch)) = chars.next() {
        match ch {
            '\'' | '"' => {
                let mut terminated = false;
                while let Some((_, inner)) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == ch {
                        terminated = true;
                        break;
                    }
                }
                if !terminated {
                    return Err(ExpressionError::UnterminatedString);
                }
            }
            '(' | '[' | '{' => stack.push((ch, position)),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(ExpressionError::UnbalancedBracket {
                            bracket: ch,
                            position,
                        });
                    }
                }
            }
            _ => {}
        }
    }
    if let Some((bracket, position)) = stack.pop() {
        return Err(ExpressionError::UnbalancedBracket { bracket, position });
    }
    Ok(())
}

/// Rejects statement separators and lone `=` (assignment) outside string
/// literals, while admitting `==`, `!=`, `<=`, `>=`.
fn scan_tokens(text: &str) -> Result<(), ExpressionError> {
    let bytes = text.as_bytes();
    let mut in_string: Option<u8> = None;
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        if let Some(quote) = in_string {
            if byte == b'\\' {
                index += 1;
            } else if byte == quote {
                in_string = None;
            }
        } else if byte == b'\'' || byte == b'"' {
            in_string = Some(byte);
        } else if byte == b';' {
            return Err(ExpressionError::ForbiddenToken(";".to_string()));
        } else if byte == b'=' {
            let prev = index.checked_sub(1).map(|i| bytes[i]);
            let next = bytes.get(index + 1).copied();
            let comparison = next == Some(b'=')
                || matches!(prev, Some(b'=') | Some(b'!') | Some(b'<') | Some(b'>'));
            if !comparison {
                return Err(ExpressionError::ForbiddenToken("=".to_string()));
            }
        }
        index += 1;
    }
    Ok(())
}

/// Checks identifiers outside string literals. Forbidden keywords are
/// rejected everywhere; identifiers immediately followed by `(` must be in
/// the evaluator's helper set. Bare identifiers are form field names and
/// pass.
fn scan_identifiers(text: &str) -> Result<(), ExpressionError> {
    let chars: Vec<char> = text.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        if ch == '\'' || ch == '"' {
            index += 1;
            while index < chars.len() {
                if chars[index] == '\\' {
                    index += 1;
                } else if chars[index] == ch {
                    break;
                }
                index += 1;
            }
            index += 1;
            continue;
        }
        if ch.is_alphabetic() || ch == '_' {
            let start = index;
            while index < chars.len() && (chars[index].is_alphanumeric() || chars[index] == '_') {
                index += 1;
            }
            let word: String = chars[start..index].iter().collect();
            if word.contains("__") {
                return Err(ExpressionError::ForbiddenToken("__".to_string()));
            }
            if FORBIDDEN_KEYWORDS.contains(&word.as_str()) {
                return Err(ExpressionError::ForbiddenToken(word));
            }
            let mut ahead = index;
            while ahead < chars.len() && chars[ahead].is_whitespace() {
                ahead += 1;
            }
            if chars.get(ahead) == Some(&'(') && !ALLOWED_CALLS.contains(&word.as_str()) {
                return Err(ExpressionError::ForbiddenCall(word));
            }
            continue;
        }
        index += 1;
    }
    Ok(())
}

/// Wire shape of the server's expression validation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExpressionValidation {
    /// Runs the local guard and maps its outcome to the wire shape.
    pub fn from_local_check(expression: &str) -> Self {
        match check_expression(expression) {
            Ok(()) => Self {
                valid: true,
                result: None,
                message: None,
            },
            Err(error) => Self {
                valid: false,
                result: None,
                message: Some(error.to_string()),
            },
        }
    }
}
