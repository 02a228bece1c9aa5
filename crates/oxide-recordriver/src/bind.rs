//! Placeholder expansion.
//!
//! [`expand`] substitutes bound arguments into SQL as literals so the
//! recorded text is what a client library would send with client-side
//! interpolation. `?`, `$n` and `@pN` placeholders are recognized outside of
//! quoted strings and identifiers.

use std::iter::Peekable;
use std::str::Chars;

use oxide_orm::{OrmError, Result, Value};

/// Renders a value as an SQL literal.
#[must_use]
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Bytes(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2 + 3);
            hex.push_str("X'");
            for byte in bytes {
                hex.push_str(&format!("{byte:02X}"));
            }
            hex.push('\'');
            hex
        }
    }
}

/// Replaces the placeholders in `sql` with the literal form of `args`.
///
/// Statements without arguments are returned unchanged.
///
/// # Errors
///
/// Returns [`OrmError::Driver`] if a placeholder refers to an argument that
/// was not supplied.
pub fn expand(sql: &str, args: &[Value]) -> Result<String> {
    if args.is_empty() {
        return Ok(sql.to_string());
    }

    let arg = |n: usize| {
        n.checked_sub(1)
            .and_then(|i| args.get(i))
            .map(literal)
            .ok_or_else(|| {
                OrmError::Driver(format!("missing argument {n} for statement: {sql}"))
            })
    };

    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut next_question = 0;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '?' => {
                next_question += 1;
                out.push_str(&arg(next_question)?);
            }
            '$' | '@' => {
                if let Some(n) = placeholder_number(c, &mut chars)? {
                    out.push_str(&arg(n)?);
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Reads the argument number of a `$n` or `@pN` placeholder whose `marker`
/// was just consumed, and consumes the rest of it. `None` means the marker
/// starts no placeholder and nothing was consumed.
fn placeholder_number(marker: char, chars: &mut Peekable<Chars<'_>>) -> Result<Option<usize>> {
    let mut lookahead = chars.clone();
    if marker == '@' && !matches!(lookahead.next(), Some('p' | 'P')) {
        return Ok(None);
    }
    let digits: String = lookahead.take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(None);
    }
    let n = digits
        .parse()
        .map_err(|_| OrmError::Driver(format!("bad placeholder {marker}{digits}")))?;
    let skip = digits.len() + usize::from(marker == '@');
    for _ in 0..skip {
        chars.next();
    }
    Ok(Some(n))
}
