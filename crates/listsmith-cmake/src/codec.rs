//! Conversion between logical argument values and CMake argument syntax.
//!
//! All functions here are pure. `encode` and `decode` are inverses for
//! every value without raw newlines.

use crate::error::CodecError;
use crate::value::ValueMap;
use std::borrow::Cow;

/// Encode a logical value as a single CMake argument token.
///
/// Values that would be split, re-tokenized or dropped by CMake are
/// double-quoted, with `"` and `\` escaped. The empty string becomes `""`.
pub fn encode(value: &str) -> Cow<'_, str> {
    if !needs_quotes(value) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    Cow::Owned(out)
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '"' | '\\' | '(' | ')' | '#'))
}

/// Replace `${name}` occurrences with values from `values`.
///
/// Names missing from the map, a missing map, and an unterminated `${`
/// are all left verbatim. Substituted text is not scanned again.
pub fn resolve_placeholders<'a>(template: &'a str, values: Option<&ValueMap>) -> Cow<'a, str> {
    let Some(values) = values else {
        return Cow::Borrowed(template);
    };
    if !template.contains("${") {
        return Cow::Borrowed(template);
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = &after[..end];
        if name.contains(['$', '{']) {
            // nested reference: keep the outer opener and rescan the inside
            out.push_str("${");
            rest = after;
            continue;
        }

        match values.get(name) {
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Split argument text (the part between a command's parentheses) into
/// raw argument strings.
///
/// A `"` at the start of a token opens a quoted argument; inside it `\"`
/// and `\\` are unescaped and other escapes are kept as written. Unquoted
/// tokens are taken verbatim up to the next space, tab, CR or LF.
pub fn decode(text: &str) -> Result<Vec<String>, CodecError> {
    let mut args = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if is_separator(c) {
            chars.next();
            continue;
        }

        let mut arg = String::new();

        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.peek() {
                        Some(&(_, next @ ('"' | '\\'))) => {
                            arg.push(next);
                            chars.next();
                        }
                        _ => arg.push('\\'),
                    },
                    _ => arg.push(c),
                }
            }

            if !closed {
                return Err(CodecError::MalformedQuoting {
                    offset: start,
                    text: text[start..].to_string(),
                });
            }
        } else {
            while let Some(&(_, c)) = chars.peek() {
                if is_separator(c) {
                    break;
                }
                arg.push(c);
                chars.next();
            }
        }

        args.push(arg);
    }

    Ok(args)
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Whether `s` is a valid CMake command identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
