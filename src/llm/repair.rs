//! Best-effort repair of near-valid JSON emitted by the town generator
//!
//! Generators produce JSON the way people write it in chat: with comments,
//! single quotes, trailing commas, raw newlines inside strings, and the
//! occasional response cut off mid-object. `sanitize` fixes the lexical
//! problems in one linear pass; `attempt_repair` recovers truncated
//! documents by closing them at the last complete object.
//!
//! Both work on an explicit state machine rather than pattern rewriting so
//! that hostile input cannot trigger backtracking blowups.

use crate::town::schema::TownDocument;

/// Upper bound on truncation points tried by `attempt_repair`
pub const MAX_REPAIR_ATTEMPTS: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Double,
    Single,
}

/// A string literal the scanner is currently inside
#[derive(Debug)]
struct OpenString {
    quote: Quote,
    /// First unescaped `}`/`]` seen inside: (output length, raw index).
    /// An unterminated string is closed there and scanning resumes as
    /// structure.
    first_closer: Option<(usize, usize)>,
}

/// Fix lexical damage in generator JSON. Total and idempotent.
///
/// Outside strings: comments are dropped, single-quoted strings become
/// double-quoted, and commas directly before `}`/`]` are removed. Inside
/// strings: control characters are escaped and invalid escapes are made
/// literal. An unterminated string is closed before the first `}`/`]` it
/// swallowed, or at the end of the text.
pub fn sanitize(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut open: Option<OpenString> = None;
    let mut i = 0;

    loop {
        if i >= chars.len() {
            match open.take() {
                None => break,
                Some(OpenString {
                    first_closer: Some((out_at, raw_at)),
                    ..
                }) => {
                    out.truncate(out_at);
                    out.push('"');
                    i = raw_at;
                    continue;
                }
                Some(_) => {
                    out.push('"');
                    break;
                }
            }
        }

        i = match open.as_mut() {
            None => scan_structure(&chars, i, &mut out, &mut open),
            Some(string) => {
                let (next, closed) = scan_string(&chars, i, &mut out, string);
                if closed {
                    open = None;
                }
                next
            }
        };
    }

    out
}

/// Handle one token outside any string; returns the next raw index
fn scan_structure(
    chars: &[char],
    i: usize,
    out: &mut String,
    open: &mut Option<OpenString>,
) -> usize {
    let c = chars[i];
    match c {
        '"' => {
            out.push('"');
            *open = Some(OpenString {
                quote: Quote::Double,
                first_closer: None,
            });
            i + 1
        }
        '\'' if opens_single_quote(out) => {
            out.push('"');
            *open = Some(OpenString {
                quote: Quote::Single,
                first_closer: None,
            });
            i + 1
        }
        '/' if chars.get(i + 1) == Some(&'/') || chars.get(i + 1) == Some(&'*') => {
            skip_comment(chars, i)
        }
        ',' => {
            if !matches!(next_significant(chars, i + 1), Some('}') | Some(']')) {
                out.push(',');
            }
            i + 1
        }
        _ => {
            out.push(c);
            i + 1
        }
    }
}

/// Handle one character (or escape sequence) inside a string.
/// Returns the next raw index and whether the string closed.
fn scan_string(chars: &[char], i: usize, out: &mut String, string: &mut OpenString) -> (usize, bool) {
    let c = chars[i];
    match c {
        '\\' => (copy_escape(chars, i, out), false),
        '"' if string.quote == Quote::Double => {
            out.push('"');
            (i + 1, true)
        }
        '"' => {
            out.push_str("\\\"");
            (i + 1, false)
        }
        '\'' if string.quote == Quote::Single && closes_single_quote(chars.get(i + 1)) => {
            out.push('"');
            (i + 1, true)
        }
        '}' | ']' => {
            if string.first_closer.is_none() {
                string.first_closer = Some((out.len(), i));
            }
            out.push(c);
            (i + 1, false)
        }
        '\n' => {
            out.push_str("\\n");
            (i + 1, false)
        }
        '\r' => {
            out.push_str("\\r");
            (i + 1, false)
        }
        '\t' => {
            out.push_str("\\t");
            (i + 1, false)
        }
        c if (c as u32) < 0x20 => {
            out.push_str(&format!("\\u{:04x}", c as u32));
            (i + 1, false)
        }
        _ => {
            out.push(c);
            (i + 1, false)
        }
    }
}

/// Copy a backslash escape starting at `i`. Valid JSON escapes pass
/// through, `\'` loses its backslash, anything else becomes a literal
/// backslash and the following character is scanned on its own.
fn copy_escape(chars: &[char], i: usize, out: &mut String) -> usize {
    match chars.get(i + 1) {
        Some(&n) if matches!(n, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
            out.push('\\');
            out.push(n);
            i + 2
        }
        Some('u') if is_hex4(chars, i + 2) => {
            out.push_str("\\u");
            out.extend(&chars[i + 2..i + 6]);
            i + 6
        }
        Some('\'') => {
            out.push('\'');
            i + 2
        }
        _ => {
            out.push_str("\\\\");
            i + 1
        }
    }
}

fn is_hex4(chars: &[char], start: usize) -> bool {
    chars
        .get(start..start + 4)
        .is_some_and(|digits| digits.iter().all(|d| d.is_ascii_hexdigit()))
}

fn opens_single_quote(out: &str) -> bool {
    single_quote_opens_after(out.chars().next_back())
}

/// A single quote opens a string only in value/key position, judged by
/// the last structural character before it
pub(crate) fn single_quote_opens_after(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(prev) => prev.is_whitespace() || matches!(prev, ':' | ',' | '[' | '{'),
    }
}

/// A single quote ends a string only when structure follows it
pub(crate) fn closes_single_quote(next: Option<&char>) -> bool {
    match next {
        None => true,
        Some(&n) => n.is_whitespace() || matches!(n, ',' | ':' | ']' | '}' | '/'),
    }
}

/// Skip a `//` or `/*` comment starting at `i`; returns the index after it.
/// Line comments leave their newline in place.
pub(crate) fn skip_comment(chars: &[char], i: usize) -> usize {
    let mut j = i + 2;
    if chars.get(i + 1) == Some(&'/') {
        while j < chars.len() && chars[j] != '\n' {
            j += 1;
        }
        return j;
    }
    while j < chars.len() {
        if chars[j] == '*' && chars.get(j + 1) == Some(&'/') {
            return j + 2;
        }
        j += 1;
    }
    chars.len()
}

/// Next character that is not whitespace, a comma, or inside a comment
fn next_significant(chars: &[char], mut j: usize) -> Option<char> {
    while j < chars.len() {
        let c = chars[j];
        if c.is_whitespace() || c == ',' {
            j += 1;
        } else if c == '/' && matches!(chars.get(j + 1), Some('/') | Some('*')) {
            j = skip_comment(chars, j);
        } else {
            return Some(c);
        }
    }
    None
}

/// Recover a truncated or structurally broken document.
///
/// Walks backward over every `}` outside a string, cuts the text there,
/// closes whatever brackets are still open, and keeps the first candidate
/// that deserializes into a named `TownDocument`. Returns the repaired
/// JSON text, or `None` if no cut point yields a usable document.
pub fn attempt_repair(text: &str) -> Option<String> {
    let cleaned = sanitize(text);

    for (cut, unclosed) in closing_braces(&cleaned)
        .into_iter()
        .rev()
        .take(MAX_REPAIR_ATTEMPTS)
    {
        let mut candidate = String::with_capacity(cut + 1 + unclosed.len());
        candidate.push_str(&cleaned[..=cut]);
        candidate.extend(unclosed.iter().rev());
        let candidate = sanitize(&candidate);

        match serde_json::from_str::<TownDocument>(&candidate) {
            Ok(doc) if !doc.name.trim().is_empty() => {
                tracing::debug!(
                    "Repaired truncated document '{}' by cutting {} trailing bytes",
                    doc.name,
                    cleaned.len() - cut - 1
                );
                return Some(candidate);
            }
            _ => continue,
        }
    }

    None
}

/// Byte offsets of every `}` outside a string, each paired with the
/// closers still owed at that point (innermost last)
fn closing_braces(text: &str) -> Vec<(usize, Vec<char>)> {
    let mut owed: Vec<char> = Vec::new();
    let mut cuts = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (pos, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => owed.push('}'),
            '[' => owed.push(']'),
            '}' | ']' => {
                owed.pop();
                if c == '}' {
                    cuts.push((pos, owed.clone()));
                }
            }
            _ => {}
        }
    }

    cuts
}
