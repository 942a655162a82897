//! RFC 6901 JSON Pointer parsing

use super::types::PatchError;

/// Parse a pointer into unescaped reference tokens
///
/// - `"" -> []` (whole document)
/// - `"/" -> [""]`
/// - `"/a~1b/~0k/0" -> ["a/b", "~k", "0"]`
pub fn parse(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(invalid(pointer));
    }
    pointer
        .split('/')
        .skip(1)
        .map(|token| unescape(token).ok_or_else(|| invalid(pointer)))
        .collect()
}

/// Format unescaped tokens back into a pointer
pub fn format(tokens: &[String]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&escape(token));
    }
    out
}

/// Escape one reference token (`~` -> `~0`, `/` -> `~1`)
pub fn escape(token: &str) -> String {
    if !token.contains(['/', '~']) {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape one reference token, `None` on a dangling or unknown `~` escape
fn unescape(token: &str) -> Option<String> {
    if !token.contains('~') {
        return Some(token.to_string());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

/// Parse a canonical array index token (`0`, `17`; never `01`, `+1`, `-`)
pub(crate) fn array_index(token: &str) -> Option<usize> {
    let canonical = token == "0"
        || (!token.is_empty()
            && !token.starts_with('0')
            && token.bytes().all(|b| b.is_ascii_digit()));
    if canonical {
        token.parse().ok()
    } else {
        None
    }
}

fn invalid(pointer: &str) -> PatchError {
    PatchError::InvalidPointer {
        pointer: pointer.to_string(),
    }
}
