//! `${key}` substitution for one template line.

use crate::vars::VarMap;

/// Upper bound on substitutions in a single line.
const MAX_SUBSTITUTIONS: usize = 1000;

/// Byte range of the right-most `${key}` with a non-empty key.
fn rightmost_placeholder(line: &str) -> Option<(usize, usize)> {
    let mut search_end = line.len();
    while let Some(start) = line[..search_end].rfind("${") {
        if let Some(close) = line[start + 2..].find('}') {
            if close > 0 {
                return Some((start, start + 2 + close + 1));
            }
        }
        search_end = start;
    }
    None
}

/// Replace placeholders right to left until none remain.
///
/// Values may contain placeholders themselves; those are expanded on a
/// later pass. Unknown keys render as empty text.
pub fn fill_line(line: &str, vars: &VarMap) -> String {
    let mut text = line.to_string();
    for _ in 0..MAX_SUBSTITUTIONS {
        let Some((start, end)) = rightmost_placeholder(&text) else {
            return text;
        };
        let key = &text[start + 2..end - 1];
        let value = match vars.get(key) {
            Some(value) => value.to_string(),
            None => {
                tracing::error!(key = %key, "No value for template variable");
                String::new()
            }
        };
        text.replace_range(start..end, &value);
    }
    tracing::error!(line = %line, "Template line still has placeholders after {MAX_SUBSTITUTIONS} substitutions");
    text
}
