//! Bracket-aware helpers shared by the classifier, the evaluator and the
//! signal extractor. All of them work on single-spaced statement text.

/// Index of the bracket closing the one at `open`, counting `()`, `[]` and `{}`
/// together.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (index, c) in text[open..].char_indices() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether every opened bracket has been closed. Surplus closing brackets count
/// as balanced so a stray `)` cannot swallow the rest of a file.
pub fn brackets_balanced(text: &str) -> bool {
    let mut depth = 0isize;
    let mut in_string = false;
    for c in text.chars() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

/// Splits on `separator` wherever it appears outside brackets and strings.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if c == separator && depth == 0 => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Position of a range colon at bracket depth zero. `::`, the `+:`/`-:`
/// part-select operators and the `:` of a ternary do not count.
pub fn find_range_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (index, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'?' if depth == 0 => return None,
            b':' if depth == 0 => {
                let prev = index.checked_sub(1).map(|i| bytes[i]);
                let next = bytes.get(index + 1).copied();
                if prev == Some(b':') || next == Some(b':') {
                    continue;
                }
                if matches!(prev, Some(b'+') | Some(b'-')) {
                    return None;
                }
                return Some(index);
            }
            _ => {}
        }
    }
    None
}

/// Splits `base+:width` / `base-:width`. The flag is true for `+:`.
pub fn split_part_select(text: &str) -> Option<(&str, &str, bool)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (index, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && index > 0 => {
                let ascending = match bytes[index - 1] {
                    b'+' => true,
                    b'-' => false,
                    _ => continue,
                };
                return Some((
                    text[..index - 1].trim(),
                    text[index + 1..].trim(),
                    ascending,
                ));
            }
            _ => {}
        }
    }
    None
}

/// Leading identifier (`[A-Za-z_][A-Za-z0-9_$]*`), empty if there is none.
pub fn first_word(text: &str) -> &str {
    let text = text.trim_start();
    let mut end = 0;
    for (index, c) in text.char_indices() {
        let ok = if index == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_' || c == '$'
        };
        if !ok {
            break;
        }
        end = index + c.len_utf8();
    }
    &text[..end]
}

pub fn is_identifier(text: &str) -> bool {
    !text.is_empty() && first_word(text) == text
}

/// Removes one pair of parentheses wrapping the whole text.
pub fn strip_outer_parens(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('(') && matching_close(trimmed, 0) == Some(trimmed.len() - 1) {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Consecutive `[...]` groups at the start of `text`, plus the remainder.
pub fn leading_dimensions(text: &str) -> (Vec<String>, &str) {
    let mut dims = Vec::new();
    let mut rest = text.trim_start();
    while rest.starts_with('[') {
        match matching_close(rest, 0) {
            Some(close) => {
                dims.push(rest[1..close].trim().to_string());
                rest = rest[close + 1..].trim_start();
            }
            None => break,
        }
    }
    (dims, rest)
}
