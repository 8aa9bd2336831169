use crate::keywords::is_reserved_keyword;
use crate::scan::matching_close;

/// An identifier used in an expression, with the selects written after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRef {
    pub name: String,
    /// Contents of each `[...]` following the name, outermost first.
    pub selects: Vec<String>,
    /// `b.c` for `a.b.c`.
    pub member: Option<String>,
    /// Found inside another reference's select, so only ever read.
    pub nested: bool,
}

/// Every candidate signal name in `text`. Numbers, based literals, system
/// names, macros, package-qualified names, calls, casts, `.port` names and
/// escaped identifiers are skipped.
pub fn signal_references(text: &str) -> Vec<SignalRef> {
    let mut refs = Vec::new();
    collect(text, false, &mut refs);
    refs
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

fn skip_while(bytes: &[u8], mut index: usize, keep: impl Fn(u8) -> bool) -> usize {
    while index < bytes.len() && keep(bytes[index]) {
        index += 1;
    }
    index
}

fn collect(text: &str, nested: bool, refs: &mut Vec<SignalRef>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'"' => {
                i = text[i + 1..].find('"').map_or(bytes.len(), |end| i + end + 2);
            }
            b'0'..=b'9' => {
                i = skip_while(bytes, i, |b| b.is_ascii_digit() || b == b'_');
                if bytes.get(i) == Some(&b'\'') {
                    i = skip_while(bytes, i + 1, |b| b.is_ascii_alphanumeric() || b == b'_' || b == b'?');
                }
            }
            b'\'' => {
                i = skip_while(bytes, i + 1, |b| b.is_ascii_alphanumeric() || b == b'_' || b == b'?');
            }
            b'$' | b'`' => {
                i = skip_while(bytes, i + 1, is_ident_char);
            }
            b'\\' => {
                i = skip_while(bytes, i + 1, |b| !b.is_ascii_whitespace());
            }
            b'.' => {
                // `.port(` connections and `.*`
                i = skip_while(bytes, i + 1, |b| b.is_ascii_whitespace());
                i = skip_while(bytes, i, is_ident_char);
            }
            _ if is_ident_start(c) => {
                let start = i;
                i = skip_while(bytes, i, is_ident_char);
                let name = &text[start..i];

                if text[i..].starts_with("::") {
                    // pkg::NAME, possibly longer
                    while text[i..].starts_with("::") {
                        i = skip_while(bytes, i + 2, is_ident_char);
                    }
                    continue;
                }
                let after_space = skip_while(bytes, i, |b| b == b' ');
                if matches!(bytes.get(after_space), Some(b'(') | Some(b'\'')) {
                    // call or cast
                    i = after_space;
                    if bytes[i] == b'\'' {
                        i += 1;
                    }
                    continue;
                }
                if is_reserved_keyword(name) {
                    continue;
                }

                let mut selects = Vec::new();
                let mut members: Vec<&str> = Vec::new();
                loop {
                    let next = skip_while(bytes, i, |b| b == b' ');
                    match bytes.get(next) {
                        Some(b'[') => match matching_close(text, next) {
                            Some(close) => {
                                let inner = &text[next + 1..close];
                                collect(inner, true, refs);
                                selects.push(inner.trim().to_string());
                                i = close + 1;
                            }
                            None => {
                                i = bytes.len();
                                break;
                            }
                        },
                        Some(b'.')
                            if bytes.get(next + 1).map_or(false, |b| is_ident_start(*b)) =>
                        {
                            let member_start = next + 1;
                            i = skip_while(bytes, member_start, is_ident_char);
                            members.push(&text[member_start..i]);
                        }
                        _ => break,
                    }
                }

                refs.push(SignalRef {
                    name: name.to_string(),
                    selects,
                    member: (!members.is_empty()).then(|| members.join(".")),
                    nested,
                });
            }
            _ => i += 1,
        }
    }
}
