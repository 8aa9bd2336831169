//! Turns raw source lines into comment-free logical statements.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::keywords::opens_unterminated_statement;
use crate::scan::{brackets_balanced, first_word, split_top_level};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TRANSLATE_PRAGMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:synopsys|pragma|synthesis|cadence)\s+translate_(off|on)\b").unwrap()
});
static ENDS_WITH_BEGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bbegin(\s*:\s*[A-Za-z_][\w$]*)?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// Line the statement started on.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct LineReconstructor {
    in_block_comment: bool,
    block_comment: String,
    translate_off: bool,
    pending: String,
    pending_line: usize,
    last_line: usize,
    directive: Option<(usize, String)>,
}

impl LineReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips comments and `translate_off` regions from one raw line. Comment
    /// state carries over between calls.
    pub fn clean(&mut self, raw: &str) -> String {
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::with_capacity(raw.len());
        let mut in_string = false;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if self.in_block_comment {
                if c == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    let comment = std::mem::take(&mut self.block_comment);
                    self.check_pragma(&comment);
                    out.push(' ');
                    i += 2;
                } else {
                    self.block_comment.push(c);
                    i += 1;
                }
                continue;
            }

            if in_string {
                if !self.translate_off {
                    out.push(c);
                }
                if c == '\\' {
                    if let Some(escaped) = next {
                        if !self.translate_off {
                            out.push(escaped);
                        }
                        i += 1;
                    }
                } else if c == '"' {
                    in_string = false;
                }
                i += 1;
                continue;
            }

            match (c, next) {
                ('/', Some('/')) => {
                    let comment: String = chars[i + 2..].iter().collect();
                    self.check_pragma(&comment);
                    break;
                }
                ('/', Some('*')) => {
                    self.in_block_comment = true;
                    i += 2;
                    continue;
                }
                ('"', _) => in_string = true,
                _ => {}
            }
            if !self.translate_off {
                out.push(c);
            }
            i += 1;
        }
        out
    }

    fn check_pragma(&mut self, comment: &str) {
        if let Some(caps) = TRANSLATE_PRAGMA.captures(comment) {
            self.translate_off = caps[1].eq_ignore_ascii_case("off");
        }
    }

    pub fn in_translate_off(&self) -> bool {
        self.translate_off
    }

    /// Whether the previous directive line ended in `\`.
    pub fn in_directive(&self) -> bool {
        self.directive.is_some()
    }

    /// Accumulates a backtick directive, following `\` continuations.
    pub fn push_directive(&mut self, line: usize, cleaned: &str) -> Option<LogicalLine> {
        let trimmed = cleaned.trim();
        let (start, mut text) = self
            .directive
            .take()
            .unwrap_or_else(|| (line, String::new()));
        if let Some(body) = trimmed.strip_suffix('\\') {
            text.push_str(body);
            text.push(' ');
            self.directive = Some((start, text));
            return None;
        }
        text.push_str(trimmed);
        Some(LogicalLine {
            line: start,
            text: collapse(&text),
        })
    }

    /// Adds a cleaned code line and returns every statement it completes.
    pub fn push(&mut self, line: usize, cleaned: &str) -> Vec<LogicalLine> {
        let trimmed = cleaned.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if self.pending.is_empty() {
            self.pending_line = line;
        } else {
            self.pending.push(' ');
        }
        self.pending.push_str(trimmed);
        self.last_line = line;

        // `;`-terminated statements are emitted even when the tail is still open
        let mut complete = Vec::new();
        let pending = std::mem::take(&mut self.pending);
        let pieces = split_top_level(&pending, ';');
        let (last, statements) = match pieces.split_last() {
            Some(split) => split,
            None => return complete,
        };
        for statement in statements {
            let text = collapse(statement);
            if !text.is_empty() {
                complete.push(LogicalLine {
                    line: self.pending_line,
                    text: format!("{};", text),
                });
            }
        }
        let rest = collapse(last);
        if !rest.is_empty() {
            if is_complete(&rest) {
                complete.push(LogicalLine {
                    line: self.pending_line,
                    text: rest,
                });
            } else {
                self.pending = rest;
            }
        }
        complete
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drops any unterminated statement, returning the line it was last
    /// extended on.
    pub fn finish(&mut self) -> Option<usize> {
        self.directive = None;
        if self.pending.trim().is_empty() {
            self.pending.clear();
            None
        } else {
            self.pending.clear();
            Some(self.last_line)
        }
    }
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Whether accumulated text forms a full statement.
pub fn is_complete(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || !brackets_balanced(text) {
        return false;
    }
    text.ends_with(';')
        || text.starts_with('&')
        || opens_unterminated_statement(first_word(text))
        || ENDS_WITH_BEGIN.is_match(text)
}
