//! Rewrites `for` loop variables to the range the loop covers so that indexed
//! references inside the loop body widen the indexed signals.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::eval::{evaluate, Bound, SymbolResolver};
use crate::scan::{first_word, split_top_level};

static CONDITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z_][\w$]*)\s*(<=|>=|<|>|!=)\s*(.+?)\s*$").unwrap());
static BEGIN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bbegin\b").unwrap());
static END_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bend\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForHeader {
    pub variable: String,
    pub start: String,
    pub comparator: Comparator,
    pub limit: String,
    /// Step magnitude as written, `1` for `++`/`--`.
    pub step: String,
    pub decreasing: bool,
}

/// Parses `init; condition; step`.
pub fn parse_for_header(header: &str) -> Option<ForHeader> {
    let parts = split_top_level(header, ';');
    let [init, condition, step] = parts.as_slice() else {
        return None;
    };

    let mut init = init.trim();
    for prefix in ["genvar", "int", "integer", "automatic", "unsigned"] {
        if first_word(init) == prefix {
            init = init[prefix.len()..].trim_start();
        }
    }
    let (variable, start) = init.split_once('=')?;
    let variable = variable.trim();
    if variable.is_empty() {
        return None;
    }

    let caps = CONDITION.captures(condition)?;
    if &caps[1] != variable {
        return None;
    }
    let comparator = match &caps[2] {
        "<" => Comparator::Less,
        "<=" => Comparator::LessEqual,
        ">" => Comparator::Greater,
        ">=" => Comparator::GreaterEqual,
        _ => Comparator::NotEqual,
    };

    let (step, decreasing) = parse_step(step.trim(), variable)?;
    Some(ForHeader {
        variable: variable.to_string(),
        start: start.trim().to_string(),
        comparator,
        limit: caps[3].to_string(),
        step,
        decreasing,
    })
}

fn parse_step(step: &str, variable: &str) -> Option<(String, bool)> {
    let compact: String = step.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == format!("{}++", variable) || compact == format!("++{}", variable) {
        return Some(("1".to_string(), false));
    }
    if compact == format!("{}--", variable) || compact == format!("--{}", variable) {
        return Some(("1".to_string(), true));
    }
    if let Some(amount) = compact.strip_prefix(&format!("{}+=", variable)) {
        return Some((amount.to_string(), false));
    }
    if let Some(amount) = compact.strip_prefix(&format!("{}-=", variable)) {
        return Some((amount.to_string(), true));
    }
    let expression = compact.strip_prefix(&format!("{}=", variable))?;
    if let Some(amount) = expression.strip_prefix(&format!("{}+", variable)) {
        return Some((amount.to_string(), false));
    }
    if let Some(amount) = expression.strip_prefix(&format!("{}-", variable)) {
        return Some((amount.to_string(), true));
    }
    None
}

impl ForHeader {
    /// `<end>:<start>` for the values the variable takes. Numeric ranges are
    /// written high:low.
    pub fn range_token(&self, resolver: &mut dyn SymbolResolver) -> String {
        let step = evaluate(&self.step, resolver).as_number().unwrap_or(1).abs().max(1);
        let start = evaluate(&self.start, resolver).into_bound(&self.start);
        let limit = evaluate(&self.limit, resolver).into_bound(&self.limit);

        let end = match (&limit, self.comparator) {
            (Bound::Number(limit), Comparator::Less) => Bound::Number(limit - step),
            (Bound::Number(limit), Comparator::Greater) => Bound::Number(limit + step),
            (Bound::Number(limit), Comparator::NotEqual) if self.decreasing => {
                Bound::Number(limit + step)
            }
            (Bound::Number(limit), Comparator::NotEqual) => Bound::Number(limit - step),
            (Bound::Number(limit), _) => Bound::Number(*limit),
            (Bound::Text(limit), Comparator::Less) => Bound::Text(format!("{}-{}", limit, step)),
            (Bound::Text(limit), Comparator::Greater) => {
                Bound::Text(format!("{}+{}", limit, step))
            }
            (Bound::Text(limit), _) => Bound::Text(limit.clone()),
        };

        match (&end, &start) {
            (Bound::Number(end), Bound::Number(start)) => {
                format!("{}:{}", end.max(start), end.min(start))
            }
            _ => format!("{}:{}", end, start),
        }
    }
}

#[derive(Debug)]
struct ActiveLoop {
    pattern: Regex,
    token: String,
    begin_depth: usize,
    /// Still waiting for the statement or `begin` it covers.
    fresh: bool,
}

#[derive(Debug, Default)]
pub struct GenerateExpander {
    loops: Vec<ActiveLoop>,
    depth: usize,
}

impl GenerateExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.loops.is_empty()
    }

    pub fn enter(&mut self, header: &ForHeader, resolver: &mut dyn SymbolResolver) {
        let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(&header.variable))) {
            Ok(pattern) => pattern,
            Err(err) => {
                log::warn!("Cannot expand loop variable '{}': {}", header.variable, err);
                return;
            }
        };
        let token = header.range_token(resolver);
        if self.loops.is_empty() {
            self.depth = 0;
        }
        log::debug!("Loop variable '{}' covers {}", header.variable, token);
        self.loops.push(ActiveLoop {
            pattern,
            token,
            begin_depth: self.depth,
            fresh: true,
        });
    }

    /// Replaces every active loop variable in `text` with its range token.
    pub fn rewrite(&self, text: &str) -> String {
        let mut result = text.to_string();
        for active in &self.loops {
            result = active
                .pattern
                .replace_all(&result, regex::NoExpand(active.token.as_str()))
                .into_owned();
        }
        result
    }

    /// Updates loop scopes after a statement that is not itself a `for`.
    pub fn track(&mut self, text: &str) {
        if self.loops.is_empty() {
            return;
        }
        let opens = BEGIN_WORD.find_iter(text).count();
        let closes = END_WORD.find_iter(text).count();

        self.depth = self.depth.saturating_sub(closes);
        let mut closed = false;
        while let Some(top) = self.loops.last() {
            if !top.fresh && self.depth <= top.begin_depth {
                self.loops.pop();
                closed = true;
            } else {
                break;
            }
        }
        if closed {
            self.finish_statement();
        }

        if let Some(top) = self.loops.last_mut() {
            if top.fresh {
                if opens > 0 {
                    top.fresh = false;
                } else if text.trim_end().ends_with(';') {
                    self.finish_statement();
                }
            }
        }
        self.depth += opens;
    }

    /// Pops every loop that was covering only the statement just finished.
    fn finish_statement(&mut self) {
        while self.loops.last().map_or(false, |top| top.fresh) {
            self.loops.pop();
        }
    }

    pub fn reset(&mut self) {
        self.loops.clear();
        self.depth = 0;
    }
}
