//! Textual evaluation of macro, parameter and range expressions.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::expr::evaluate_integer;
use crate::scan::{find_range_colon, matching_close};

const MAX_SUBSTITUTION_ROUNDS: usize = 16;

static CLOG2_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\$clog2|\bclog2)\s*\(").unwrap());
static BITS_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$bits\s*\(").unwrap());
// Literals come first so their digits are never taken for identifiers.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\d*'[sS]?[bBoOdDhH][0-9a-zA-Z_?]+|\d[\d_]*|\$[A-Za-z_][\w$]*|`?[A-Za-z_][\w$]*(?:::[A-Za-z_][\w$]*)*",
    )
    .unwrap()
});
static PLAIN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d[\d_]*$").unwrap());

/// One side of a bit range: numeric when it could be computed, otherwise the
/// expression text as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Number(i64),
    Text(String),
}

impl Bound {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Bound::Number(value) => Some(*value),
            Bound::Text(_) => None,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(value) => write!(f, "{}", value),
            Bound::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    Number(i64),
    Text(String),
    Bitdef { upper: Bound, lower: Bound },
}

impl Evaluated {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Evaluated::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Collapses a scalar result into a [`Bound`]. Ranges are kept as text.
    pub fn into_bound(self, original: &str) -> Bound {
        match self {
            Evaluated::Number(value) => Bound::Number(value),
            Evaluated::Text(text) => Bound::Text(text),
            Evaluated::Bitdef { .. } => Bound::Text(original.trim().to_string()),
        }
    }
}

/// Name lookups the evaluator needs from its surroundings.
pub trait SymbolResolver {
    /// Value text for a plain identifier, a `` `MACRO `` or a `pkg::NAME`.
    fn resolve_identifier(&mut self, name: &str) -> Option<String>;

    /// Bit width of a typedef, a bound signal, a dotted member path or a
    /// declared signal, for `$bits`.
    fn resolve_width(&mut self, reference: &str) -> Option<i64>;
}

/// A resolver that knows nothing; useful for literal-only arithmetic.
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
    fn resolve_identifier(&mut self, _name: &str) -> Option<String> {
        None
    }

    fn resolve_width(&mut self, _reference: &str) -> Option<i64> {
        None
    }
}

pub fn clog2(value: i64) -> i64 {
    if value <= 1 {
        0
    } else {
        64 - i64::from((value - 1).leading_zeros())
    }
}

pub fn evaluate(text: &str, resolver: &mut dyn SymbolResolver) -> Evaluated {
    let original = text.trim();
    if original.is_empty() {
        return Evaluated::Text(String::new());
    }

    if let Some(colon) = find_range_colon(original) {
        return Evaluated::Bitdef {
            upper: evaluate_side(&original[..colon], resolver),
            lower: evaluate_side(&original[colon + 1..], resolver),
        };
    }

    let rewritten = rewrite_clog2(original, resolver);
    let rewritten = rewrite_bits(&rewritten, resolver);
    let substituted = substitute(&rewritten, resolver);

    // A substituted value may itself be a range, e.g. `define RANGE 7:0
    if let Some(colon) = find_range_colon(&substituted) {
        let upper = &substituted[..colon];
        let lower = &substituted[colon + 1..];
        return Evaluated::Bitdef {
            upper: number_or_text(upper),
            lower: number_or_text(lower),
        };
    }

    match evaluate_integer(&substituted) {
        Some(value) => Evaluated::Number(value),
        None => Evaluated::Text(original.to_string()),
    }
}

fn evaluate_side(side: &str, resolver: &mut dyn SymbolResolver) -> Bound {
    let side = side.trim();
    match evaluate(side, resolver) {
        Evaluated::Number(value) => Bound::Number(value),
        _ => Bound::Text(side.to_string()),
    }
}

fn number_or_text(side: &str) -> Bound {
    let side = side.trim();
    match evaluate_integer(side) {
        Some(value) => Bound::Number(value),
        None => Bound::Text(side.to_string()),
    }
}

fn rewrite_clog2(text: &str, resolver: &mut dyn SymbolResolver) -> String {
    let mut result = text.to_string();
    let mut search_from = 0;
    while let Some(found) = CLOG2_CALL.find_at(&result, search_from) {
        let (start, end) = (found.start(), found.end());
        let open = end - 1;
        let Some(close) = matching_close(&result, open) else {
            break;
        };
        let argument = result[open + 1..close].to_string();
        match evaluate(&argument, resolver) {
            Evaluated::Number(value) => {
                let replacement = clog2(value).to_string();
                result.replace_range(start..=close, &replacement);
                search_from = start + replacement.len();
            }
            _ => search_from = close + 1,
        }
    }
    result
}

fn rewrite_bits(text: &str, resolver: &mut dyn SymbolResolver) -> String {
    let mut result = text.to_string();
    let mut search_from = 0;
    while let Some(found) = BITS_CALL.find_at(&result, search_from) {
        let (start, end) = (found.start(), found.end());
        let open = end - 1;
        let Some(close) = matching_close(&result, open) else {
            break;
        };
        let reference = result[open + 1..close].trim().to_string();
        match resolver.resolve_width(&reference) {
            Some(width) => {
                let replacement = width.to_string();
                result.replace_range(start..=close, &replacement);
                search_from = start + replacement.len();
            }
            None => {
                log::debug!("Cannot size $bits({})", reference);
                search_from = close + 1;
            }
        }
    }
    result
}

/// Replaces every resolvable identifier by its value until nothing changes.
pub fn substitute(text: &str, resolver: &mut dyn SymbolResolver) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_SUBSTITUTION_ROUNDS {
        let next = substitute_once(&current, resolver);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn substitute_once(text: &str, resolver: &mut dyn SymbolResolver) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for token in TOKEN.find_iter(text) {
        result.push_str(&text[last..token.start()]);
        last = token.end();
        let word = token.as_str();
        let first = word.chars().next().unwrap_or('0');
        // member selects (`a.b`) and system names are not values
        let after_dot = text[..token.start()].ends_with('.');
        if first.is_ascii_digit() || first == '\'' || first == '$' || after_dot {
            result.push_str(word);
            continue;
        }
        match resolver.resolve_identifier(word) {
            Some(value) => result.push_str(&wrap_value(&value)),
            None => result.push_str(word),
        }
    }
    result.push_str(&text[last..]);
    result
}

fn wrap_value(value: &str) -> String {
    let value = value.trim();
    if PLAIN_NUMBER.is_match(value) || find_range_colon(value).is_some() {
        value.to_string()
    } else {
        format!("({})", value)
    }
}
