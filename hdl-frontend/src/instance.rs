//! Submodule instances and the rules that connect their ports.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::eval::Bound;
use crate::scan::{first_word, matching_close, split_top_level};
use crate::unify::PortDirection;

static PERL_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(\d)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortFilter {
    Inputs,
    Outputs,
}

impl PortFilter {
    fn admits(self, direction: PortDirection) -> bool {
        match self {
            PortFilter::Inputs => direction == PortDirection::Input,
            PortFilter::Outputs => direction != PortDirection::Input,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConnectRule {
    /// `/regex/ /replacement/ [INPUTS|OUTPUTS]`
    Pattern {
        regex: Regex,
        replacement: String,
        filter: Option<PortFilter>,
    },
    Direct { sub: String, top: String },
    Unconnected { sub: String },
}

fn regex_body(token: &str) -> Option<&str> {
    token
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
}

/// Builds a rule from the arguments of `&Connect`.
pub fn parse_connect(tokens: &[String]) -> Result<ConnectRule, String> {
    match tokens {
        [] => Err("&Connect needs at least one argument".to_string()),
        [sub] => Ok(ConnectRule::Unconnected { sub: sub.clone() }),
        [sub, top, rest @ ..] => {
            let filter = match rest.first().map(|word| word.to_ascii_uppercase()) {
                None => None,
                Some(word) if word == "INPUTS" => Some(PortFilter::Inputs),
                Some(word) if word == "OUTPUTS" => Some(PortFilter::Outputs),
                Some(word) => return Err(format!("unknown &Connect filter '{}'", word)),
            };
            match regex_body(sub) {
                Some(pattern) => {
                    let regex = Regex::new(pattern)
                        .map_err(|err| format!("bad pattern /{}/: {}", pattern, err))?;
                    let replacement = regex_body(top).unwrap_or(top);
                    let replacement = replacement.strip_prefix('^').unwrap_or(replacement);
                    let replacement = replacement.strip_suffix('$').unwrap_or(replacement);
                    Ok(ConnectRule::Pattern {
                        regex,
                        replacement: PERL_GROUP.replace_all(replacement, "$${$1}").into_owned(),
                        filter,
                    })
                }
                None => Ok(ConnectRule::Direct {
                    sub: sub.clone(),
                    top: top.clone(),
                }),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamOverride {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstancePort {
    pub name: String,
    pub direction: PortDirection,
    pub sub_bitdef: Option<String>,
    pub sub_upper: Option<Bound>,
    pub sub_lower: Option<Bound>,
    /// Net or expression on the parent side, `None` when unconnected.
    pub top: Option<String>,
    pub top_bitdef: Option<String>,
    pub top_upper: Option<Bound>,
    pub top_lower: Option<Bound>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub module: String,
    pub name: String,
    pub path: PathBuf,
    pub ports: Vec<InstancePort>,
    pub parameters: Vec<ParamOverride>,
}

impl Instance {
    pub fn port(&self, name: &str) -> Option<&InstancePort> {
        self.ports.iter().find(|port| port.name == name)
    }
}

/// Applies connection rules in order. Returns the offending port name when a
/// rule names a port the submodule does not have.
pub fn apply_rules(ports: &mut [InstancePort], rules: &[ConnectRule]) -> Result<(), String> {
    for rule in rules {
        match rule {
            ConnectRule::Pattern {
                regex,
                replacement,
                filter,
            } => {
                for port in ports.iter_mut() {
                    if filter.map_or(false, |filter| !filter.admits(port.direction)) {
                        continue;
                    }
                    let current = port.top.clone().unwrap_or_else(|| port.name.clone());
                    if regex.is_match(&current) {
                        port.top = Some(regex.replace(&current, replacement.as_str()).into_owned());
                        port.connected = true;
                    }
                }
            }
            ConnectRule::Direct { sub, top } => {
                let port = ports
                    .iter_mut()
                    .find(|port| &port.name == sub)
                    .ok_or_else(|| sub.clone())?;
                port.top = Some(top.clone());
                port.connected = true;
            }
            ConnectRule::Unconnected { sub } => {
                let port = ports
                    .iter_mut()
                    .find(|port| &port.name == sub)
                    .ok_or_else(|| sub.clone())?;
                port.top = None;
                port.connected = false;
            }
        }
    }
    Ok(())
}

/// Port list of a written instantiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connections {
    /// `.port(expr)`; `None` for `.port()`.
    pub named: Vec<(String, Option<String>)>,
    pub positional: Vec<String>,
    pub wildcard: bool,
}

pub fn parse_connections(text: &str) -> Connections {
    let mut connections = Connections::default();
    for item in split_top_level(text, ',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if item == ".*" {
            connections.wildcard = true;
            continue;
        }
        match item.strip_prefix('.') {
            Some(named) => {
                let name = first_word(named);
                let after = named.trim_start()[name.len()..].trim_start();
                let expression = if after.starts_with('(') {
                    matching_close(after, 0)
                        .map(|close| after[1..close].trim().to_string())
                        .filter(|expr| !expr.is_empty())
                } else {
                    // `.name` shorthand
                    Some(name.to_string())
                };
                connections.named.push((name.to_string(), expression));
            }
            None => connections.positional.push(item.to_string()),
        }
    }
    connections
}

/// `.P(v)` overrides. Positional overrides are returned separately.
pub fn parse_overrides(text: &str) -> (Vec<ParamOverride>, Vec<String>) {
    let connections = parse_connections(text);
    let named = connections
        .named
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| ParamOverride { name, value }))
        .collect();
    (named, connections.positional)
}

/// Replaces whole-word parameter names with their parenthesised values.
pub fn substitute_parameters(text: &str, values: &[(String, String)]) -> String {
    let mut result = text.to_string();
    for (name, value) in values {
        let Ok(pattern) = Regex::new(&format!(r"\b{}\b", regex::escape(name))) else {
            continue;
        };
        let replacement = format!("({})", value);
        result = pattern
            .replace_all(&result, regex::NoExpand(&replacement))
            .into_owned();
    }
    result
}
