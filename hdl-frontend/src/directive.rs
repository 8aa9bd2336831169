//! `&Name args;` build directives embedded in the source.

use crate::scan::{split_top_level, strip_outer_parens};
use crate::symbols::Edge;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    BeginInstance {
        module: String,
        instance: Option<String>,
        file: Option<String>,
    },
    Connect(Vec<String>),
    Param {
        name: String,
        value: String,
    },
    EndInstance,
    Edge {
        edge: Edge,
        clock: String,
        reset: Option<String>,
    },
    EndEdge(Edge),
    Force(String),
    ParserOff,
    ParserOn,
    SkipIfdefBegin,
    SkipIfdefEnd,
    Unknown(String),
}

/// Parses a statement starting with `&`. Returns `None` for anything else.
pub fn parse_directive(text: &str) -> Option<Directive> {
    let text = text.trim().strip_prefix('&')?;
    let text = text.trim_end().trim_end_matches(';').trim();
    let name_end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let name = &text[..name_end];
    let body = strip_outer_parens(&text[name_end..]);

    let directive = match name.to_ascii_lowercase().as_str() {
        "begininstance" => {
            let mut args = arguments(body).into_iter();
            Directive::BeginInstance {
                module: args.next()?,
                instance: args.next(),
                file: args.next(),
            }
        }
        "connect" => Directive::Connect(arguments(body)),
        "param" => {
            // the value may itself contain spaces or commas
            let body = body.trim();
            let split = body.find(|c: char| c.is_whitespace() || c == ',')?;
            Directive::Param {
                name: body[..split].to_string(),
                value: body[split..]
                    .trim()
                    .trim_start_matches(',')
                    .trim()
                    .to_string(),
            }
        }
        "endinstance" => Directive::EndInstance,
        "posedge" | "negedge" => {
            let edge = if name.eq_ignore_ascii_case("posedge") {
                Edge::Posedge
            } else {
                Edge::Negedge
            };
            let mut args = arguments(body).into_iter();
            Directive::Edge {
                edge,
                clock: args.next()?,
                reset: args.next(),
            }
        }
        "endposedge" => Directive::EndEdge(Edge::Posedge),
        "endnegedge" => Directive::EndEdge(Edge::Negedge),
        "force" => Directive::Force(body.to_string()),
        "parseroff" => Directive::ParserOff,
        "parseron" => Directive::ParserOn,
        "skipifdefbegin" => Directive::SkipIfdefBegin,
        "skipifdefend" => Directive::SkipIfdefEnd,
        _ => Directive::Unknown(name.to_string()),
    };
    Some(directive)
}

/// Whitespace- or comma-separated arguments. `/regex/` tokens are kept whole
/// even when they contain spaces or commas.
pub fn arguments(body: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_regex = false;
    for c in body.chars() {
        if in_regex {
            current.push(c);
            if c == '/' {
                in_regex = false;
            }
            continue;
        }
        match c {
            '/' if current.is_empty() => {
                in_regex = true;
                current.push(c);
            }
            c if c.is_whitespace() || c == ',' => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

/// Names listed in a `&Force` body after the keyword and optional range.
pub fn force_names(rest: &str) -> Vec<String> {
    split_top_level(rest, ',')
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
