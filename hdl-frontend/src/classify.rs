//! Maps one logical statement to the [`Statement`] the engine acts on.

use crate::directive::{parse_directive, Directive};
use crate::keywords::is_reserved_keyword;
use crate::scan::{first_word, leading_dimensions, matching_close, split_top_level};
use crate::types::split_type_reference;
use crate::unify::PortDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlwaysKind {
    Ff,
    Comb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    Case,
    Casez,
    Casex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredName {
    pub name: String,
    pub unpacked: Vec<String>,
    pub init: Option<String>,
}

/// `[net/type keywords] [user type] [signed] [packed dims] name [dims] [= init], ...`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBody {
    /// Last built-in type or net keyword seen (`wire`, `logic`, `int`, ...).
    pub data_type: Option<String>,
    /// User type reference, possibly package qualified.
    pub type_name: Option<String>,
    pub signed: bool,
    pub packed: Vec<String>,
    pub names: Vec<DeclaredName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHeader {
    pub name: String,
    pub parameters: Option<String>,
    pub ports: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Module(ModuleHeader),
    EndModule,
    Package { name: String },
    EndPackage,
    Class { name: String },
    EndClass,
    Import { items: Vec<String> },
    Parameter { local: bool, body: String },
    Typedef { body: String },
    Function { name: String, task: bool },
    EndSubroutine,
    Generate,
    EndGenerate,
    Genvar { names: Vec<String> },
    Integer { names: Vec<String> },
    PortDeclaration { direction: PortDirection, body: DeclarationBody },
    NetDeclaration(DeclarationBody),
    Always { kind: AlwaysKind, sensitivity: Option<String>, rest: String },
    Initial { rest: String },
    If { condition: String, rest: String },
    ElseIf { condition: String, rest: String },
    Else { rest: String },
    Case { kind: CaseKind, expression: String, rest: String },
    CaseItem { label: String, rest: String },
    EndCase,
    For { header: String, rest: String },
    Loop { rest: String },
    Begin { label: Option<String>, rest: String },
    End { rest: String },
    ContinuousAssign { lhs: String, rhs: String },
    Assignment { lhs: String, rhs: String, nonblocking: bool, reset: Option<String> },
    TypedDeclaration(DeclarationBody),
    Instantiation {
        module: String,
        parameters: Option<String>,
        instance: String,
        connections: String,
    },
    Directive(Directive),
    Other,
}

const NET_KEYWORDS: &[&str] = &[
    "wire", "reg", "logic", "bit", "var", "tri", "wand", "wor", "uwire", "supply0", "supply1",
    "int", "byte", "shortint", "longint", "integer",
];

/// Classifies `text`. `in_case_body` enables `label: statement` items.
pub fn classify(text: &str, in_case_body: bool) -> Statement {
    let text = text.trim();
    if text.starts_with('&') {
        return parse_directive(text).map_or(Statement::Other, Statement::Directive);
    }

    let word = first_word(text);
    let rest = text[word.len()..].trim();
    match word {
        "module" | "macromodule" => parse_module_header(rest).map_or(Statement::Other, Statement::Module),
        "endmodule" => Statement::EndModule,
        "package" => Statement::Package {
            name: first_word(rest).to_string(),
        },
        "endpackage" => Statement::EndPackage,
        "virtual" if first_word(rest) == "class" => classify(rest, in_case_body),
        "class" => Statement::Class {
            name: first_word(rest).to_string(),
        },
        "endclass" => Statement::EndClass,
        "import" => Statement::Import {
            items: split_top_level(rest.trim_end_matches(';'), ',')
                .into_iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        },
        "parameter" | "localparam" => Statement::Parameter {
            local: word == "localparam",
            body: rest.trim_end_matches(';').trim().to_string(),
        },
        "typedef" => Statement::Typedef {
            body: rest.trim_end_matches(';').trim().to_string(),
        },
        "function" | "task" => Statement::Function {
            name: subroutine_name(rest),
            task: word == "task",
        },
        "endfunction" | "endtask" => Statement::EndSubroutine,
        "generate" => Statement::Generate,
        "endgenerate" => Statement::EndGenerate,
        "genvar" => Statement::Genvar {
            names: name_list(rest),
        },
        "integer" if !rest.starts_with('[') => Statement::Integer {
            names: name_list(rest),
        },
        "input" | "output" | "inout" => match PortDirection::from_keyword(word) {
            Some(direction) => Statement::PortDeclaration {
                direction,
                body: parse_declaration_body(rest),
            },
            None => Statement::Other,
        },
        _ if NET_KEYWORDS.contains(&word) => Statement::NetDeclaration(parse_declaration_body(text)),
        "always" | "always_ff" | "always_comb" | "always_latch" => classify_always(word, rest),
        "initial" | "final" => Statement::Initial {
            rest: rest.to_string(),
        },
        "if" => match parenthesized(rest) {
            Some((condition, rest)) => Statement::If { condition, rest },
            None => Statement::Other,
        },
        "else" => {
            if first_word(rest) == "if" {
                let after_if = rest[2..].trim();
                match parenthesized(after_if) {
                    Some((condition, rest)) => Statement::ElseIf { condition, rest },
                    None => Statement::Other,
                }
            } else {
                Statement::Else {
                    rest: rest.to_string(),
                }
            }
        }
        "unique" | "unique0" | "priority" => classify(rest, in_case_body),
        "case" | "casez" | "casex" => {
            let kind = match word {
                "casez" => CaseKind::Casez,
                "casex" => CaseKind::Casex,
                _ => CaseKind::Case,
            };
            match parenthesized(rest) {
                Some((expression, rest)) => Statement::Case {
                    kind,
                    expression,
                    rest: rest.trim_start_matches("inside").trim().to_string(),
                },
                None => Statement::Other,
            }
        }
        "endcase" => Statement::EndCase,
        "for" => match parenthesized(rest) {
            Some((header, rest)) => Statement::For { header, rest },
            None => Statement::Other,
        },
        "foreach" | "while" | "repeat" => match parenthesized(rest) {
            Some((_, rest)) => Statement::Loop { rest },
            None => Statement::Other,
        },
        "forever" | "do" => Statement::Loop {
            rest: rest.to_string(),
        },
        "begin" => {
            let (label, rest) = strip_label(rest);
            Statement::Begin { label, rest }
        }
        "end" => {
            let (_, rest) = strip_label(rest);
            Statement::End { rest }
        }
        "default" if in_case_body => Statement::CaseItem {
            label: "default".to_string(),
            rest: rest.trim_start_matches(':').trim().to_string(),
        },
        "assign" => match split_assignment(rest) {
            Some(assignment) => Statement::ContinuousAssign {
                lhs: assignment.lhs,
                rhs: assignment.rhs,
            },
            None => Statement::Other,
        },
        _ => classify_unkeyed(text, in_case_body),
    }
}

fn classify_unkeyed(text: &str, in_case_body: bool) -> Statement {
    // assertions, `disable`, `wait`, `return` and friends carry no declarations
    if is_reserved_keyword(first_word(text)) {
        return Statement::Other;
    }
    if in_case_body {
        if let Some(colon) = case_label_colon(text) {
            return Statement::CaseItem {
                label: text[..colon].trim().to_string(),
                rest: text[colon + 1..].trim().to_string(),
            };
        }
    }
    if let Some(body) = typed_declaration(text) {
        return Statement::TypedDeclaration(body);
    }
    if let Some(assignment) = split_assignment(text) {
        let (rhs, reset) = if assignment.nonblocking {
            let parts = split_top_level(&assignment.rhs, ',');
            match parts.as_slice() {
                [rhs, reset] => (rhs.trim().to_string(), Some(reset.trim().to_string())),
                _ => (assignment.rhs.clone(), None),
            }
        } else {
            (assignment.rhs.clone(), None)
        };
        return Statement::Assignment {
            lhs: assignment.lhs,
            rhs,
            nonblocking: assignment.nonblocking,
            reset,
        };
    }
    parse_instantiation(text).unwrap_or(Statement::Other)
}

fn classify_always(word: &str, rest: &str) -> Statement {
    let (sensitivity, body) = match rest.strip_prefix('@') {
        Some(after_at) => {
            let after_at = after_at.trim_start();
            if let Some(stripped) = after_at.strip_prefix('*') {
                (Some("*".to_string()), stripped.trim().to_string())
            } else {
                match parenthesized(after_at) {
                    Some((list, body)) => (Some(list), body),
                    None => (None, after_at.to_string()),
                }
            }
        }
        None => (None, rest.to_string()),
    };
    let edge_triggered = sensitivity
        .as_deref()
        .map_or(false, |list| list.contains("posedge") || list.contains("negedge"));
    let kind = match word {
        "always_ff" => AlwaysKind::Ff,
        "always" if edge_triggered => AlwaysKind::Ff,
        _ => AlwaysKind::Comb,
    };
    Statement::Always {
        kind,
        sensitivity,
        rest: body,
    }
}

/// `( inner ) rest` -> (inner, rest).
fn parenthesized(text: &str) -> Option<(String, String)> {
    let text = text.trim_start();
    if !text.starts_with('(') {
        return None;
    }
    let close = matching_close(text, 0)?;
    Some((
        text[1..close].trim().to_string(),
        text[close + 1..].trim().to_string(),
    ))
}

fn strip_label(rest: &str) -> (Option<String>, String) {
    match rest.strip_prefix(':') {
        Some(labelled) => {
            let label = first_word(labelled);
            let after = labelled.trim_start()[label.len()..].trim();
            (Some(label.to_string()), after.to_string())
        }
        None => (None, rest.to_string()),
    }
}

fn subroutine_name(rest: &str) -> String {
    let header = rest.split(['(', ';']).next().unwrap_or(rest);
    header
        .split(|c: char| c.is_whitespace() || c == ']')
        .filter(|word| !word.is_empty())
        .last()
        .map(|word| word.rsplit("::").next().unwrap_or(word).to_string())
        .unwrap_or_default()
}

fn name_list(rest: &str) -> Vec<String> {
    split_top_level(rest.trim_end_matches(';'), ',')
        .into_iter()
        .map(first_word)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_module_header(rest: &str) -> Option<ModuleHeader> {
    let rest = rest.trim_end_matches(';').trim();
    let rest = match first_word(rest) {
        "automatic" | "static" => rest[first_word(rest).len()..].trim_start(),
        _ => rest,
    };
    let name = first_word(rest);
    if name.is_empty() {
        return None;
    }
    let mut tail = rest[name.len()..].trim_start();
    // header imports: module m import pkg::*; #(...)
    while first_word(tail) == "import" {
        let end = tail.find(';').unwrap_or(tail.len());
        tail = tail[end..].trim_start_matches(';').trim_start();
    }
    let (parameters, tail) = match tail.strip_prefix('#') {
        Some(after_hash) => {
            let (inner, after) = parenthesized(after_hash)?;
            (Some(inner), after)
        }
        None => (None, tail.to_string()),
    };
    let ports = parenthesized(&tail).map(|(inner, _)| inner);
    Some(ModuleHeader {
        name: name.to_string(),
        parameters,
        ports,
    })
}

pub fn parse_declaration_body(body: &str) -> DeclarationBody {
    let mut declaration = DeclarationBody::default();
    let mut rest = body.trim().trim_end_matches(';').trim();

    loop {
        let word = first_word(rest);
        if word.is_empty() {
            break;
        }
        match word {
            "signed" => declaration.signed = true,
            "unsigned" => declaration.signed = false,
            _ if NET_KEYWORDS.contains(&word) => declaration.data_type = Some(word.to_string()),
            _ => break,
        }
        rest = rest[word.len()..].trim_start();
    }

    // A user type is followed by another identifier (after optional dims).
    if let Some((type_name, after_type)) = split_type_reference(rest) {
        let (_, after_dims) = leading_dimensions(after_type);
        let after_sign = match first_word(after_dims) {
            "signed" | "unsigned" => &after_dims[first_word(after_dims).len()..],
            _ => after_dims,
        };
        if !first_word(after_sign).is_empty() {
            declaration.type_name = Some(type_name);
            rest = after_type;
            if first_word(rest) == "signed" {
                declaration.signed = true;
                rest = rest["signed".len()..].trim_start();
            }
        }
    }

    let (packed, names) = leading_dimensions(rest);
    declaration.packed = packed;
    declaration.names = split_top_level(names, ',')
        .into_iter()
        .filter_map(parse_declared_name)
        .collect();
    declaration
}

fn parse_declared_name(text: &str) -> Option<DeclaredName> {
    let text = text.trim();
    let name = first_word(text);
    if name.is_empty() {
        return None;
    }
    let (unpacked, after) = leading_dimensions(&text[name.len()..]);
    let init = after
        .strip_prefix('=')
        .map(|init| init.trim().to_string())
        .filter(|init| !init.is_empty());
    Some(DeclaredName {
        name: name.to_string(),
        unpacked,
        init,
    })
}

/// `type_t name [, name];` where `type_t` is not a built-in keyword.
fn typed_declaration(text: &str) -> Option<DeclarationBody> {
    let body = parse_declaration_body(text);
    if body.type_name.is_none() || body.names.is_empty() {
        return None;
    }
    // every declarator must be `name [dims] [= init]`
    let trimmed = text.trim().trim_end_matches(';');
    let (type_name, after) = split_type_reference(trimmed)?;
    let (_, after) = leading_dimensions(after);
    let clean = split_top_level(after, ',').into_iter().all(|part| {
        let part = part.trim();
        let name = first_word(part);
        let (_, tail) = leading_dimensions(&part[name.len()..]);
        !name.is_empty() && (tail.is_empty() || tail.starts_with('='))
    });
    (clean && body.type_name.as_deref() == Some(type_name.as_str())).then_some(body)
}

fn case_label_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (index, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'?' | b'=' if depth == 0 => return None,
            b':' if depth == 0 => {
                let doubled = bytes.get(index + 1) == Some(&b':')
                    || (index > 0 && bytes[index - 1] == b':');
                if !doubled {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub lhs: String,
    pub rhs: String,
    pub nonblocking: bool,
}

/// Splits at the first top-level `=` or `<=` that is not a comparison.
pub fn split_assignment(text: &str) -> Option<SplitAssignment> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut index = 0;
    while index < bytes.len() {
        let b = bytes[index];
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'"' => {
                index += text[index + 1..].find('"').map_or(bytes.len(), |end| end + 1);
            }
            b'=' if depth == 0 => {
                if bytes.get(index + 1) == Some(&b'=') {
                    index += 2;
                    continue;
                }
                let prev = index.checked_sub(1).map(|i| bytes[i]);
                let prev2 = index.checked_sub(2).map(|i| bytes[i]);
                let (lhs_end, nonblocking) = match (prev2, prev) {
                    (Some(b'<'), Some(b'<')) | (Some(b'>'), Some(b'>')) => (index - 2, false),
                    (_, Some(b'<')) => (index - 1, true),
                    (_, Some(b'!' | b'=' | b'>')) => {
                        index += 1;
                        continue;
                    }
                    (_, Some(b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^')) => {
                        (index - 1, false)
                    }
                    _ => (index, false),
                };
                let lhs = text[..lhs_end].trim();
                if lhs.is_empty() {
                    return None;
                }
                return Some(SplitAssignment {
                    lhs: lhs.to_string(),
                    rhs: text[index + 1..].trim().trim_end_matches(';').trim().to_string(),
                    nonblocking,
                });
            }
            _ => {}
        }
        index += 1;
    }
    None
}

fn parse_instantiation(text: &str) -> Option<Statement> {
    let text = text.trim().trim_end_matches(';').trim();
    let module = first_word(text);
    if module.is_empty() {
        return None;
    }
    let mut rest = text[module.len()..].trim_start();
    let mut parameters = None;
    if let Some(after_hash) = rest.strip_prefix('#') {
        let after_hash = after_hash.trim_start();
        if after_hash.starts_with('(') {
            let close = matching_close(after_hash, 0)?;
            parameters = Some(after_hash[1..close].trim().to_string());
            rest = after_hash[close + 1..].trim_start();
        } else {
            // #N shorthand for a single positional override
            let value = first_word(after_hash);
            let value = if value.is_empty() {
                after_hash.split_whitespace().next()?
            } else {
                value
            };
            parameters = Some(value.to_string());
            rest = after_hash[value.len()..].trim_start();
        }
    }
    let instance = first_word(rest);
    if instance.is_empty() {
        return None;
    }
    let (_, rest) = leading_dimensions(&rest[instance.len()..]);
    if !rest.starts_with('(') {
        return None;
    }
    let close = matching_close(rest, 0)?;
    if !rest[close + 1..].trim().is_empty() {
        return None;
    }
    Some(Statement::Instantiation {
        module: module.to_string(),
        parameters,
        instance: instance.to_string(),
        connections: rest[1..close].trim().to_string(),
    })
}
