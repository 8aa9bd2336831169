//! Package- and class-scoped user types: enums, logic typedefs, structs and
//! unions, plus the bindings of declared variables to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::scan::{first_word, leading_dimensions, matching_close, split_top_level};

pub const DEFAULT_SCOPE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopePath {
    pub package: String,
    pub class: String,
}

impl ScopePath {
    pub fn new(package: &str, class: &str) -> Self {
        Self {
            package: package.to_string(),
            class: class.to_string(),
        }
    }

    pub fn root() -> Self {
        Self::new(DEFAULT_SCOPE, DEFAULT_SCOPE)
    }

    pub fn package(package: &str) -> Self {
        Self::new(package, DEFAULT_SCOPE)
    }

    pub fn is_root(&self) -> bool {
        self.package == DEFAULT_SCOPE && self.class == DEFAULT_SCOPE
    }
}

impl Default for ScopePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.package, self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedefLogic {
    pub name: String,
    pub bitdef: Option<String>,
    pub upper: i64,
    pub lower: i64,
    pub signed: bool,
}

impl TypedefLogic {
    pub fn width(&self) -> i64 {
        match self.bitdef {
            Some(_) => (self.upper - self.lower).abs() + 1,
            None => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedefEnum {
    pub name: String,
    pub bitdef: Option<String>,
    pub members: Vec<EnumMember>,
    pub width: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberKind {
    Logic,
    Struct,
    Union,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TypedefKind {
    Enum,
    Logic,
    Struct,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeRef {
    pub scope: ScopePath,
    pub name: String,
    pub kind: TypedefKind,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scope, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructMember {
    pub name: String,
    pub kind: MemberKind,
    pub type_ref: Option<TypeRef>,
    pub width: i64,
}

/// A struct or a union; which one is decided by the map it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedefAggregate {
    pub name: String,
    pub members: Vec<StructMember>,
    pub width: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BindingMode {
    Manual,
    Force,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedefBinding {
    pub type_ref: TypeRef,
    /// Extra packed dimensions written on the declaration, e.g. `s_t [3:0] x`.
    pub packed: Vec<String>,
    pub depth: usize,
    pub mode: BindingMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeTypes {
    pub enums: BTreeMap<String, TypedefEnum>,
    pub logics: BTreeMap<String, TypedefLogic>,
    pub structs: BTreeMap<String, TypedefAggregate>,
    pub unions: BTreeMap<String, TypedefAggregate>,
    pub parameters: BTreeMap<String, String>,
}

impl ScopeTypes {
    fn kind_of(&self, name: &str) -> Option<TypedefKind> {
        if self.logics.contains_key(name) {
            Some(TypedefKind::Logic)
        } else if self.enums.contains_key(name) {
            Some(TypedefKind::Enum)
        } else if self.structs.contains_key(name) {
            Some(TypedefKind::Struct)
        } else if self.unions.contains_key(name) {
            Some(TypedefKind::Union)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeTable {
    /// package -> class -> types
    scopes: BTreeMap<String, BTreeMap<String, ScopeTypes>>,
    bindings: BTreeMap<String, TypedefBinding>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = Self {
            scopes: BTreeMap::new(),
            bindings: BTreeMap::new(),
        };
        table.ensure_scope(&ScopePath::root());
        table
    }

    /// Creates the scope (and the package's `default` class) when missing.
    pub fn ensure_scope(&mut self, scope: &ScopePath) -> &mut ScopeTypes {
        let classes = self.scopes.entry(scope.package.clone()).or_default();
        classes.entry(DEFAULT_SCOPE.to_string()).or_default();
        classes.entry(scope.class.clone()).or_default()
    }

    pub fn scope(&self, scope: &ScopePath) -> Option<&ScopeTypes> {
        self.scopes.get(&scope.package)?.get(&scope.class)
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.scopes.contains_key(package)
    }

    pub fn packages(&self) -> impl Iterator<Item = &String> {
        self.scopes.keys()
    }

    pub fn declare_enum(&mut self, scope: &ScopePath, typedef: TypedefEnum) {
        self.ensure_scope(scope)
            .enums
            .insert(typedef.name.clone(), typedef);
    }

    pub fn declare_logic(&mut self, scope: &ScopePath, typedef: TypedefLogic) {
        self.ensure_scope(scope)
            .logics
            .insert(typedef.name.clone(), typedef);
    }

    pub fn declare_struct(&mut self, scope: &ScopePath, typedef: TypedefAggregate) {
        self.ensure_scope(scope)
            .structs
            .insert(typedef.name.clone(), typedef);
    }

    pub fn declare_union(&mut self, scope: &ScopePath, typedef: TypedefAggregate) {
        self.ensure_scope(scope)
            .unions
            .insert(typedef.name.clone(), typedef);
    }

    pub fn declare_parameter(&mut self, scope: &ScopePath, name: &str, value: String) {
        self.ensure_scope(scope)
            .parameters
            .insert(name.to_string(), value);
    }

    pub fn package_parameter(&self, package: &str, name: &str) -> Option<&String> {
        self.scope(&ScopePath::package(package))?
            .parameters
            .get(name)
    }

    /// Scopes searched for an unqualified name, most specific first.
    pub fn search_order(current: &ScopePath, imports: &[String]) -> Vec<ScopePath> {
        let mut order = vec![current.clone()];
        let package_default = ScopePath::package(&current.package);
        if !order.contains(&package_default) {
            order.push(package_default);
        }
        for package in imports {
            let scope = ScopePath::package(package);
            if !order.contains(&scope) {
                order.push(scope);
            }
        }
        let root = ScopePath::root();
        if !order.contains(&root) {
            order.push(root);
        }
        order
    }

    /// Finds a typedef by name. `pkg::name` and `pkg::cls::name` are looked up
    /// directly, plain names through [`TypeTable::search_order`].
    pub fn lookup(&self, name: &str, current: &ScopePath, imports: &[String]) -> Option<TypeRef> {
        let parts: Vec<&str> = name.split("::").map(str::trim).collect();
        let candidates = match parts.as_slice() {
            [plain] => Self::search_order(current, imports)
                .into_iter()
                .map(|scope| (scope, *plain))
                .collect(),
            [package, plain] => vec![(ScopePath::package(package), *plain)],
            [package, class, plain] => vec![(ScopePath::new(package, class), *plain)],
            _ => Vec::new(),
        };
        candidates.into_iter().find_map(|(scope, plain)| {
            let kind = self.scope(&scope)?.kind_of(plain)?;
            Some(TypeRef {
                scope,
                name: plain.to_string(),
                kind,
            })
        })
    }

    pub fn logic(&self, type_ref: &TypeRef) -> Option<&TypedefLogic> {
        self.scope(&type_ref.scope)?.logics.get(&type_ref.name)
    }

    pub fn enumeration(&self, type_ref: &TypeRef) -> Option<&TypedefEnum> {
        self.scope(&type_ref.scope)?.enums.get(&type_ref.name)
    }

    pub fn aggregate(&self, type_ref: &TypeRef) -> Option<&TypedefAggregate> {
        let scope = self.scope(&type_ref.scope)?;
        match type_ref.kind {
            TypedefKind::Struct => scope.structs.get(&type_ref.name),
            TypedefKind::Union => scope.unions.get(&type_ref.name),
            _ => None,
        }
    }

    pub fn width_of(&self, type_ref: &TypeRef) -> Option<i64> {
        match type_ref.kind {
            TypedefKind::Logic => self.logic(type_ref).map(TypedefLogic::width),
            TypedefKind::Enum => self.enumeration(type_ref).map(|e| e.width),
            TypedefKind::Struct | TypedefKind::Union => self.aggregate(type_ref).map(|a| a.width),
        }
    }

    /// Width of `member.sub.leaf` inside an aggregate. An empty path is the
    /// width of the type itself.
    pub fn member_width(&self, type_ref: &TypeRef, path: &[&str]) -> Option<i64> {
        let Some((first, rest)) = path.split_first() else {
            return self.width_of(type_ref);
        };
        let name = first.split('[').next().unwrap_or(first).trim();
        let member = self
            .aggregate(type_ref)?
            .members
            .iter()
            .find(|member| member.name == name)?;
        if rest.is_empty() {
            return Some(member.width);
        }
        match member.kind {
            MemberKind::Logic => None,
            MemberKind::Struct | MemberKind::Union => {
                self.member_width(member.type_ref.as_ref()?, rest)
            }
        }
    }

    pub fn enum_constant(&self, name: &str, current: &ScopePath, imports: &[String]) -> Option<i64> {
        Self::search_order(current, imports)
            .iter()
            .filter_map(|scope| self.scope(scope))
            .flat_map(|scope| scope.enums.values())
            .flat_map(|typedef| typedef.members.iter())
            .find(|member| member.name == name)
            .map(|member| member.value)
    }

    /// Enum constant by explicit package, for `pkg::NAME` references.
    pub fn package_enum_constant(&self, package: &str, name: &str) -> Option<i64> {
        self.scopes
            .get(package)?
            .values()
            .flat_map(|scope| scope.enums.values())
            .flat_map(|typedef| typedef.members.iter())
            .find(|member| member.name == name)
            .map(|member| member.value)
    }

    pub fn bind(&mut self, signal: &str, binding: TypedefBinding) {
        self.bindings.insert(signal.to_string(), binding);
    }

    pub fn binding(&self, signal: &str) -> Option<&TypedefBinding> {
        self.bindings.get(signal)
    }

    pub fn bindings(&self) -> &BTreeMap<String, TypedefBinding> {
        &self.bindings
    }
}

/// Struct width is the sum of its members. A union takes the shared member
/// width; the flag is false when members disagree, in which case the last
/// member wins.
pub fn aggregate_width(union: bool, widths: &[i64]) -> (i64, bool) {
    if union {
        let last = widths.last().copied().unwrap_or(0);
        let uniform = widths.iter().all(|width| *width == last);
        (last, uniform)
    } else {
        (widths.iter().sum(), true)
    }
}

/// Fixed widths of the integer atom types.
pub fn integer_atom_width(type_name: &str) -> Option<i64> {
    match type_name {
        "byte" => Some(8),
        "shortint" => Some(16),
        "int" | "integer" => Some(32),
        "longint" => Some(64),
        _ => None,
    }
}

pub fn is_vector_type(type_name: &str) -> bool {
    matches!(type_name, "logic" | "bit" | "reg" | "wire")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub name: String,
    /// `[n:m]` or `[count]` suffix.
    pub range: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Field {
        type_name: String,
        dims: Vec<String>,
        names: Vec<String>,
    },
    /// `struct { ... } name;` inside another aggregate.
    Anonymous(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedefDecl {
    Logic {
        name: String,
        dims: Vec<String>,
        signed: bool,
    },
    Enum {
        name: String,
        base_dims: Vec<String>,
        base_type: Option<String>,
        items: Vec<EnumItem>,
    },
    Aggregate {
        union: bool,
        name: String,
        members: Vec<MemberDecl>,
    },
    /// `typedef other_t new_t;`
    Alias {
        name: String,
        target: String,
        dims: Vec<String>,
    },
}

/// Parses the text following `typedef` (without the trailing `;`).
pub fn parse_typedef(body: &str) -> Option<TypedefDecl> {
    let body = body.trim().trim_end_matches(';').trim();
    let keyword = first_word(body);
    match keyword {
        "enum" => parse_enum(&body[keyword.len()..]),
        "struct" | "union" => parse_aggregate(keyword == "union", &body[keyword.len()..]),
        _ if is_vector_type(keyword) || integer_atom_width(keyword).is_some() => {
            let (signed, rest) = strip_signing(&body[keyword.len()..]);
            let (mut dims, rest) = leading_dimensions(rest);
            if let Some(width) = integer_atom_width(keyword) {
                if dims.is_empty() {
                    dims.push(format!("{}:0", width - 1));
                }
            }
            let name = first_word(rest);
            (!name.is_empty()).then(|| TypedefDecl::Logic {
                name: name.to_string(),
                dims,
                signed,
            })
        }
        _ => {
            let (target, rest) = split_type_reference(body)?;
            let (dims, rest) = leading_dimensions(rest);
            let name = first_word(rest);
            (!name.is_empty()).then(|| TypedefDecl::Alias {
                name: name.to_string(),
                target,
                dims,
            })
        }
    }
}

fn strip_signing(text: &str) -> (bool, &str) {
    let text = text.trim_start();
    match first_word(text) {
        "signed" => (true, text["signed".len()..].trim_start()),
        "unsigned" => (false, text["unsigned".len()..].trim_start()),
        _ => (false, text),
    }
}

/// Splits a possibly package-qualified type name off the front of `text`.
pub fn split_type_reference(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start();
    let mut end = first_word(text).len();
    if end == 0 {
        return None;
    }
    while text[end..].starts_with("::") {
        let next = first_word(&text[end + 2..]);
        if next.is_empty() {
            break;
        }
        end += 2 + next.len();
    }
    Some((text[..end].to_string(), text[end..].trim_start()))
}

fn parse_enum(rest: &str) -> Option<TypedefDecl> {
    let open = rest.find('{')?;
    let close = matching_close(rest, open)?;
    let base = rest[..open].trim();
    let base_type = Some(first_word(base))
        .filter(|word| !word.is_empty())
        .map(str::to_string);
    let after_type = base_type
        .as_deref()
        .map_or(base, |word| base[word.len()..].trim_start());
    let (_, after_sign) = strip_signing(after_type);
    let (mut base_dims, _) = leading_dimensions(after_sign);
    if base_dims.is_empty() {
        if let Some(width) = base_type.as_deref().and_then(integer_atom_width) {
            base_dims.push(format!("{}:0", width - 1));
        }
    }

    let items = split_top_level(&rest[open + 1..close], ',')
        .into_iter()
        .filter_map(|item| {
            let (declarator, value) = match item.split_once('=') {
                Some((declarator, value)) => (declarator.trim(), Some(value.trim().to_string())),
                None => (item.trim(), None),
            };
            let name = first_word(declarator);
            if name.is_empty() {
                return None;
            }
            let (dims, _) = leading_dimensions(&declarator[name.len()..]);
            Some(EnumItem {
                name: name.to_string(),
                range: dims.into_iter().next(),
                value,
            })
        })
        .collect();

    let name = first_word(&rest[close + 1..]);
    (!name.is_empty()).then(|| TypedefDecl::Enum {
        name: name.to_string(),
        base_dims,
        base_type,
        items,
    })
}

fn parse_aggregate(union: bool, rest: &str) -> Option<TypedefDecl> {
    let open = rest.find('{')?;
    let close = matching_close(rest, open)?;
    let members = split_top_level(&rest[open + 1..close], ';')
        .into_iter()
        .map(str::trim)
        .filter(|member| !member.is_empty())
        .filter_map(parse_member)
        .collect();
    let name = first_word(&rest[close + 1..]);
    (!name.is_empty()).then(|| TypedefDecl::Aggregate {
        union,
        name: name.to_string(),
        members,
    })
}

fn parse_member(text: &str) -> Option<MemberDecl> {
    let mut text = text.trim();
    if first_word(text) == "rand" || first_word(text) == "randc" {
        text = text[first_word(text).len()..].trim_start();
    }
    if matches!(first_word(text), "struct" | "union" | "enum") {
        return Some(MemberDecl::Anonymous(text.to_string()));
    }
    let (type_name, rest) = split_type_reference(text)?;
    let (_, rest) = strip_signing(rest);
    let (dims, rest) = leading_dimensions(rest);
    let names: Vec<String> = split_top_level(rest, ',')
        .into_iter()
        .map(first_word)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return None;
    }
    Some(MemberDecl::Field {
        type_name,
        dims,
        names,
    })
}
