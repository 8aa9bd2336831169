//! Parameters, typedefs and signal declarations.

use crate::classify::{parse_declaration_body, DeclarationBody, DeclaredName, ModuleHeader};
use crate::eval::{clog2, evaluate, Bound, Evaluated};
use crate::scan::{first_word, is_identifier, split_top_level};
use crate::symbols::Parameter;
use crate::types::{
    aggregate_width, integer_atom_width, is_vector_type, parse_typedef, BindingMode, EnumItem,
    EnumMember, MemberDecl, MemberKind, StructMember, TypeRef, TypedefAggregate, TypedefBinding,
    TypedefDecl, TypedefEnum, TypedefKind, TypedefLogic, DEFAULT_SCOPE,
};
use crate::unify::{Mode, Observation, PortDirection, SignalKind};
use crate::FrontendError;

use super::{Frontend, Region};

impl Frontend {
    pub(super) fn enter_module(&mut self, header: &ModuleHeader) -> Result<(), FrontendError> {
        log::info!("Extracting module {}", header.name);
        self.symbols.module = Some(header.name.clone());
        self.region = Region::Module;
        self.constructs.reset();
        self.generate.reset();

        if let Some(parameters) = &header.parameters {
            self.declare_parameters(parameters, false);
        }
        if let Some(ports) = &header.ports {
            self.declare_header_ports(ports)?;
        }
        Ok(())
    }

    pub(super) fn import(&mut self, items: &[String]) -> Result<(), FrontendError> {
        for item in items {
            let Some((package, _)) = item.split_once("::") else {
                self.warn(format!("Ignoring malformed import '{}'", item));
                continue;
            };
            let package = package.trim().to_string();
            self.ensure_package(&package)?;
            if !self.imports.contains(&package) {
                self.imports.push(package);
            }
        }
        Ok(())
    }

    /// `parameter A = 1, B = A + 1` and the `#( ... )` list of a module header.
    pub(super) fn declare_parameters(&mut self, body: &str, local: bool) {
        for item in split_top_level(body, ',') {
            let mut item = item.trim();
            let mut local = local;
            match first_word(item) {
                "parameter" => item = item["parameter".len()..].trim_start(),
                "localparam" => {
                    item = item["localparam".len()..].trim_start();
                    local = true;
                }
                _ => {}
            }
            if first_word(item) == "type" {
                continue;
            }
            let Some((left, value)) = item.split_once('=') else {
                continue;
            };
            let name = left
                .trim_end()
                .rsplit(|c: char| c.is_whitespace() || c == ']')
                .next()
                .unwrap_or_default();
            if is_identifier(name) {
                self.declare_parameter(name, value.trim(), local);
            }
        }
    }

    fn declare_parameter(&mut self, name: &str, value: &str, local: bool) {
        if self.region == Region::Module && self.scope.class == DEFAULT_SCOPE {
            let text = match self.overrides.get(name) {
                Some(forced) if !local => forced.clone(),
                _ => value.to_string(),
            };
            let value = evaluate(&text, self).as_number();
            log::debug!("parameter {} = {} ({:?})", name, text, value);
            self.symbols.parameters.insert(
                name.to_string(),
                Parameter {
                    name: name.to_string(),
                    text,
                    value,
                    local,
                },
            );
        } else {
            let stored = match evaluate(value, self) {
                Evaluated::Number(number) => number.to_string(),
                _ => value.to_string(),
            };
            let scope = self.scope.clone();
            self.symbols.types.declare_parameter(&scope, name, stored);
        }
    }

    /// Width of one packed dimension: `u:l` or an SV size `[n]`.
    fn dim_width(&mut self, dim: &str) -> Option<i64> {
        match evaluate(dim, self) {
            Evaluated::Bitdef {
                upper: Bound::Number(upper),
                lower: Bound::Number(lower),
            } => Some((upper - lower).abs() + 1),
            Evaluated::Number(size) => Some(size),
            _ => None,
        }
    }

    /// Product of the widths of `dims`; 1 when there are none.
    pub(super) fn packed_factor(&mut self, dims: &[String]) -> Option<i64> {
        let mut factor = 1i64;
        for dim in dims {
            factor = factor.checked_mul(self.dim_width(dim)?)?;
        }
        Some(factor)
    }

    pub(super) fn packed_bounds(&mut self, dims: &[String]) -> (Option<Bound>, Option<Bound>) {
        match dims {
            [] => (None, None),
            [dim] => match evaluate(dim, self) {
                Evaluated::Bitdef { upper, lower } => (Some(upper), Some(lower)),
                Evaluated::Number(size) => (Some(Bound::Number(size - 1)), Some(Bound::Number(0))),
                Evaluated::Text(text) => (Some(Bound::Text(text)), None),
            },
            [first, ..] => match self.packed_factor(dims) {
                Some(width) => (Some(Bound::Number(width - 1)), Some(Bound::Number(0))),
                None => {
                    let first = [first.clone()];
                    self.packed_bounds(&first)
                }
            },
        }
    }

    /// `width-1:0` of a typedef with extra packed dimensions.
    pub(super) fn typed_bounds(
        &mut self,
        type_ref: &TypeRef,
        packed: &[String],
    ) -> (Option<Bound>, Option<Bound>) {
        let width = self.types().width_of(type_ref);
        match (width, self.packed_factor(packed)) {
            (Some(width), Some(factor)) => (
                Some(Bound::Number(width * factor - 1)),
                Some(Bound::Number(0)),
            ),
            _ => (
                Some(Bound::Text(format!("$bits({})-1", type_ref.name))),
                Some(Bound::Number(0)),
            ),
        }
    }

    fn declare_header_ports(&mut self, ports: &str) -> Result<(), FrontendError> {
        let mut current: Option<(PortDirection, DeclarationBody)> = None;
        for item in split_top_level(ports, ',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let word = first_word(item);
            if let Some(direction) = PortDirection::from_keyword(word) {
                let body = parse_declaration_body(&item[word.len()..]);
                self.declare_port(direction, &body)?;
                current = Some((direction, body));
                continue;
            }
            // `input [3:0] a, b` carries the direction and type on to `b`
            let Some((direction, previous)) = current.clone() else {
                continue;
            };
            let own = parse_declaration_body(item);
            let body = if own.data_type.is_some() || own.type_name.is_some() || !own.packed.is_empty() {
                own
            } else {
                DeclarationBody {
                    names: own.names,
                    ..previous
                }
            };
            self.declare_port(direction, &body)?;
            current = Some((direction, body));
        }
        Ok(())
    }

    pub(super) fn declare_port(
        &mut self,
        direction: PortDirection,
        body: &DeclarationBody,
    ) -> Result<(), FrontendError> {
        for declared in &body.names {
            self.declare_signal(SignalKind::Port, Some(direction), body, declared)?;
        }
        Ok(())
    }

    pub(super) fn declare_net(&mut self, body: &DeclarationBody) -> Result<(), FrontendError> {
        let kind = match body.data_type.as_deref() {
            Some("wire" | "tri" | "wand" | "wor" | "uwire" | "supply0" | "supply1") => SignalKind::Wire,
            Some("reg" | "integer" | "int" | "byte" | "shortint" | "longint") => SignalKind::Reg,
            _ => SignalKind::Signal,
        };
        for declared in &body.names {
            self.declare_signal(kind, None, body, declared)?;
            if let Some(init) = &declared.init {
                self.observe_reads(init);
            }
        }
        Ok(())
    }

    fn declare_signal(
        &mut self,
        kind: SignalKind,
        direction: Option<PortDirection>,
        body: &DeclarationBody,
        declared: &DeclaredName,
    ) -> Result<(), FrontendError> {
        let name = declared.name.as_str();
        let line = self.location.line;

        let (upper, lower, mode, data_type) = match &body.type_name {
            Some(type_name) => match self.lookup_type(type_name, name)? {
                Some(type_ref) => {
                    let (upper, lower) = self.typed_bounds(&type_ref, &body.packed);
                    self.symbols.types.bind(
                        name,
                        TypedefBinding {
                            type_ref,
                            packed: body.packed.clone(),
                            depth: declared.unpacked.len(),
                            mode: BindingMode::Manual,
                        },
                    );
                    (upper, lower, Mode::Typedef, Some(type_name.clone()))
                }
                None => (None, None, Mode::Manual, Some(type_name.clone())),
            },
            None => {
                let (upper, lower) = match body.data_type.as_deref().and_then(integer_atom_width) {
                    Some(width) if body.packed.is_empty() => {
                        (Some(Bound::Number(width - 1)), Some(Bound::Number(0)))
                    }
                    _ => self.packed_bounds(&body.packed),
                };
                (upper, lower, Mode::Manual, body.data_type.clone())
            }
        };

        let mut observation = Observation::new(name)
            .mode(mode)
            .bounds(upper, lower)
            .depth(declared.unpacked.len())
            .signed(body.signed)
            .line(line);
        if let Some(data_type) = &data_type {
            observation = observation.data_type(data_type);
        }
        if let Some(direction) = direction {
            observation = observation.direction(direction);
        }

        match self.symbols.signals.kind_of(name) {
            Some(existing) if existing != kind && existing != SignalKind::Signal => {
                // e.g. `output q;` then `reg [7:0] q;`
                self.symbols.signals.redeclare(existing, observation);
            }
            Some(SignalKind::Signal) if kind != SignalKind::Signal => {
                self.symbols.signals.promote(name, kind);
                self.symbols.signals.observe(kind, observation);
            }
            _ => {
                self.symbols.signals.observe(kind, observation);
            }
        }
        Ok(())
    }

    /// `type_t name;` with a user type.
    pub(super) fn declare_typed(&mut self, body: &DeclarationBody) -> Result<(), FrontendError> {
        for declared in &body.names {
            self.declare_signal(SignalKind::Signal, None, body, declared)?;
            if let Some(init) = &declared.init {
                self.observe_reads(init);
            }
        }
        Ok(())
    }

    pub(super) fn declare_typedef(&mut self, body: &str) -> Result<(), FrontendError> {
        let Some(typedef) = parse_typedef(body) else {
            self.warn(format!("Cannot parse typedef '{}'", body));
            return Ok(());
        };
        let scope = self.scope.clone();
        match typedef {
            TypedefDecl::Logic { name, dims, signed } => {
                let Some((upper, lower, bitdef)) = self.typedef_range(&dims) else {
                    self.scoped_warning(
                        format!("Cannot resolve range of typedef '{}'; skipped", name),
                        &name,
                    );
                    return Ok(());
                };
                log::debug!("typedef logic {}::{} [{:?}]", scope, name, bitdef);
                self.symbols.types.declare_logic(
                    &scope,
                    TypedefLogic {
                        name,
                        bitdef,
                        upper,
                        lower,
                        signed,
                    },
                );
            }
            TypedefDecl::Enum {
                name,
                base_dims,
                items,
                ..
            } => {
                let members = self.enum_members(&name, &items);
                let base = self.typedef_range(&base_dims).filter(|_| !base_dims.is_empty());
                let (width, bitdef) = match base {
                    Some((upper, lower, bitdef)) => ((upper - lower).abs() + 1, bitdef),
                    None => {
                        let max = members.iter().map(|member| member.value).max().unwrap_or(0);
                        let width = clog2(max + 1).max(1);
                        (width, Some(format!("{}:0", width - 1)))
                    }
                };
                log::debug!("typedef enum {}::{} width {}", scope, name, width);
                self.symbols.types.declare_enum(
                    &scope,
                    TypedefEnum {
                        name,
                        bitdef,
                        members,
                        width,
                    },
                );
            }
            TypedefDecl::Aggregate {
                union,
                name,
                members,
            } => {
                let members = self.aggregate_members(&name, &members)?;
                let widths: Vec<i64> = members.iter().map(|member| member.width).collect();
                let (width, uniform) = aggregate_width(union, &widths);
                if !uniform {
                    self.scoped_warning(
                        format!(
                            "Union '{}' members differ in width; using the last member ({})",
                            name, width
                        ),
                        &name,
                    );
                }
                log::debug!("typedef {}::{} width {}", scope, name, width);
                let aggregate = TypedefAggregate {
                    name,
                    members,
                    width,
                };
                if union {
                    self.symbols.types.declare_union(&scope, aggregate);
                } else {
                    self.symbols.types.declare_struct(&scope, aggregate);
                }
            }
            TypedefDecl::Alias { name, target, dims } => self.declare_alias(&name, &target, &dims)?,
        }
        Ok(())
    }

    /// Numeric `(upper, lower, bitdef)` of typedef dimensions. No dimensions
    /// means a single bit.
    fn typedef_range(&mut self, dims: &[String]) -> Option<(i64, i64, Option<String>)> {
        match dims {
            [] => Some((0, 0, None)),
            [dim] => match evaluate(dim, self) {
                Evaluated::Bitdef {
                    upper: Bound::Number(upper),
                    lower: Bound::Number(lower),
                } => Some((upper, lower, Some(format!("{}:{}", upper, lower)))),
                Evaluated::Number(size) if size > 0 => {
                    Some((size - 1, 0, Some(format!("{}:0", size - 1))))
                }
                _ => None,
            },
            _ => {
                let width = self.packed_factor(dims)?;
                Some((width - 1, 0, Some(format!("{}:0", width - 1))))
            }
        }
    }

    fn enum_members(&mut self, enum_name: &str, items: &[EnumItem]) -> Vec<EnumMember> {
        let mut members = Vec::new();
        let mut next = 0i64;
        for item in items {
            if let Some(value) = &item.value {
                match evaluate(value, self) {
                    Evaluated::Number(value) => next = value,
                    _ => self.scoped_warning(
                        format!("Cannot evaluate value '{}' of enum item {}", value, item.name),
                        enum_name,
                    ),
                }
            }
            let names = match &item.range {
                None => vec![item.name.clone()],
                Some(range) => self.expand_enum_range(&item.name, range, enum_name),
            };
            for name in names {
                members.push(EnumMember { name, value: next });
                next += 1;
            }
        }
        members
    }

    /// `NAME[n]` -> NAME0..NAME(n-1); `NAME[a:b]` -> NAMEa..NAMEb.
    fn expand_enum_range(&mut self, name: &str, range: &str, enum_name: &str) -> Vec<String> {
        let indices: Vec<i64> = match evaluate(range, self) {
            Evaluated::Number(count) => (0..count).collect(),
            Evaluated::Bitdef {
                upper: Bound::Number(from),
                lower: Bound::Number(to),
            } if from <= to => (from..=to).collect(),
            Evaluated::Bitdef {
                upper: Bound::Number(from),
                lower: Bound::Number(to),
            } => (to..=from).rev().collect(),
            _ => {
                self.scoped_warning(
                    format!("Cannot expand enum item {}[{}]", name, range),
                    enum_name,
                );
                return vec![name.to_string()];
            }
        };
        indices.into_iter().map(|index| format!("{}{}", name, index)).collect()
    }

    fn aggregate_members(
        &mut self,
        aggregate: &str,
        members: &[MemberDecl],
    ) -> Result<Vec<StructMember>, FrontendError> {
        let mut resolved = Vec::new();
        for member in members {
            let (type_name, dims, names) = match member {
                MemberDecl::Field {
                    type_name,
                    dims,
                    names,
                } => (type_name, dims, names),
                MemberDecl::Anonymous(text) => {
                    self.scoped_warning(
                        format!("Nested anonymous aggregate '{}' is not supported", text),
                        aggregate,
                    );
                    continue;
                }
            };
            let Some(factor) = self.packed_factor(dims) else {
                self.scoped_warning(
                    format!("Cannot resolve dimensions of member(s) {}", names.join(", ")),
                    aggregate,
                );
                continue;
            };

            let (kind, type_ref, width) = if is_vector_type(type_name) {
                (MemberKind::Logic, None, factor)
            } else if let Some(atom) = integer_atom_width(type_name) {
                (MemberKind::Logic, None, atom * factor)
            } else {
                if let Some((package, _)) = type_name.split_once("::") {
                    self.ensure_package(package.trim())?;
                }
                let found = self.types().lookup(type_name, &self.scope, &self.imports);
                let Some(type_ref) = found else {
                    self.scoped_warning(
                        format!("Unknown member type '{}'", type_name),
                        &format!("{}::{}", aggregate, names.join(",")),
                    );
                    continue;
                };
                let width = self.types().width_of(&type_ref).unwrap_or(0) * factor;
                let kind = match type_ref.kind {
                    TypedefKind::Struct => MemberKind::Struct,
                    TypedefKind::Union => MemberKind::Union,
                    TypedefKind::Logic | TypedefKind::Enum => MemberKind::Logic,
                };
                (kind, Some(type_ref), width)
            };

            for name in names {
                resolved.push(StructMember {
                    name: name.clone(),
                    kind,
                    type_ref: type_ref.clone(),
                    width,
                });
            }
        }
        Ok(resolved)
    }

    /// `typedef other_t [n:0] new_t;` copies `other_t` under a new name.
    fn declare_alias(&mut self, name: &str, target: &str, dims: &[String]) -> Result<(), FrontendError> {
        if let Some((package, _)) = target.split_once("::") {
            self.ensure_package(package.trim())?;
        }
        let scope = self.scope.clone();
        let Some(type_ref) = self.types().lookup(target, &self.scope, &self.imports) else {
            self.scoped_warning(format!("Unknown typedef '{}'", target), name);
            return Ok(());
        };
        let Some(factor) = self.packed_factor(dims) else {
            self.scoped_warning(format!("Cannot resolve dimensions of '{}'", name), name);
            return Ok(());
        };

        match type_ref.kind {
            TypedefKind::Struct | TypedefKind::Union if factor == 1 => {
                if let Some(aggregate) = self.types().aggregate(&type_ref).cloned() {
                    let aggregate = TypedefAggregate {
                        name: name.to_string(),
                        ..aggregate
                    };
                    if type_ref.kind == TypedefKind::Union {
                        self.symbols.types.declare_union(&scope, aggregate);
                    } else {
                        self.symbols.types.declare_struct(&scope, aggregate);
                    }
                }
            }
            TypedefKind::Enum if factor == 1 => {
                if let Some(enumeration) = self.types().enumeration(&type_ref).cloned() {
                    self.symbols.types.declare_enum(
                        &scope,
                        TypedefEnum {
                            name: name.to_string(),
                            ..enumeration
                        },
                    );
                }
            }
            _ => {
                let Some(width) = self.types().width_of(&type_ref) else {
                    return Ok(());
                };
                let width = width * factor;
                let signed = self
                    .types()
                    .logic(&type_ref)
                    .map_or(false, |logic| logic.signed);
                self.symbols.types.declare_logic(
                    &scope,
                    TypedefLogic {
                        name: name.to_string(),
                        bitdef: Some(format!("{}:0", width - 1)),
                        upper: width - 1,
                        lower: 0,
                        signed,
                    },
                );
            }
        }
        Ok(())
    }
}
