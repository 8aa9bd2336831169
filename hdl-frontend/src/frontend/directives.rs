use crate::classify::parse_declaration_body;
use crate::construct::ConstructKind;
use crate::directive::{force_names, Directive};
use crate::instance::{parse_connect, ParamOverride};
use crate::scan::{first_word, leading_dimensions};
use crate::symbols::Edge;
use crate::types::{BindingMode, TypedefBinding};
use crate::unify::{Mode, Observation, PortDirection, SignalKind};
use crate::FrontendError;

use super::instantiate::{PendingInstance, Wiring};
use super::{Frontend, Region};

/// An open `&Posedge`/`&Negedge` region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct EdgeRegion {
    pub edge: Edge,
    pub clock: String,
    pub reset: Option<String>,
}

impl Frontend {
    pub(super) fn handle_directive(&mut self, directive: Directive) -> Result<(), FrontendError> {
        match directive {
            Directive::ParserOff => self.parser_off = true,
            Directive::ParserOn => self.parser_off = false,
            Directive::SkipIfdefBegin => self.skip_ifdef = true,
            Directive::SkipIfdefEnd => self.skip_ifdef = false,
            _ if self.parser_off || self.region != Region::Module => {}
            Directive::BeginInstance {
                module,
                instance,
                file,
            } => {
                if let Some(previous) = self.pending_instance.take() {
                    self.error(format!(
                        "&BeginInstance {} while {} is still open",
                        module, previous.module
                    ));
                }
                self.pending_instance = Some(PendingInstance {
                    name: instance.unwrap_or_else(|| format!("x_{}", module)),
                    module,
                    file,
                    rules: Vec::new(),
                    overrides: Vec::new(),
                    line: self.location.line,
                });
            }
            Directive::Connect(tokens) => {
                let rule = parse_connect(&tokens);
                match (self.pending_instance.as_mut(), rule) {
                    (Some(pending), Ok(rule)) => pending.rules.push(rule),
                    (Some(_), Err(message)) => self.error(format!("&Connect: {}", message)),
                    (None, _) => self.error("&Connect outside &BeginInstance".to_string()),
                }
            }
            Directive::Param { name, value } => match self.pending_instance.as_mut() {
                Some(pending) => pending.overrides.push(ParamOverride { name, value }),
                None => self.error("&Param outside &BeginInstance".to_string()),
            },
            Directive::EndInstance => match self.pending_instance.take() {
                Some(pending) if self.config.resolve_instances => {
                    let wiring = Wiring::Rules(pending.rules);
                    self.resolve_instance(
                        &pending.module,
                        &pending.name,
                        pending.file.as_deref(),
                        pending.overrides,
                        wiring,
                    )?;
                }
                Some(_) => {}
                None => self.error("&EndInstance without &BeginInstance".to_string()),
            },
            Directive::Edge { edge, clock, reset } => self.open_edge_region(edge, clock, reset),
            Directive::EndEdge(edge) => match self.edge_region.take() {
                Some(region) if region.edge == edge => {
                    if self.constructs.close_block().is_err() {
                        self.error(format!("&End{:?} does not close its region", edge));
                    }
                }
                Some(region) => {
                    self.error(format!("&End{:?} closes a {:?} region", edge, region.edge));
                    self.edge_region = Some(region);
                }
                None => self.error(format!("&End{:?} without an open region", edge)),
            },
            Directive::Force(body) => self.force(&body)?,
            Directive::Unknown(name) => self.warn(format!("Unknown directive &{}", name)),
        }
        Ok(())
    }

    fn open_edge_region(&mut self, edge: Edge, clock: String, reset: Option<String>) {
        if let Some(previous) = &self.edge_region {
            self.error(format!(
                "&{:?} opened inside an open &{:?} region",
                edge, previous.edge
            ));
            return;
        }
        let line = self.location.line;
        self.constructs.push(ConstructKind::AlwaysFf, line);
        self.constructs.open_block(line);

        for name in std::iter::once(clock.as_str()).chain(reset.as_deref()) {
            self.observe_name(name, SignalKind::Signal, Observation::new(name).line(line));
        }
        self.edge_region = Some(EdgeRegion { edge, clock, reset });
    }

    /// `&Force <kind> [range] names;` pins the listed signals.
    fn force(&mut self, body: &str) -> Result<(), FrontendError> {
        let keyword = first_word(body);
        let rest = body[keyword.len()..].trim();
        let (kind, direction) = match keyword {
            "input" | "output" | "inout" => (SignalKind::Port, PortDirection::from_keyword(keyword)),
            "wire" => (SignalKind::Wire, None),
            "reg" | "logic" => (SignalKind::Reg, None),
            _ => {
                self.error(format!("&Force needs a signal kind, found '{}'", keyword));
                return Ok(());
            }
        };

        let declaration = parse_declaration_body(rest);
        if let Some(type_name) = declaration.type_name.clone() {
            for declared in &declaration.names {
                let Some(type_ref) = self.lookup_type(&type_name, &declared.name)? else {
                    continue;
                };
                let (upper, lower) = self.typed_bounds(&type_ref, &declaration.packed);
                let mut observation = Observation::new(&declared.name)
                    .mode(Mode::Force)
                    .bounds(upper, lower)
                    .data_type(&type_name)
                    .line(self.location.line);
                if let Some(direction) = direction {
                    observation = observation.direction(direction);
                }
                self.symbols.signals.observe(kind, observation);
                self.symbols.types.bind(
                    &declared.name,
                    TypedefBinding {
                        type_ref,
                        packed: declaration.packed.clone(),
                        depth: declared.unpacked.len(),
                        mode: BindingMode::Force,
                    },
                );
            }
            return Ok(());
        }

        let (dims, names) = leading_dimensions(rest);
        let (upper, lower) = self.packed_bounds(&dims);
        for name in force_names(names) {
            let mut observation = Observation::new(&name)
                .mode(Mode::Force)
                .bounds(upper.clone(), lower.clone())
                .line(self.location.line);
            if let Some(direction) = direction {
                observation = observation.direction(direction);
            }
            log::debug!("Forcing {:?} {}", kind, name);
            self.symbols.signals.observe(kind, observation);
        }
        Ok(())
    }
}

