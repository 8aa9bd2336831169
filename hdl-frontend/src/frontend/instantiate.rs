//! Submodule instances: parsing the submodule in a child context, wiring its
//! ports and synthesizing the nets they connect to.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::eval::{evaluate, Bound, Evaluated};
use crate::instance::{
    apply_rules, parse_connections, parse_overrides, substitute_parameters, ConnectRule,
    Connections, Instance, InstancePort, ParamOverride,
};
use crate::scan::is_identifier;
use crate::types::{BindingMode, TypedefBinding};
use crate::unify::{Observation, PortDirection, SignalKind};
use crate::{FrontendError, SourceKind};

use super::{Dialect, Frontend};

/// An `&BeginInstance` block still collecting its directives.
#[derive(Debug)]
pub(super) struct PendingInstance {
    pub module: String,
    pub name: String,
    pub file: Option<String>,
    pub rules: Vec<ConnectRule>,
    pub overrides: Vec<ParamOverride>,
    pub line: usize,
}

/// How an instance's ports get connected.
pub(super) enum Wiring {
    /// Every port by name, then the `&Connect` rules in order.
    Rules(Vec<ConnectRule>),
    /// An instantiation written out in the source.
    Written(Connections),
}

impl Frontend {
    pub(super) fn instantiate(
        &mut self,
        module: &str,
        parameters: Option<&str>,
        instance: &str,
        connections: &str,
    ) -> Result<(), FrontendError> {
        let overrides = match parameters {
            Some(text) => {
                let (named, positional) = parse_overrides(text);
                if !positional.is_empty() {
                    self.warn(format!(
                        "Positional parameter overrides on {} are not supported; ignored",
                        instance
                    ));
                }
                named
            }
            None => Vec::new(),
        };
        let wiring = Wiring::Written(parse_connections(connections));
        self.resolve_instance(module, instance, None, overrides, wiring)
    }

    pub(super) fn resolve_instance(
        &mut self,
        module: &str,
        name: &str,
        file: Option<&str>,
        overrides: Vec<ParamOverride>,
        wiring: Wiring,
    ) -> Result<(), FrontendError> {
        let path = self.locate_instance_source(module, file)?;
        log::info!(
            "Resolving instance {} of {} from {}",
            name,
            module,
            path.display()
        );

        // override values are expressions of the instantiating module
        let mut forced = HashMap::new();
        for parameter in &overrides {
            let value = match evaluate(&parameter.value, self) {
                Evaluated::Number(value) => value.to_string(),
                _ => parameter.value.clone(),
            };
            forced.insert(parameter.name.clone(), value);
        }

        let mut child = self.child(module, forced);
        child.load_file(&path)?;
        if child.symbols.module.is_none() {
            return Err(FrontendError::MissingSource {
                kind: SourceKind::Module,
                name: module.to_string(),
                location: self.location.clone(),
            });
        }
        for parameter in &overrides {
            let known = child
                .symbols
                .parameter(&parameter.name)
                .map_or(false, |declared| !declared.local);
            if !known {
                return Err(FrontendError::UnknownParameter {
                    module: module.to_string(),
                    instance: name.to_string(),
                    parameter: parameter.name.clone(),
                    location: self.location.clone(),
                });
            }
        }

        let scope = format!("{}::{}", module, name);
        for diagnostic in child.diagnostics.drain(..) {
            let diagnostic = match diagnostic.scope {
                Some(_) => diagnostic,
                None => diagnostic.with_scope(scope.clone()),
            };
            self.diagnostics.push(diagnostic);
        }

        let mut ports: Vec<InstancePort> = child
            .symbols
            .ports()
            .into_iter()
            .map(|record| InstancePort {
                name: record.name.clone(),
                direction: record.direction.unwrap_or(PortDirection::Input),
                sub_bitdef: record.bitdef.clone(),
                sub_upper: record.upper.clone(),
                sub_lower: record.lower.clone(),
                top: None,
                top_bitdef: None,
                top_upper: None,
                top_lower: None,
                connected: false,
            })
            .collect();
        self.connect_ports(module, name, &mut ports, wiring)?;

        let values: Vec<(String, String)> = child
            .symbols
            .parameters
            .values()
            .map(|parameter| (parameter.name.clone(), parameter.substitution()))
            .collect();
        for port in ports.iter_mut().filter(|port| port.connected) {
            let (upper, lower) = self.translate_bounds(port, &values);
            port.top_bitdef = match (&upper, &lower) {
                (Some(upper), Some(lower)) => Some(format!("{}:{}", upper, lower)),
                (Some(upper), None) => Some(upper.to_string()),
                _ => None,
            };
            port.top_upper = upper;
            port.top_lower = lower;
        }
        for port in &ports {
            self.bind_instance_net(port, &child);
        }

        self.symbols.instances.push(Instance {
            module: module.to_string(),
            name: name.to_string(),
            path,
            ports,
            parameters: overrides,
        });
        Ok(())
    }

    fn locate_instance_source(&self, module: &str, file: Option<&str>) -> Result<PathBuf, FrontendError> {
        let found = match file {
            Some(file) => self
                .locator
                .locate_include(file, self.location.file.as_deref()),
            None => self.locator.locate_module(module),
        };
        found.ok_or_else(|| FrontendError::MissingSource {
            kind: SourceKind::Module,
            name: file.unwrap_or(module).to_string(),
            location: self.location.clone(),
        })
    }

    fn connect_ports(
        &mut self,
        module: &str,
        instance: &str,
        ports: &mut [InstancePort],
        wiring: Wiring,
    ) -> Result<(), FrontendError> {
        let rules = match wiring {
            Wiring::Rules(rules) => {
                connect_by_name(ports);
                rules
            }
            Wiring::Written(connections) => {
                if connections.wildcard {
                    connect_by_name(ports);
                }
                if connections.positional.len() > ports.len() {
                    self.warn(format!(
                        "{} has {} ports but {} positional connections",
                        instance,
                        ports.len(),
                        connections.positional.len()
                    ));
                }
                for (port, top) in ports.iter_mut().zip(connections.positional) {
                    port.top = Some(top);
                    port.connected = true;
                }
                connections
                    .named
                    .into_iter()
                    .map(|(sub, top)| match top {
                        Some(top) => ConnectRule::Direct { sub, top },
                        None => ConnectRule::Unconnected { sub },
                    })
                    .collect()
            }
        };
        apply_rules(ports, &rules).map_err(|port| FrontendError::UnknownPort {
            module: module.to_string(),
            instance: instance.to_string(),
            port,
            location: self.location.clone(),
        })
    }

    /// Submodule port range in terms of the instantiating module: the
    /// submodule's parameter values are substituted into its range text,
    /// which is then evaluated here.
    fn translate_bounds(
        &mut self,
        port: &InstancePort,
        values: &[(String, String)],
    ) -> (Option<Bound>, Option<Bound>) {
        let Some(bitdef) = &port.sub_bitdef else {
            return (None, None);
        };
        let substituted = substitute_parameters(bitdef, values);
        match evaluate(&substituted, self) {
            Evaluated::Bitdef { upper, lower } => (Some(upper), Some(lower)),
            _ => (port.sub_upper.clone(), port.sub_lower.clone()),
        }
    }

    /// Makes sure the net on the parent side of `port` exists. Outputs become
    /// wires in Verilog and bare signals in SystemVerilog; inputs are bare
    /// signals.
    fn bind_instance_net(&mut self, port: &InstancePort, child: &Frontend) {
        let Some(top) = port.top.as_deref().filter(|_| port.connected) else {
            return;
        };
        let kind = match (port.direction, self.config.dialect) {
            (PortDirection::Input, _) => SignalKind::Signal,
            (_, Dialect::Verilog) => SignalKind::Wire,
            (_, Dialect::SystemVerilog) => SignalKind::Signal,
        };

        if !is_identifier(top) {
            match port.direction {
                PortDirection::Input => self.observe_reads(top),
                _ => self.drive(top, kind),
            }
            return;
        }
        if self.is_constant_name(top) {
            return;
        }
        let observation = Observation::new(top)
            .bounds(port.top_upper.clone(), port.top_lower.clone())
            .line(self.location.line);
        self.observe_name(top, kind, observation);

        // a port typed from a package keeps its type on the parent net
        let Some(binding) = child.types().binding(&port.name) else {
            return;
        };
        if binding.type_ref.scope.is_root() || self.types().binding(top).is_some() {
            return;
        }
        if self.ensure_package(&binding.type_ref.scope.package).is_ok() {
            self.symbols.types.bind(
                top,
                TypedefBinding {
                    mode: BindingMode::Auto,
                    ..binding.clone()
                },
            );
        }
    }
}

fn connect_by_name(ports: &mut [InstancePort]) {
    for port in ports.iter_mut() {
        port.top = Some(port.name.clone());
        port.connected = true;
    }
}
