//! Statements inside the extracted module: procedural constructs, assignments
//! and the signal observations they imply.

use crate::classify::{classify, AlwaysKind, CaseKind, Statement};
use crate::construct::ConstructKind;
use crate::eval::{evaluate, Bound, Evaluated};
use crate::extract::{signal_references, SignalRef};
use crate::generate::parse_for_header;
use crate::scan::{first_word, split_part_select};
use crate::symbols::ResetEntry;
use crate::unify::{Observation, SignalKind};
use crate::FrontendError;

use super::{Frontend, Region};

impl Frontend {
    pub(super) fn handle_module_text(&mut self, text: &str) -> Result<(), FrontendError> {
        self.constructs.before_statement(first_word(text) == "else");
        let line = self.location.line;

        match classify(text, self.constructs.in_case_body()) {
            Statement::Module(header) => {
                self.warn(format!("Nested module '{}' ignored", header.name));
            }
            Statement::EndModule => self.leave_module(),
            Statement::Class { name } => {
                self.scope.class = name;
                self.symbols.types.ensure_scope(&self.scope);
            }
            Statement::Import { items } => self.import(&items)?,
            Statement::Parameter { local, body } => {
                self.declare_parameters(&body, local);
                self.constructs.complete_statement();
            }
            Statement::Typedef { body } => self.declare_typedef(&body)?,
            Statement::Function { name, .. } => self.enter_subroutine(&name, text),
            Statement::Genvar { names } => self.genvars.extend(names),
            Statement::Integer { names } => {
                self.integers.extend(names);
                self.constructs.complete_statement();
            }
            Statement::PortDeclaration { direction, body } => self.declare_port(direction, &body)?,
            Statement::NetDeclaration(body) => {
                self.declare_net(&body)?;
                self.constructs.complete_statement();
            }
            Statement::TypedDeclaration(body) => {
                self.declare_typed(&body)?;
                self.constructs.complete_statement();
            }
            Statement::Always {
                kind,
                sensitivity,
                rest,
            } => {
                let frame = match kind {
                    AlwaysKind::Ff => ConstructKind::AlwaysFf,
                    AlwaysKind::Comb => ConstructKind::AlwaysCombo,
                };
                self.constructs.push(frame, line);
                if let Some(list) = sensitivity {
                    self.observe_reads(&list);
                }
                self.handle_rest(&rest)?;
            }
            Statement::Initial { rest } => {
                self.constructs.push(ConstructKind::Initial, line);
                self.handle_rest(&rest)?;
            }
            Statement::If { condition, rest } => {
                self.observe_reads(&condition);
                self.constructs.push(ConstructKind::If, line);
                self.handle_rest(&rest)?;
            }
            Statement::ElseIf { condition, rest } => {
                self.observe_reads(&condition);
                self.constructs.push(ConstructKind::ElseIf, line);
                self.handle_rest(&rest)?;
            }
            Statement::Else { rest } => {
                self.constructs.push(ConstructKind::Else, line);
                self.handle_rest(&rest)?;
            }
            Statement::Case {
                kind,
                expression,
                rest,
            } => {
                if kind == CaseKind::Casex {
                    return Err(FrontendError::Disallowed {
                        construct: "casex".to_string(),
                        location: self.location.clone(),
                    });
                }
                self.observe_reads(&expression);
                self.constructs.push(ConstructKind::CaseCondition, line);
                self.handle_rest(&rest)?;
            }
            Statement::CaseItem { label, rest } => {
                if label != "default" {
                    self.observe_reads(&label);
                }
                self.constructs.push(ConstructKind::CaseExpression, line);
                self.handle_rest(&rest)?;
            }
            Statement::EndCase => {
                if self.constructs.close_case().is_err() {
                    self.error("'endcase' without a matching case".to_string());
                }
            }
            Statement::For { header, rest } => self.enter_for(&header, &rest)?,
            Statement::Loop { rest } => {
                self.constructs.push(ConstructKind::For, line);
                self.handle_rest(&rest)?;
            }
            Statement::Begin { rest, .. } => {
                self.constructs.open_block(line);
                self.handle_rest(&rest)?;
            }
            Statement::End { rest } => {
                if self.constructs.close_block().is_err() {
                    self.error("'end' without a matching 'begin'".to_string());
                }
                self.handle_rest(&rest)?;
            }
            Statement::ContinuousAssign { lhs, rhs } => {
                self.drive(&lhs, SignalKind::Wire);
                self.observe_reads(&rhs);
                self.constructs.complete_statement();
            }
            Statement::Assignment {
                lhs,
                rhs,
                nonblocking,
                reset,
            } => {
                let kind = if self.constructs.in_procedural() {
                    SignalKind::Reg
                } else {
                    SignalKind::Wire
                };
                self.drive(&lhs, kind);
                self.observe_reads(&rhs);
                if let (true, Some(value)) = (nonblocking, reset) {
                    if self.constructs.in_sequential() {
                        self.record_reset(&lhs, &value);
                    } else {
                        self.warn(format!(
                            "Reset value '{}' for '{}' outside a sequential block is ignored",
                            value, lhs
                        ));
                    }
                }
                self.constructs.complete_statement();
            }
            Statement::Instantiation {
                module,
                parameters,
                instance,
                connections,
            } => {
                if self.config.resolve_instances {
                    self.instantiate(&module, parameters.as_deref(), &instance, &connections)?;
                }
                self.constructs.complete_statement();
            }
            Statement::Directive(directive) => self.handle_directive(directive)?,
            Statement::Other => {
                if text.trim_end().ends_with(';') {
                    self.constructs.complete_statement();
                }
            }
            Statement::Package { .. }
            | Statement::EndPackage
            | Statement::EndClass
            | Statement::EndSubroutine
            | Statement::Generate
            | Statement::EndGenerate => {}
        }
        Ok(())
    }

    fn handle_rest(&mut self, rest: &str) -> Result<(), FrontendError> {
        if rest.trim().is_empty() {
            Ok(())
        } else {
            self.handle_module_text(rest)
        }
    }

    fn leave_module(&mut self) {
        if self.constructs.depth() > 0 {
            self.warn(format!(
                "{} construct(s) still open at endmodule",
                self.constructs.depth()
            ));
        }
        if let Some(pending) = self.pending_instance.take() {
            self.error(format!(
                "&BeginInstance {} at line {} has no &EndInstance",
                pending.module, pending.line
            ));
        }
        if let Some(region) = self.edge_region.take() {
            self.error(format!("&{:?} region still open at endmodule", region.edge));
        }
        if let Some(module) = &self.symbols.module {
            log::info!("Finished module {}", module);
        }
        self.constructs.reset();
        self.generate.reset();
        self.region = Region::Outside;
    }

    fn enter_for(&mut self, header: &str, rest: &str) -> Result<(), FrontendError> {
        self.constructs.push(ConstructKind::For, self.location.line);
        match parse_for_header(header) {
            Some(parsed) => {
                self.loop_variables.insert(parsed.variable.clone());
                let mut generate = std::mem::take(&mut self.generate);
                generate.enter(&parsed, self);
                self.generate = generate;
            }
            None => self.warn(format!("Cannot expand loop header '{}'", header)),
        }
        let rest = self.generate.rewrite(rest);
        self.handle_rest(&rest)
    }

    /// Names that are values rather than signals.
    pub(super) fn is_constant_name(&self, name: &str) -> bool {
        self.symbols.parameters.contains_key(name)
            || self.genvars.contains(name)
            || self.integers.contains(name)
            || self.loop_variables.contains(name)
            || self.symbols.functions.contains(name)
            || self.scoped_value(name).is_some()
            || self.types().lookup(name, &self.scope, &self.imports).is_some()
    }

    pub(super) fn observe_reads(&mut self, text: &str) {
        for reference in signal_references(text) {
            self.observe_reference(&reference, SignalKind::Signal);
        }
    }

    /// Observes every name on an assignment's left-hand side as driven.
    pub(super) fn drive(&mut self, lhs: &str, kind: SignalKind) {
        for reference in signal_references(lhs) {
            let kind = if reference.nested {
                SignalKind::Signal
            } else {
                kind
            };
            self.observe_reference(&reference, kind);
        }
    }

    fn observe_reference(&mut self, reference: &SignalRef, kind: SignalKind) {
        if self.is_constant_name(&reference.name) {
            return;
        }
        let mut observation = Observation::new(&reference.name).line(self.location.line);
        if reference.member.is_none() {
            // unpacked selects come first and carry no width
            let depth = self
                .symbols
                .find(&reference.name)
                .map_or(0, |record| record.depth);
            if let Some(select) = reference.selects.get(depth) {
                if let Some((upper, lower)) = self.select_bounds(select) {
                    observation = observation.range(upper, lower);
                }
            }
        }
        self.observe_name(&reference.name, kind, observation);
    }

    /// Unifies into whichever table already holds the name. A driven AUTO
    /// bare signal is promoted first.
    pub(super) fn observe_name(&mut self, name: &str, kind: SignalKind, observation: Observation) {
        let target = match self.symbols.signals.kind_of(name) {
            Some(SignalKind::Signal) if matches!(kind, SignalKind::Reg | SignalKind::Wire) => {
                self.symbols.signals.promote(name, kind);
                self.symbols.signals.kind_of(name).unwrap_or(kind)
            }
            Some(existing) => existing,
            None => kind,
        };
        self.symbols.signals.observe(target, observation);
    }

    /// Range implied by one select: `[u:l]`, `[b+:w]`, `[b-:w]`, or `[n]`
    /// which implies at least `n:0`.
    fn select_bounds(&mut self, select: &str) -> Option<(Bound, Bound)> {
        if let Some((base, width, ascending)) = split_part_select(select) {
            let base = evaluate(base, self).as_number()?;
            let width = evaluate(width, self).as_number()?;
            return Some(if ascending {
                (Bound::Number(base + width - 1), Bound::Number(base))
            } else {
                (Bound::Number(base), Bound::Number(base - width + 1))
            });
        }
        match evaluate(select, self) {
            Evaluated::Number(index) => Some((Bound::Number(index), Bound::Number(0))),
            Evaluated::Bitdef { upper, lower } => {
                if self.is_indefinite(&upper) || self.is_indefinite(&lower) {
                    None
                } else {
                    Some((upper, lower))
                }
            }
            Evaluated::Text(_) => None,
        }
    }

    /// A textual bound that names a loop variable or still holds a range.
    fn is_indefinite(&self, bound: &Bound) -> bool {
        let Bound::Text(text) = bound else {
            return false;
        };
        text.contains(':')
            || signal_references(text).iter().any(|reference| {
                self.loop_variables.contains(&reference.name)
                    || self.integers.contains(&reference.name)
                    || self.genvars.contains(&reference.name)
                    || self.symbols.find(&reference.name).is_some()
            })
    }

    fn record_reset(&mut self, lhs: &str, value: &str) {
        let Some(reference) = signal_references(lhs)
            .into_iter()
            .find(|reference| !reference.nested)
        else {
            return;
        };
        let (edge, clock, reset) = match &self.edge_region {
            Some(region) => (
                Some(region.edge),
                Some(region.clock.clone()),
                region.reset.clone(),
            ),
            None => (None, None, None),
        };
        log::debug!("Reset value of {} is {}", reference.name, value);
        self.symbols.resets.push(ResetEntry {
            signal: reference.name,
            value: value.to_string(),
            edge,
            clock,
            reset,
            line: self.location.line,
        });
    }
}
