use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::instance::Instance;
use crate::types::TypeTable;
use crate::unify::{SignalKind, SignalRecord, SignalTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Edge {
    Posedge,
    Negedge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub text: String,
    pub value: Option<i64>,
    pub local: bool,
}

impl Parameter {
    /// Text substituted for the parameter inside expressions.
    pub fn substitution(&self) -> String {
        match self.value {
            Some(value) => value.to_string(),
            None => self.text.clone(),
        }
    }
}

/// Default value a register takes on reset, captured from `lhs <= rhs, value;`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetEntry {
    pub signal: String,
    pub value: String,
    pub edge: Option<Edge>,
    pub clock: Option<String>,
    pub reset: Option<String>,
    pub line: usize,
}

/// Everything recovered from one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolTable {
    pub module: Option<String>,
    pub signals: SignalTable,
    pub parameters: BTreeMap<String, Parameter>,
    pub types: TypeTable,
    pub instances: Vec<Instance>,
    pub resets: Vec<ResetEntry>,
    pub functions: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(&self, name: &str) -> Option<&SignalRecord> {
        self.signals.ports.get(name)
    }

    pub fn reg(&self, name: &str) -> Option<&SignalRecord> {
        self.signals.regs.get(name)
    }

    pub fn wire(&self, name: &str) -> Option<&SignalRecord> {
        self.signals.wires.get(name)
    }

    pub fn signal(&self, name: &str) -> Option<&SignalRecord> {
        self.signals.signals.get(name)
    }

    pub fn find(&self, name: &str) -> Option<&SignalRecord> {
        self.signals.find(name)
    }

    pub fn ports(&self) -> Vec<&SignalRecord> {
        self.signals.ordered(SignalKind::Port)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|instance| instance.name == name)
    }
}
