//! Reconciles every observation of a signal into one record per name.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::eval::Bound;
use crate::keywords::is_reserved_keyword;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SignalKind {
    Port,
    Reg,
    Wire,
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Auto,
    Manual,
    Force,
    Typedef,
}

impl Mode {
    /// Pinned records ignore inferred widths.
    pub fn is_pinned(self) -> bool {
        matches!(self, Mode::Manual | Mode::Force)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl PortDirection {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "input" => Some(PortDirection::Input),
            "output" => Some(PortDirection::Output),
            "inout" => Some(PortDirection::Inout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalRecord {
    pub name: String,
    pub kind: SignalKind,
    pub direction: Option<PortDirection>,
    /// `upper:lower` as text, absent for an unranged scalar.
    pub bitdef: Option<String>,
    pub upper: Option<Bound>,
    pub lower: Option<Bound>,
    pub depth: usize,
    pub signed: bool,
    pub mode: Mode,
    /// Net or type keyword from the declaration (`wire`, `logic`, a typedef).
    pub data_type: Option<String>,
    pub order: usize,
    pub line: usize,
}

impl SignalRecord {
    /// Bit width when both bounds are numeric; 1 for an unranged scalar.
    pub fn width(&self) -> Option<i64> {
        match (&self.upper, &self.lower) {
            (None, None) => Some(1),
            (Some(Bound::Number(upper)), Some(Bound::Number(lower))) => {
                Some((upper - lower).abs() + 1)
            }
            _ => None,
        }
    }

    fn refresh_bitdef(&mut self) {
        self.bitdef = match (&self.upper, &self.lower) {
            (Some(upper), Some(lower)) => Some(format!("{}:{}", upper, lower)),
            (Some(upper), None) => Some(upper.to_string()),
            _ => None,
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub name: String,
    pub mode: Mode,
    pub upper: Option<Bound>,
    pub lower: Option<Bound>,
    pub depth: Option<usize>,
    pub signed: Option<bool>,
    pub direction: Option<PortDirection>,
    pub data_type: Option<String>,
    pub line: usize,
}

impl Observation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Auto,
            upper: None,
            lower: None,
            depth: None,
            signed: None,
            direction: None,
            data_type: None,
            line: 0,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn range(mut self, upper: Bound, lower: Bound) -> Self {
        self.upper = Some(upper);
        self.lower = Some(lower);
        self
    }

    pub fn bounds(mut self, upper: Option<Bound>, lower: Option<Bound>) -> Self {
        self.upper = upper;
        self.lower = lower;
        self
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = Some(signed);
        self
    }

    pub fn direction(mut self, direction: PortDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn data_type(mut self, data_type: &str) -> Self {
        self.data_type = Some(data_type.to_string());
        self
    }

    pub fn line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    /// The record is MANUAL/FORCE and kept as it was.
    Pinned,
    /// The name is a reserved word.
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalTable {
    pub ports: BTreeMap<String, SignalRecord>,
    pub regs: BTreeMap<String, SignalRecord>,
    pub wires: BTreeMap<String, SignalRecord>,
    pub signals: BTreeMap<String, SignalRecord>,
    #[serde(skip)]
    next_order: usize,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, kind: SignalKind) -> &BTreeMap<String, SignalRecord> {
        match kind {
            SignalKind::Port => &self.ports,
            SignalKind::Reg => &self.regs,
            SignalKind::Wire => &self.wires,
            SignalKind::Signal => &self.signals,
        }
    }

    fn table_mut(&mut self, kind: SignalKind) -> &mut BTreeMap<String, SignalRecord> {
        match kind {
            SignalKind::Port => &mut self.ports,
            SignalKind::Reg => &mut self.regs,
            SignalKind::Wire => &mut self.wires,
            SignalKind::Signal => &mut self.signals,
        }
    }

    /// Table holding `name`, checked in port, reg, wire, signal order.
    pub fn kind_of(&self, name: &str) -> Option<SignalKind> {
        [
            SignalKind::Port,
            SignalKind::Reg,
            SignalKind::Wire,
            SignalKind::Signal,
        ]
        .into_iter()
        .find(|kind| self.table(*kind).contains_key(name))
    }

    pub fn find(&self, name: &str) -> Option<&SignalRecord> {
        self.kind_of(name)
            .and_then(|kind| self.table(kind).get(name))
    }

    /// Records of one kind in the order they were first seen.
    pub fn ordered(&self, kind: SignalKind) -> Vec<&SignalRecord> {
        let mut records: Vec<&SignalRecord> = self.table(kind).values().collect();
        records.sort_by_key(|record| record.order);
        records
    }

    pub fn observe(&mut self, kind: SignalKind, observation: Observation) -> Outcome {
        if is_reserved_keyword(&observation.name) {
            log::warn!(
                "Ignoring reserved word '{}' used as a signal name",
                observation.name
            );
            return Outcome::Rejected;
        }

        let order = self.next_order;
        let table = self.table_mut(kind);
        let Some(record) = table.get_mut(&observation.name) else {
            let mut record = SignalRecord {
                name: observation.name.clone(),
                kind,
                direction: observation.direction,
                bitdef: None,
                upper: observation.upper,
                lower: observation.lower,
                depth: observation.depth.unwrap_or(0),
                signed: observation.signed.unwrap_or(false),
                mode: observation.mode,
                data_type: observation.data_type,
                order,
                line: observation.line,
            };
            record.refresh_bitdef();
            table.insert(observation.name, record);
            self.next_order += 1;
            return Outcome::Created;
        };

        if record.mode.is_pinned() {
            log::debug!(
                "{} '{}' is {:?}; ignoring inferred range",
                kind_label(kind),
                record.name,
                record.mode
            );
            return Outcome::Pinned;
        }

        let before = record.clone();
        if observation.mode.is_pinned() {
            record.upper = observation.upper;
            record.lower = observation.lower;
            record.mode = observation.mode;
            record.depth = observation.depth.unwrap_or(record.depth);
            record.signed = observation.signed.unwrap_or(record.signed);
        } else {
            record.upper = merge_bound(record.upper.take(), observation.upper, i64::max);
            record.lower = merge_bound(record.lower.take(), observation.lower, i64::min);
            if let Some(depth) = observation.depth {
                record.depth = depth;
            }
            if let Some(signed) = observation.signed {
                record.signed = signed;
            }
            if observation.mode == Mode::Typedef {
                record.mode = Mode::Typedef;
            }
        }
        if observation.direction.is_some() {
            record.direction = observation.direction;
        }
        if observation.data_type.is_some() {
            record.data_type = observation.data_type;
        }
        record.refresh_bitdef();

        if *record == before {
            Outcome::Unchanged
        } else {
            Outcome::Updated
        }
    }

    /// A second declaration of an existing record, e.g. `output q;` followed
    /// by `reg [7:0] q;`. A range on the new declaration replaces the old one
    /// unless the record was forced.
    pub fn redeclare(&mut self, kind: SignalKind, observation: Observation) -> Outcome {
        let Some(record) = self.table_mut(kind).get_mut(&observation.name) else {
            return self.observe(kind, observation);
        };
        if record.mode == Mode::Force {
            log::debug!("{} '{}' is forced; ignoring redeclaration", kind_label(kind), record.name);
            return Outcome::Pinned;
        }
        let before = record.clone();
        if observation.upper.is_some() {
            record.upper = observation.upper;
            record.lower = observation.lower;
        }
        if let Some(depth) = observation.depth.filter(|depth| *depth > 0) {
            record.depth = depth;
        }
        if observation.signed == Some(true) {
            record.signed = true;
        }
        if observation.data_type.is_some() {
            record.data_type = observation.data_type;
        }
        record.refresh_bitdef();
        if *record == before {
            Outcome::Unchanged
        } else {
            Outcome::Updated
        }
    }

    /// Moves an AUTO bare signal into the reg or wire table once it is driven.
    /// Returns false when there was nothing to move.
    pub fn promote(&mut self, name: &str, to: SignalKind) -> bool {
        let movable = self
            .signals
            .get(name)
            .map_or(false, |record| record.mode == Mode::Auto);
        if !movable || to == SignalKind::Signal {
            return false;
        }
        let Some(mut record) = self.signals.remove(name) else {
            return false;
        };
        record.kind = to;
        let target = self.table_mut(to);
        match target.get_mut(name) {
            Some(existing) => {
                existing.upper = merge_bound(existing.upper.take(), record.upper, i64::max);
                existing.lower = merge_bound(existing.lower.take(), record.lower, i64::min);
                existing.order = existing.order.min(record.order);
                existing.refresh_bitdef();
            }
            None => {
                target.insert(name.to_string(), record);
            }
        }
        true
    }
}

fn merge_bound(current: Option<Bound>, new: Option<Bound>, pick: fn(i64, i64) -> i64) -> Option<Bound> {
    match (current, new) {
        (None, new) => new,
        (current, None) => current,
        // text wins over numbers; between two texts the latest does
        (Some(_), Some(Bound::Text(text))) => Some(Bound::Text(text)),
        (Some(Bound::Text(text)), Some(Bound::Number(_))) => Some(Bound::Text(text)),
        (Some(Bound::Number(a)), Some(Bound::Number(b))) => Some(Bound::Number(pick(a, b))),
    }
}

fn kind_label(kind: SignalKind) -> &'static str {
    match kind {
        SignalKind::Port => "Port",
        SignalKind::Reg => "Reg",
        SignalKind::Wire => "Wire",
        SignalKind::Signal => "Signal",
    }
}
