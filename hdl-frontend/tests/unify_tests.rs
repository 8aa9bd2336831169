use hdl_frontend::unify::{Observation, Outcome, SignalTable};
use hdl_frontend::{Bound, Mode, PortDirection, SignalKind};

fn range(name: &str, upper: i64, lower: i64) -> Observation {
    Observation::new(name).range(Bound::Number(upper), Bound::Number(lower))
}

#[test]
fn test_first_observation_creates_record() {
    let mut table = SignalTable::new();
    let outcome = table.observe(SignalKind::Wire, range("data", 7, 0).line(3));

    assert_eq!(outcome, Outcome::Created);
    let record = table.wires.get("data").unwrap();
    assert_eq!(record.bitdef.as_deref(), Some("7:0"));
    assert_eq!(record.width(), Some(8));
    assert_eq!(record.mode, Mode::Auto);
    assert_eq!(record.line, 3);
}

#[test]
fn test_widening_is_monotonic() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Signal, range("foo", 3, 0));
    assert_eq!(table.observe(SignalKind::Signal, range("foo", 7, 0)), Outcome::Updated);
    assert_eq!(table.observe(SignalKind::Signal, range("foo", 5, 2)), Outcome::Unchanged);

    let record = table.signals.get("foo").unwrap();
    assert_eq!(record.upper, Some(Bound::Number(7)));
    assert_eq!(record.lower, Some(Bound::Number(0)));
}

#[test]
fn test_repeated_observation_is_idempotent() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Reg, range("count", 3, 0));
    let before = table.clone();

    assert_eq!(table.observe(SignalKind::Reg, range("count", 3, 0)), Outcome::Unchanged);
    assert_eq!(table, before);
}

#[test]
fn test_manual_record_is_pinned() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Reg, range("q", 3, 0).mode(Mode::Manual));

    assert_eq!(table.observe(SignalKind::Reg, range("q", 15, 0)), Outcome::Pinned);
    assert_eq!(table.regs.get("q").unwrap().bitdef.as_deref(), Some("3:0"));
}

#[test]
fn test_force_overrides_inferred_range() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Wire, range("bus", 15, 0));
    table.observe(SignalKind::Wire, range("bus", 3, 0).mode(Mode::Force));

    let record = table.wires.get("bus").unwrap();
    assert_eq!(record.bitdef.as_deref(), Some("3:0"));
    assert_eq!(record.mode, Mode::Force);
    assert_eq!(table.observe(SignalKind::Wire, range("bus", 31, 0)), Outcome::Pinned);
}

#[test]
fn test_text_bound_wins_over_number() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Signal, range("data", 7, 0));
    table.observe(
        SignalKind::Signal,
        Observation::new("data").range(Bound::Text("W-1".to_string()), Bound::Number(0)),
    );
    table.observe(SignalKind::Signal, range("data", 15, 0));

    let record = table.signals.get("data").unwrap();
    assert_eq!(record.upper, Some(Bound::Text("W-1".to_string())));
    assert_eq!(record.bitdef.as_deref(), Some("W-1:0"));
    assert_eq!(record.width(), None);
}

#[test]
fn test_scalar_has_no_bitdef() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Port, Observation::new("clk").direction(PortDirection::Input));

    let record = table.ports.get("clk").unwrap();
    assert_eq!(record.bitdef, None);
    assert_eq!(record.width(), Some(1));
    assert_eq!(record.direction, Some(PortDirection::Input));
}

#[test]
fn test_depth_and_sign_only_change_when_given() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Reg, range("mem", 7, 0).depth(1).signed(true));
    table.observe(SignalKind::Reg, range("mem", 7, 0));

    let record = table.regs.get("mem").unwrap();
    assert_eq!(record.depth, 1);
    assert!(record.signed);
}

#[test]
fn test_reserved_word_is_rejected() {
    let mut table = SignalTable::new();

    assert_eq!(table.observe(SignalKind::Signal, Observation::new("begin")), Outcome::Rejected);
    assert!(table.find("begin").is_none());
}

#[test]
fn test_promote_moves_auto_signal() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Signal, range("state", 1, 0));

    assert!(table.promote("state", SignalKind::Reg));
    assert!(table.signals.get("state").is_none());
    let record = table.regs.get("state").unwrap();
    assert_eq!(record.kind, SignalKind::Reg);
    assert_eq!(record.bitdef.as_deref(), Some("1:0"));
}

#[test]
fn test_promote_keeps_declared_signal() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Signal, range("state", 1, 0).mode(Mode::Manual));

    assert!(!table.promote("state", SignalKind::Reg));
    assert!(table.signals.get("state").is_some());
}

#[test]
fn test_redeclare_replaces_range_of_pinned_port() {
    let mut table = SignalTable::new();
    table.observe(
        SignalKind::Port,
        Observation::new("q")
            .mode(Mode::Manual)
            .direction(PortDirection::Output),
    );
    let outcome = table.redeclare(SignalKind::Port, range("q", 7, 0).data_type("reg"));

    assert_eq!(outcome, Outcome::Updated);
    let record = table.ports.get("q").unwrap();
    assert_eq!(record.bitdef.as_deref(), Some("7:0"));
    assert_eq!(record.data_type.as_deref(), Some("reg"));
    assert_eq!(record.direction, Some(PortDirection::Output));
}

#[test]
fn test_redeclare_keeps_forced_range() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Port, range("q", 3, 0).mode(Mode::Force));

    assert_eq!(table.redeclare(SignalKind::Port, range("q", 7, 0)), Outcome::Pinned);
    let record = table.ports.get("q").unwrap();
    assert_eq!(record.bitdef.as_deref(), Some("3:0"));
    assert_eq!(record.mode, Mode::Force);
}

#[test]
fn test_ordered_follows_first_sighting() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Wire, Observation::new("zeta"));
    table.observe(SignalKind::Wire, Observation::new("alpha"));
    table.observe(SignalKind::Wire, Observation::new("mid"));

    let names: Vec<&str> = table
        .ordered(SignalKind::Wire)
        .into_iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_kind_of_checks_every_table() {
    let mut table = SignalTable::new();
    table.observe(SignalKind::Port, Observation::new("a"));
    table.observe(SignalKind::Signal, Observation::new("b"));

    assert_eq!(table.kind_of("a"), Some(SignalKind::Port));
    assert_eq!(table.kind_of("b"), Some(SignalKind::Signal));
    assert_eq!(table.kind_of("c"), None);
}
