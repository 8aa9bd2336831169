mod common;

use common::{parse_err, parse_ok, warnings, TestHarness};
use hdl_frontend::types::{aggregate_width, parse_typedef, ScopePath, TypeTable, TypedefDecl, TypedefKind};
use hdl_frontend::{Bound, FrontendError, Mode};

fn root_width(table: &TypeTable, name: &str) -> Option<i64> {
    let type_ref = table.lookup(name, &ScopePath::root(), &[])?;
    table.width_of(&type_ref)
}

#[test]
fn test_struct_width_is_sum_of_members() {
    let content = r#"
module top;
  typedef struct packed { logic [3:0] a; logic [7:0] b; } s_t;
  s_t pkt;
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert_eq!(root_width(&symbols.types, "s_t"), Some(12));
    let pkt = symbols.signal("pkt").unwrap();
    assert_eq!(pkt.upper, Some(Bound::Number(11)));
    assert_eq!(pkt.lower, Some(Bound::Number(0)));
    assert_eq!(pkt.mode, Mode::Typedef);
    assert!(symbols.types.binding("pkt").is_some());
    assert!(warnings(&frontend).is_empty());
}

#[test]
fn test_uniform_union() {
    let content = r#"
module top;
  typedef union packed { logic [7:0] raw; logic [7:0] cooked; } u_t;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(root_width(&frontend.symbols().types, "u_t"), Some(8));
    assert!(warnings(&frontend).is_empty());
}

#[test]
fn test_non_uniform_union_takes_last_member_with_warning() {
    let content = r#"
module top;
  typedef union packed { logic [7:0] raw; logic [3:0] nibble; } u_t;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(root_width(&frontend.symbols().types, "u_t"), Some(4));
    let warnings = warnings(&frontend);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].scope.as_deref(), Some("default::default::u_t"));
}

#[test]
fn test_aggregate_width() {
    assert_eq!(aggregate_width(false, &[4, 8]), (12, true));
    assert_eq!(aggregate_width(true, &[8, 8]), (8, true));
    assert_eq!(aggregate_width(true, &[8, 4]), (4, false));
}

#[test]
fn test_nested_struct_member_width() {
    let content = r#"
module top;
  typedef struct packed { logic [3:0] tag; logic [15:0] data; } inner_t;
  typedef struct packed { inner_t body; logic valid; } outer_t;
  outer_t beat;
  localparam DATA_W = $bits(beat.body.data);
  localparam BODY_W = $bits(beat.body);
  localparam TOTAL_W = $bits(outer_t);
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert_eq!(symbols.parameter("DATA_W").unwrap().value, Some(16));
    assert_eq!(symbols.parameter("BODY_W").unwrap().value, Some(20));
    assert_eq!(symbols.parameter("TOTAL_W").unwrap().value, Some(21));
}

#[test]
fn test_enum_with_base_range() {
    let content = r#"
module top;
  typedef enum logic [2:0] { IDLE, RUN, DONE = 5 } state_t;
  localparam FIRST = IDLE;
  localparam AFTER_RUN = RUN + 1;
  localparam LAST = DONE;
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert_eq!(root_width(&symbols.types, "state_t"), Some(3));
    assert_eq!(symbols.parameter("FIRST").unwrap().value, Some(0));
    assert_eq!(symbols.parameter("AFTER_RUN").unwrap().value, Some(2));
    assert_eq!(symbols.parameter("LAST").unwrap().value, Some(5));
}

#[test]
fn test_enum_width_from_largest_value() {
    let content = r#"
module top;
  typedef enum { A, B, C, D, E } five_t;
  typedef enum { ONLY } one_t;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(root_width(&frontend.symbols().types, "five_t"), Some(3));
    assert_eq!(root_width(&frontend.symbols().types, "one_t"), Some(1));
}

#[test]
fn test_enum_ranged_items() {
    let content = r#"
module top;
  typedef enum { REQ[3], ACK[2:3] } ev_t;
endmodule
"#;
    let frontend = parse_ok(content);
    let types = &frontend.symbols().types;
    let type_ref = types.lookup("ev_t", &ScopePath::root(), &[]).unwrap();
    let members: Vec<(&str, i64)> = types
        .enumeration(&type_ref)
        .unwrap()
        .members
        .iter()
        .map(|member| (member.name.as_str(), member.value))
        .collect();

    assert_eq!(
        members,
        vec![("REQ0", 0), ("REQ1", 1), ("REQ2", 2), ("ACK2", 3), ("ACK3", 4)]
    );
}

#[test]
fn test_typedef_and_explicit_range_agree() {
    let content = r#"
module top;
  typedef logic [7:0] byte_t;
  logic [7:0] foo;
  byte_t bar;
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();
    let foo = symbols.signal("foo").unwrap();
    let bar = symbols.signal("bar").unwrap();

    assert_eq!(foo.upper, bar.upper);
    assert_eq!(foo.lower, bar.lower);
    assert_eq!(bar.upper, Some(Bound::Number(7)));
    assert_eq!(bar.lower, Some(Bound::Number(0)));
}

#[test]
fn test_typedef_with_packed_dimension() {
    let content = r#"
module top;
  typedef logic [7:0] byte_t;
  byte_t [3:0] word;
endmodule
"#;
    let frontend = parse_ok(content);
    let word = frontend.symbols().signal("word").unwrap();

    assert_eq!(word.bitdef.as_deref(), Some("31:0"));
}

#[test]
fn test_alias_typedef() {
    let content = r#"
module top;
  typedef logic [7:0] byte_t;
  typedef byte_t [1:0] half_t;
  typedef int count_t;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(root_width(&frontend.symbols().types, "half_t"), Some(16));
    assert_eq!(root_width(&frontend.symbols().types, "count_t"), Some(32));
}

#[test]
fn test_unresolvable_typedef_range_is_skipped() {
    let content = r#"
module top;
  typedef logic [N-1:0] vec_t;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(root_width(&frontend.symbols().types, "vec_t"), None);
    assert_eq!(warnings(&frontend).len(), 1);
}

#[test]
fn test_anonymous_member_is_reported() {
    let content = r#"
module top;
  typedef struct packed { struct packed { logic a; } inner; logic [1:0] b; } s_t;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(root_width(&frontend.symbols().types, "s_t"), Some(2));
    assert_eq!(warnings(&frontend).len(), 1);
}

#[test]
fn test_unknown_typedef_is_fatal_in_top_module() {
    let err = parse_err("module top;\n  missing_t x;\nendmodule\n");

    match err {
        FrontendError::UnknownTypedef {
            reference, signal, ..
        } => {
            assert_eq!(reference, "missing_t");
            assert_eq!(signal, "x");
        }
        other => panic!("Expected UnknownTypedef, got {:?}", other),
    }
}

#[test]
fn test_package_types_are_loaded_on_import() {
    let harness = TestHarness::new();
    harness.write(
        "cfg_pkg.sv",
        r#"
package cfg_pkg;
  parameter DATA_W = 16;
  typedef logic [DATA_W-1:0] data_t;
  typedef struct packed { data_t payload; logic valid; } beat_t;
endpackage
"#,
    );
    harness.write(
        "top.sv",
        r#"
module top;
  import cfg_pkg::*;
  beat_t beat;
  cfg_pkg::data_t word;
  wire [cfg_pkg::DATA_W-1:0] bus;
endmodule
"#,
    );
    let frontend = harness.parse_file_ok("top.sv");
    let symbols = frontend.symbols();

    assert!(symbols.types.has_package("cfg_pkg"));
    assert_eq!(symbols.signal("beat").unwrap().bitdef.as_deref(), Some("16:0"));
    assert_eq!(symbols.signal("word").unwrap().bitdef.as_deref(), Some("15:0"));
    assert_eq!(symbols.wire("bus").unwrap().bitdef.as_deref(), Some("15:0"));
    let binding = symbols.types.binding("beat").unwrap();
    assert_eq!(binding.type_ref.scope, ScopePath::package("cfg_pkg"));
    assert_eq!(binding.type_ref.kind, TypedefKind::Struct);
}

#[test]
fn test_qualified_reference_loads_package() {
    let harness = TestHarness::new();
    harness.write(
        "bus_pkg.sv",
        "package bus_pkg;\n  typedef logic [31:0] addr_t;\nendpackage\n",
    );
    let frontend = harness.parse_content_ok("module top;\n  bus_pkg::addr_t addr;\nendmodule\n");

    assert_eq!(frontend.symbols().signal("addr").unwrap().bitdef.as_deref(), Some("31:0"));
}

#[test]
fn test_missing_package_is_fatal() {
    let err = parse_err("module top;\n  import nowhere_pkg::*;\nendmodule\n");

    assert!(matches!(err, FrontendError::MissingSource { .. }));
}

#[test]
fn test_class_scoped_typedef() {
    let content = r#"
package p;
  class c;
    typedef logic [3:0] nib_t;
  endclass
endpackage
module top;
  p::c::nib_t n;
endmodule
"#;
    let frontend = parse_ok(content);
    let types = &frontend.symbols().types;

    assert!(types.scope(&ScopePath::new("p", "c")).is_some());
    assert!(types.scope(&ScopePath::package("p")).is_some());
    assert_eq!(frontend.symbols().signal("n").unwrap().bitdef.as_deref(), Some("3:0"));
}

#[test]
fn test_search_order() {
    let order = TypeTable::search_order(&ScopePath::new("p", "c"), &["q".to_string()]);

    assert_eq!(
        order,
        vec![
            ScopePath::new("p", "c"),
            ScopePath::package("p"),
            ScopePath::package("q"),
            ScopePath::root(),
        ]
    );
}

#[test]
fn test_parse_typedef_forms() {
    assert!(matches!(
        parse_typedef("logic signed [7:0] s8_t"),
        Some(TypedefDecl::Logic { signed: true, .. })
    ));
    assert!(matches!(
        parse_typedef("enum bit [1:0] { A, B } ab_t"),
        Some(TypedefDecl::Enum { .. })
    ));
    assert!(matches!(
        parse_typedef("union packed { logic a; } u_t"),
        Some(TypedefDecl::Aggregate { union: true, .. })
    ));
    assert!(matches!(
        parse_typedef("pkg::word_t alias_t"),
        Some(TypedefDecl::Alias { .. })
    ));
}
