use hdl_frontend::classify::{
    classify, parse_declaration_body, split_assignment, AlwaysKind, CaseKind, ModuleHeader,
    Statement,
};
use hdl_frontend::extract::signal_references;
use hdl_frontend::scan::{
    brackets_balanced, find_range_colon, first_word, split_part_select, split_top_level,
};
use hdl_frontend::PortDirection;

#[test]
fn test_module_header() {
    assert_eq!(
        classify("module top #(parameter W = 8) (input [W-1:0] a, output b);", false),
        Statement::Module(ModuleHeader {
            name: "top".to_string(),
            parameters: Some("parameter W = 8".to_string()),
            ports: Some("input [W-1:0] a, output b".to_string()),
        })
    );
    assert_eq!(
        classify("module leaf;", false),
        Statement::Module(ModuleHeader {
            name: "leaf".to_string(),
            parameters: None,
            ports: None,
        })
    );
}

#[test]
fn test_port_declaration() {
    match classify("output reg signed [7:0] q, r;", false) {
        Statement::PortDeclaration { direction, body } => {
            assert_eq!(direction, PortDirection::Output);
            assert_eq!(body.data_type.as_deref(), Some("reg"));
            assert!(body.signed);
            assert_eq!(body.packed, vec!["7:0".to_string()]);
            let names: Vec<&str> = body.names.iter().map(|name| name.name.as_str()).collect();
            assert_eq!(names, vec!["q", "r"]);
        }
        other => panic!("Expected PortDeclaration, got {:?}", other),
    }
}

#[test]
fn test_declaration_body_with_unpacked_dims_and_init() {
    let body = parse_declaration_body("logic [3:0] mem [0:15], flag = 1'b0");

    assert_eq!(body.data_type.as_deref(), Some("logic"));
    assert_eq!(body.names[0].name, "mem");
    assert_eq!(body.names[0].unpacked, vec!["0:15".to_string()]);
    assert_eq!(body.names[1].name, "flag");
    assert_eq!(body.names[1].init.as_deref(), Some("1'b0"));
}

#[test]
fn test_declaration_body_with_user_type() {
    let body = parse_declaration_body("cfg_pkg::word_t [1:0] words");

    assert_eq!(body.type_name.as_deref(), Some("cfg_pkg::word_t"));
    assert_eq!(body.packed, vec!["1:0".to_string()]);
    assert_eq!(body.names[0].name, "words");
}

#[test]
fn test_always_kinds() {
    assert!(matches!(
        classify("always @(posedge clk or negedge rst_n) begin", false),
        Statement::Always { kind: AlwaysKind::Ff, sensitivity: Some(_), .. }
    ));
    assert!(matches!(
        classify("always @* y = a;", false),
        Statement::Always { kind: AlwaysKind::Comb, .. }
    ));
    assert!(matches!(
        classify("always_ff @(posedge clk)", false),
        Statement::Always { kind: AlwaysKind::Ff, .. }
    ));
    assert!(matches!(
        classify("always_comb begin", false),
        Statement::Always { kind: AlwaysKind::Comb, sensitivity: None, .. }
    ));
}

#[test]
fn test_conditionals_and_cases() {
    assert_eq!(
        classify("if (a && b) y = 1;", false),
        Statement::If {
            condition: "a && b".to_string(),
            rest: "y = 1;".to_string(),
        }
    );
    assert!(matches!(classify("else if (c)", false), Statement::ElseIf { .. }));
    assert!(matches!(classify("else begin", false), Statement::Else { .. }));
    assert_eq!(
        classify("unique casez (sel)", false),
        Statement::Case {
            kind: CaseKind::Casez,
            expression: "sel".to_string(),
            rest: String::new(),
        }
    );
    assert_eq!(
        classify("2'b01: y = a;", true),
        Statement::CaseItem {
            label: "2'b01".to_string(),
            rest: "y = a;".to_string(),
        }
    );
    assert!(matches!(classify("default: y = 0;", true), Statement::CaseItem { .. }));
}

#[test]
fn test_labelled_blocks() {
    assert_eq!(
        classify("begin : stage", false),
        Statement::Begin {
            label: Some("stage".to_string()),
            rest: String::new(),
        }
    );
    assert!(matches!(classify("end else begin", false), Statement::End { ref rest } if rest == "else begin"));
}

#[test]
fn test_assignments() {
    assert_eq!(
        classify("q <= d, 4'h0;", false),
        Statement::Assignment {
            lhs: "q".to_string(),
            rhs: "d".to_string(),
            nonblocking: true,
            reset: Some("4'h0".to_string()),
        }
    );
    assert_eq!(
        classify("assign {c, s} = a + b;", false),
        Statement::ContinuousAssign {
            lhs: "{c, s}".to_string(),
            rhs: "a + b".to_string(),
        }
    );
}

#[test]
fn test_split_assignment_skips_comparisons() {
    assert!(split_assignment("a == b").is_none());
    assert!(split_assignment("a != b").is_none());

    let compound = split_assignment("count += 1;").unwrap();
    assert_eq!(compound.lhs, "count");
    assert!(!compound.nonblocking);

    let shift = split_assignment("acc <<= 2;").unwrap();
    assert_eq!(shift.lhs, "acc");
    assert_eq!(shift.rhs, "2");

    let indexed = split_assignment("mem[a == b] <= d;").unwrap();
    assert_eq!(indexed.lhs, "mem[a == b]");
    assert!(indexed.nonblocking);
}

#[test]
fn test_instantiation_and_typed_declaration() {
    assert_eq!(
        classify("adder #(.W(4)) u_add (.a(x), .b(y));", false),
        Statement::Instantiation {
            module: "adder".to_string(),
            parameters: Some(".W(4)".to_string()),
            instance: "u_add".to_string(),
            connections: ".a(x), .b(y)".to_string(),
        }
    );
    assert!(matches!(
        classify("state_t state, next_state;", false),
        Statement::TypedDeclaration(_)
    ));
}

#[test]
fn test_simple_lists() {
    assert_eq!(
        classify("import a_pkg::*, b_pkg::item;", false),
        Statement::Import {
            items: vec!["a_pkg::*".to_string(), "b_pkg::item".to_string()],
        }
    );
    assert_eq!(
        classify("genvar i, j;", false),
        Statement::Genvar {
            names: vec!["i".to_string(), "j".to_string()],
        }
    );
    assert_eq!(
        classify("function automatic logic [3:0] pkg::next(input x);", false),
        Statement::Function {
            name: "next".to_string(),
            task: false,
        }
    );
    assert!(matches!(classify("integer [3:0] x;", false), Statement::NetDeclaration(_)));
}

#[test]
fn test_signal_references() {
    let refs = signal_references("a[3:0] + b[i] + 8'hFF + pkg::C + f(c) + s.x.y + $bits(d) + `M");
    let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(names, vec!["a", "i", "b", "c", "s", "d"]);
    assert_eq!(refs[0].selects, vec!["3:0".to_string()]);
    assert!(refs[1].nested);
    assert_eq!(refs[4].member.as_deref(), Some("x.y"));
}

#[test]
fn test_scan_helpers() {
    assert_eq!(first_word("  abc_1$ rest"), "abc_1$");
    assert_eq!(first_word("8'h0"), "");
    assert!(brackets_balanced("f(a[1], {b})"));
    assert!(!brackets_balanced("f(a[1]"));
    assert_eq!(split_top_level("a, f(b, c), d", ','), vec!["a", " f(b, c)", " d"]);
    assert_eq!(find_range_colon("W-1:0"), Some(3));
    assert_eq!(find_range_colon("pkg::W"), None);
    assert_eq!(find_range_colon("sel ? 1 : 0"), None);
    assert_eq!(split_part_select("base+:8"), Some(("base", "8", true)));
    assert_eq!(split_part_select("7-:4"), Some(("7", "4", false)));
}

#[test]
fn test_keyword_led_statements_classify_as_other() {
    assert_eq!(classify("assert property (@(posedge clk) a |-> b);", false), Statement::Other);
    assert_eq!(classify("disable fork;", false), Statement::Other);
    assert_eq!(classify("return next_state;", false), Statement::Other);
}
