mod common;

use common::{errors, parse_err, parse_ok, TestHarness};
use hdl_frontend::conditional::{BranchKind, ConditionalError, ConditionalStack};
use hdl_frontend::FrontendError;

#[test]
fn test_ifdef_defined_admits_body() {
    let mut stack = ConditionalStack::new();
    stack.push_ifdef(true, false);
    assert!(stack.is_active());
    assert_eq!(stack.frames()[0].kind, BranchKind::Ifdef);
    stack.endif().unwrap();
    assert_eq!(stack.depth(), 0);
    assert!(stack.is_active());
}

#[test]
fn test_nested_ifdef_ifndef() {
    // A defined, B undefined
    let mut stack = ConditionalStack::new();
    stack.push_ifdef(true, false);
    stack.push_ifdef(false, true);
    assert!(stack.is_active());
    assert_eq!(stack.depth(), 2);
    stack.endif().unwrap();
    stack.endif().unwrap();
    assert_eq!(stack.depth(), 0);
    assert!(stack.is_active());
}

#[test]
fn test_else_after_served_branch_is_dead() {
    let mut stack = ConditionalStack::new();
    stack.push_ifdef(true, false);
    stack.else_branch().unwrap();
    assert!(!stack.is_active());
    assert_eq!(stack.frames()[0].kind, BranchKind::Else);
}

#[test]
fn test_elsif_only_fires_when_unserved() {
    let mut stack = ConditionalStack::new();
    stack.push_ifdef(false, false);
    assert!(stack.can_take_elsif().unwrap());
    stack.elsif(true).unwrap();
    assert!(stack.is_active());

    assert!(!stack.can_take_elsif().unwrap());
    stack.elsif(true).unwrap();
    assert!(!stack.is_active());

    stack.else_branch().unwrap();
    assert!(!stack.is_active());
}

#[test]
fn test_enclosing_false_always_wins() {
    let mut stack = ConditionalStack::new();
    stack.push_ifdef(false, false);
    stack.push_ifdef(true, false);
    assert!(!stack.is_active());
    assert!(!stack.frames()[1].served);

    assert!(!stack.can_take_elsif().unwrap());
    stack.elsif(true).unwrap();
    assert!(!stack.is_active());
    stack.else_branch().unwrap();
    assert!(!stack.is_active());

    stack.endif().unwrap();
    stack.else_branch().unwrap();
    assert!(stack.is_active());
}

#[test]
fn test_unmatched_directives() {
    let mut stack = ConditionalStack::new();
    assert_eq!(stack.endif(), Err(ConditionalError::Unmatched("endif")));
    assert_eq!(stack.else_branch(), Err(ConditionalError::Unmatched("else")));
    assert_eq!(stack.can_take_elsif(), Err(ConditionalError::Unmatched("elsif")));
}

#[test]
fn test_ifdef_gates_declarations() {
    let content = r#"
`define A
module top;
`ifdef A
  `ifndef B
  wire admitted;
  `else
  wire excluded_else;
  `endif
`else
  wire excluded;
`endif
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert!(symbols.wire("admitted").is_some());
    assert!(symbols.wire("excluded_else").is_none());
    assert!(symbols.wire("excluded").is_none());
    assert_eq!(frontend.conditional_depth(), 0);
    assert!(!frontend.has_errors());
}

#[test]
fn test_elsif_with_expression() {
    let content = r#"
`define MODE 2
module top;
`ifdef FAST
  wire fast;
`elsif `MODE == 2
  wire mode_two;
`else
  wire fallback;
`endif
endmodule
"#;
    let frontend = parse_ok(content);

    assert!(frontend.symbols().wire("fast").is_none());
    assert!(frontend.symbols().wire("mode_two").is_some());
    assert!(frontend.symbols().wire("fallback").is_none());
}

#[test]
fn test_elsif_with_identifier() {
    let content = r#"
`define SLOW
module top;
`ifdef FAST
  wire fast;
`elsif SLOW
  wire slow;
`endif
endmodule
"#;
    let frontend = parse_ok(content);

    assert!(frontend.symbols().wire("slow").is_some());
}

#[test]
fn test_define_inside_dead_branch_is_ignored() {
    let content = r#"
`ifdef NEVER
`define WIDTH 4
`else
`define WIDTH 8
`endif
module top;
  wire [`WIDTH-1:0] data;
endmodule
"#;
    let frontend = parse_ok(content);
    let data = frontend.symbols().wire("data").unwrap();

    assert_eq!(data.bitdef.as_deref(), Some("7:0"));
}

#[test]
fn test_undef() {
    let content = r#"
`define DEBUG
`undef DEBUG
module top;
`ifdef DEBUG
  wire debug;
`endif
endmodule
"#;
    let frontend = parse_ok(content);

    assert!(frontend.symbols().wire("debug").is_none());
}

#[test]
fn test_config_defines_are_visible() {
    let harness = TestHarness::new().with_define("FPGA", "");
    let frontend = harness
        .parse_content_ok("module top;\n`ifdef FPGA\nwire fpga;\n`endif\nendmodule\n");

    assert!(frontend.symbols().wire("fpga").is_some());
}

#[test]
fn test_unbalanced_endif_is_fatal() {
    let err = parse_err("module top;\n`endif\nendmodule\n");

    match err {
        FrontendError::UnbalancedConditional { directive, location } => {
            assert_eq!(directive, "endif");
            assert_eq!(location.line, 2);
        }
        other => panic!("Expected UnbalancedConditional, got {:?}", other),
    }
}

#[test]
fn test_unterminated_ifdef_is_reported() {
    let frontend = parse_ok("module top;\n`ifdef A\nwire a;\nendmodule\n");

    assert_eq!(frontend.conditional_depth(), 1);
    assert_eq!(errors(&frontend).len(), 1);
}

#[test]
fn test_skip_ifdef_region_admits_both_branches() {
    let content = r#"
module top;
&SkipIfdefBegin;
`ifdef ASIC
  wire asic_only;
`else
  wire fpga_only;
`endif
&SkipIfdefEnd;
endmodule
"#;
    let frontend = parse_ok(content);

    assert!(frontend.symbols().wire("asic_only").is_some());
    assert!(frontend.symbols().wire("fpga_only").is_some());
    assert_eq!(frontend.conditional_depth(), 0);
}
