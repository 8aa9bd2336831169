mod common;

use common::{errors, parse_ok, warnings};
use hdl_frontend::directive::{arguments, parse_directive, Directive};
use hdl_frontend::symbols::Edge;
use hdl_frontend::{Mode, PortDirection};

#[test]
fn test_parse_directive_names_are_case_insensitive() {
    assert_eq!(parse_directive("&parseroff;"), Some(Directive::ParserOff));
    assert_eq!(parse_directive("&ParserOn;"), Some(Directive::ParserOn));
    assert_eq!(parse_directive("&EndInstance;"), Some(Directive::EndInstance));
    assert_eq!(parse_directive("wire a;"), None);
}

#[test]
fn test_parse_edge_directive() {
    assert_eq!(
        parse_directive("&Posedge(clk, rst_n);"),
        Some(Directive::Edge {
            edge: Edge::Posedge,
            clock: "clk".to_string(),
            reset: Some("rst_n".to_string()),
        })
    );
    assert_eq!(
        parse_directive("&Negedge(clk);"),
        Some(Directive::Edge {
            edge: Edge::Negedge,
            clock: "clk".to_string(),
            reset: None,
        })
    );
    assert_eq!(
        parse_directive("&EndNegedge;"),
        Some(Directive::EndEdge(Edge::Negedge))
    );
}

#[test]
fn test_parse_instance_directives() {
    assert_eq!(
        parse_directive("&BeginInstance fifo u_fifo;"),
        Some(Directive::BeginInstance {
            module: "fifo".to_string(),
            instance: Some("u_fifo".to_string()),
            file: None,
        })
    );
    assert_eq!(
        parse_directive("&Param(DEPTH, 2 * 4);"),
        Some(Directive::Param {
            name: "DEPTH".to_string(),
            value: "2 * 4".to_string(),
        })
    );
    assert_eq!(
        parse_directive("&Connect /^in_/ /^out_/ INPUTS;"),
        Some(Directive::Connect(vec![
            "/^in_/".to_string(),
            "/^out_/".to_string(),
            "INPUTS".to_string(),
        ]))
    );
    assert_eq!(
        parse_directive("&Mystery;"),
        Some(Directive::Unknown("Mystery".to_string()))
    );
}

#[test]
fn test_regex_arguments_keep_separators() {
    assert_eq!(
        arguments("/a, b/ c"),
        vec!["/a, b/".to_string(), "c".to_string()]
    );
}

#[test]
fn test_force_pins_range() {
    let content = r#"
module top;
  &Force wire [3:0] bus;
  assign bus[7:0] = x;
endmodule
"#;
    let frontend = parse_ok(content);
    let bus = frontend.symbols().wire("bus").unwrap();

    assert_eq!(bus.bitdef.as_deref(), Some("3:0"));
    assert_eq!(bus.mode, Mode::Force);
}

#[test]
fn test_force_port() {
    let content = r#"
module top;
  &Force output [7:0] dout, valid;
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    let dout = symbols.port("dout").unwrap();
    assert_eq!(dout.direction, Some(PortDirection::Output));
    assert_eq!(dout.bitdef.as_deref(), Some("7:0"));
    assert_eq!(symbols.port("valid").unwrap().mode, Mode::Force);
}

#[test]
fn test_force_without_kind_is_reported() {
    let frontend = parse_ok("module top;\n  &Force bus;\nendmodule\n");

    assert_eq!(errors(&frontend).len(), 1);
    assert!(frontend.symbols().find("bus").is_none());
}

#[test]
fn test_posedge_region_captures_reset_values() {
    let content = r#"
module top(input clk, input rst_n, input [7:0] d);
  &Posedge(clk, rst_n);
    q <= d, 8'h00;
    valid <= 1'b1, 1'b0;
  &EndPosedge;
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert!(symbols.reg("q").is_some());
    assert!(symbols.reg("valid").is_some());
    assert_eq!(symbols.resets.len(), 2);

    let reset = &symbols.resets[0];
    assert_eq!(reset.signal, "q");
    assert_eq!(reset.value, "8'h00");
    assert_eq!(reset.edge, Some(Edge::Posedge));
    assert_eq!(reset.clock.as_deref(), Some("clk"));
    assert_eq!(reset.reset.as_deref(), Some("rst_n"));
    assert_eq!(reset.line, 4);
    assert_eq!(symbols.resets[1].signal, "valid");
    assert!(frontend.diagnostics().is_empty());
}

#[test]
fn test_mismatched_edge_region_end() {
    let content = r#"
module top;
  &Posedge(clk);
    q <= d;
  &EndNegedge;
  &EndPosedge;
endmodule
"#;
    let frontend = parse_ok(content);

    assert_eq!(errors(&frontend).len(), 1);
    assert!(frontend.symbols().reg("q").is_some());
}

#[test]
fn test_unclosed_edge_region_is_reported() {
    let frontend = parse_ok("module top;\n  &Negedge(clk);\n  q <= d;\nendmodule\n");

    assert_eq!(errors(&frontend).len(), 1);
}

#[test]
fn test_parser_off_region_is_skipped() {
    let content = r#"
module top;
  &ParserOff;
  wire hidden;
  assign y = ghost;
  &ParserOn;
  wire shown;
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert!(symbols.wire("hidden").is_none());
    assert!(symbols.find("ghost").is_none());
    assert!(symbols.wire("shown").is_some());
}

#[test]
fn test_unknown_directive_warns() {
    let frontend = parse_ok("module top;\n  &Mystery;\n  wire a;\nendmodule\n");

    assert_eq!(warnings(&frontend).len(), 1);
    assert!(frontend.symbols().wire("a").is_some());
}

#[test]
fn test_instance_directive_outside_instance_block() {
    let frontend = parse_ok("module top;\n  &EndInstance;\n  &Param W 4;\nendmodule\n");

    assert_eq!(errors(&frontend).len(), 2);
}

#[test]
fn test_force_survives_later_declaration() {
    let content = r#"
module top;
  &Force output [3:0] q;
  reg [7:0] q;
endmodule
"#;
    let frontend = parse_ok(content);
    let q = frontend.symbols().port("q").unwrap();

    assert_eq!(q.mode, Mode::Force);
    assert_eq!(q.bitdef.as_deref(), Some("3:0"));
    assert!(frontend.symbols().reg("q").is_none());
}

#[test]
fn test_reset_values_only_in_sequential_blocks() {
    let content = r#"
module top(input clk, input d);
  always_ff @(posedge clk) begin
    q <= d, 1'b0;
  end
  always @(*) begin
    r <= d, 1'b1;
  end
endmodule
"#;
    let frontend = parse_ok(content);
    let symbols = frontend.symbols();

    assert_eq!(symbols.resets.len(), 1);
    assert_eq!(symbols.resets[0].signal, "q");
    assert_eq!(symbols.resets[0].edge, None);
    assert_eq!(warnings(&frontend).len(), 1);
    assert!(symbols.reg("r").is_some());
}
