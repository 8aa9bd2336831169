mod common;

use common::{errors, parse_ok};
use hdl_frontend::reconstruct::{LineReconstructor, LogicalLine};

fn logical(line: usize, text: &str) -> LogicalLine {
    LogicalLine {
        line,
        text: text.to_string(),
    }
}

#[test]
fn test_line_comment_is_removed() {
    let mut lines = LineReconstructor::new();
    assert_eq!(lines.clean("wire a; // the a wire").trim(), "wire a;");
}

#[test]
fn test_comment_markers_inside_strings_are_kept() {
    let mut lines = LineReconstructor::new();
    assert_eq!(
        lines.clean(r#"$display("a//b /* c */");"#),
        r#"$display("a//b /* c */");"#
    );
}

#[test]
fn test_block_comment_spans_lines() {
    let mut lines = LineReconstructor::new();
    assert_eq!(lines.clean("wire a; /* start").trim(), "wire a;");
    assert_eq!(lines.clean("wire hidden;").trim(), "");
    assert_eq!(lines.clean("end */ wire b;").trim(), "wire b;");
}

#[test]
fn test_translate_off_region_is_dropped() {
    let mut lines = LineReconstructor::new();
    lines.clean("// synopsys translate_off");
    assert!(lines.in_translate_off());
    assert_eq!(lines.clean("initial $display(\"sim\");").trim(), "");
    lines.clean("// synopsys translate_on");
    assert!(!lines.in_translate_off());
    assert_eq!(lines.clean("wire kept;").trim(), "wire kept;");
}

#[test]
fn test_statement_continues_across_lines() {
    let mut lines = LineReconstructor::new();
    assert!(lines.push(1, "assign a =").is_empty());
    assert!(lines.has_pending());
    assert_eq!(
        lines.push(2, "    b &   c;"),
        vec![logical(1, "assign a = b & c;")]
    );
    assert!(!lines.has_pending());
}

#[test]
fn test_several_statements_on_one_line() {
    let mut lines = LineReconstructor::new();
    assert_eq!(
        lines.push(4, "wire a; wire b;"),
        vec![logical(4, "wire a;"), logical(4, "wire b;")]
    );
}

#[test]
fn test_condition_waits_for_balanced_brackets() {
    let mut lines = LineReconstructor::new();
    assert!(lines.push(1, "if (a &&").is_empty());
    assert_eq!(lines.push(2, "b)"), vec![logical(1, "if (a && b)")]);
}

#[test]
fn test_block_opener_completes_statement() {
    let mut lines = LineReconstructor::new();
    assert_eq!(
        lines.push(1, "always @(posedge clk) begin : seq"),
        vec![logical(1, "always @(posedge clk) begin : seq")]
    );
    assert_eq!(lines.push(2, "end"), vec![logical(2, "end")]);
}

#[test]
fn test_semicolons_inside_braces_do_not_split() {
    let mut lines = LineReconstructor::new();
    assert_eq!(
        lines.push(1, "typedef struct packed { logic a; logic b; } ab_t;"),
        vec![logical(1, "typedef struct packed { logic a; logic b; } ab_t;")]
    );
}

#[test]
fn test_unterminated_statement_is_reported_by_finish() {
    let mut lines = LineReconstructor::new();
    assert_eq!(lines.push(1, "wire a; wire"), vec![logical(1, "wire a;")]);
    lines.push(2, "b");
    assert_eq!(lines.finish(), Some(2));
    assert_eq!(lines.finish(), None);
}

#[test]
fn test_directive_continuation() {
    let mut lines = LineReconstructor::new();
    assert_eq!(lines.push_directive(3, "`define SUM 1 \\"), None);
    assert!(lines.in_directive());
    assert_eq!(
        lines.push_directive(4, "  + 2"),
        Some(logical(3, "`define SUM 1 + 2"))
    );
    assert!(!lines.in_directive());
}

#[test]
fn test_multi_line_macro_is_evaluated() {
    let content = "`define WIDTH 4 \\\n  * 2\nmodule top;\n  wire [`WIDTH-1:0] bus;\nendmodule\n";
    let frontend = parse_ok(content);

    assert_eq!(frontend.symbols().wire("bus").unwrap().bitdef.as_deref(), Some("7:0"));
}

#[test]
fn test_missing_semicolon_at_end_of_input() {
    let frontend = parse_ok("module top;\n  wire a;\n  wire b\n");
    let errors = errors(&frontend);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location.line, 3);
    assert!(frontend.symbols().wire("a").is_some());
}
