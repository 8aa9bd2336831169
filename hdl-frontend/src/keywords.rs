/// Words that can never name a signal. Observations for these are dropped.
pub fn is_reserved_keyword(word: &str) -> bool {
    matches!(
        word,
        "module"
            | "endmodule"
            | "macromodule"
            | "assign"
            | "input"
            | "output"
            | "inout"
            | "wire"
            | "reg"
            | "logic"
            | "always"
            | "always_ff"
            | "always_comb"
            | "always_latch"
            | "initial"
            | "begin"
            | "end"
            | "if"
            | "else"
            | "case"
            | "casez"
            | "casex"
            | "endcase"
            | "default"
            | "for"
            | "while"
            | "function"
            | "endfunction"
            | "task"
            | "endtask"
            | "return"
            | "class"
            | "endclass"
            | "interface"
            | "package"
            | "endpackage"
            | "import"
            | "export"
            | "extends"
            | "virtual"
            | "static"
            | "automatic"
            | "local"
            | "protected"
            | "pure"
            | "extern"
            | "typedef"
            | "enum"
            | "struct"
            | "union"
            | "packed"
            | "signed"
            | "unsigned"
            | "bit"
            | "byte"
            | "shortint"
            | "int"
            | "longint"
            | "integer"
            | "time"
            | "real"
            | "shortreal"
            | "string"
            | "event"
            | "void"
            | "null"
            | "this"
            | "super"
            | "foreach"
            | "repeat"
            | "forever"
            | "do"
            | "break"
            | "continue"
            | "unique"
            | "unique0"
            | "priority"
            | "inside"
            | "assert"
            | "assume"
            | "cover"
            | "restrict"
            | "expect"
            | "property"
            | "sequence"
            | "disable"
            | "iff"
            | "posedge"
            | "negedge"
            | "edge"
            | "or"
            | "and"
            | "not"
            | "wait"
            | "fork"
            | "join"
            | "join_any"
            | "join_none"
            | "final"
            | "generate"
            | "endgenerate"
            | "genvar"
            | "localparam"
            | "parameter"
            | "defparam"
            | "specify"
            | "specparam"
            | "supply0"
            | "supply1"
            | "tri"
            | "wand"
            | "wor"
            | "uwire"
            | "var"
            | "type"
    )
}

/// Keywords that open a statement which is complete without a trailing `;`.
pub fn opens_unterminated_statement(word: &str) -> bool {
    matches!(
        word,
        "if" | "else"
            | "for"
            | "foreach"
            | "while"
            | "repeat"
            | "forever"
            | "always"
            | "always_ff"
            | "always_comb"
            | "always_latch"
            | "initial"
            | "final"
            | "case"
            | "casez"
            | "casex"
            | "unique"
            | "unique0"
            | "priority"
            | "generate"
            | "endgenerate"
            | "begin"
            | "end"
            | "endcase"
            | "endmodule"
            | "endfunction"
            | "endtask"
            | "endpackage"
            | "endclass"
            | "endinterface"
            | "default"
            | "fork"
            | "join"
            | "join_any"
            | "join_none"
    )
}

/// Names of backtick directives understood by the preprocessor. A backtick
/// followed by anything else is a macro use and stays in the statement text.
pub fn is_preprocessor_directive(word: &str) -> bool {
    matches!(
        word,
        "define"
            | "undef"
            | "undefineall"
            | "ifdef"
            | "ifndef"
            | "elsif"
            | "else"
            | "endif"
            | "include"
            | "timescale"
            | "default_nettype"
            | "resetall"
            | "celldefine"
            | "endcelldefine"
            | "line"
            | "pragma"
            | "begin_keywords"
            | "end_keywords"
            | "unconnected_drive"
            | "nounconnected_drive"
    )
}
