use std::path::PathBuf;

use hdl_frontend::cli::split_define;
use hdl_frontend::parse_vcs_style_args;

#[test]
fn test_parse_simple_file() {
    let args = vec!["top.v".to_string()];
    let result = parse_vcs_style_args(args, false, false, false).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("top.v")]);
    assert_eq!(result.search_dirs, Vec::<PathBuf>::new());
    assert_eq!(result.defines, Vec::<String>::new());
    assert!(!result.verbose);
    assert!(!result.json);
    assert!(!result.system_verilog);
}

#[test]
fn test_parse_multiple_files() {
    let args = vec!["a.sv".to_string(), "b.sv".to_string()];
    let result = parse_vcs_style_args(args, false, false, true).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("a.sv"), PathBuf::from("b.sv")]);
    assert!(result.system_verilog);
}

#[test]
fn test_parse_incdir() {
    let args = vec![
        "+incdir+/rtl/common".to_string(),
        "+incdir+/rtl/pkg".to_string(),
        "top.sv".to_string(),
    ];
    let result = parse_vcs_style_args(args, false, false, false).unwrap();

    assert_eq!(
        result.search_dirs,
        vec![PathBuf::from("/rtl/common"), PathBuf::from("/rtl/pkg")]
    );
}

#[test]
fn test_parse_incdir_plus_separated() {
    let args = vec!["+incdir+rtl+ip".to_string(), "top.sv".to_string()];
    let result = parse_vcs_style_args(args, false, false, false).unwrap();

    assert_eq!(
        result.search_dirs,
        vec![PathBuf::from("rtl"), PathBuf::from("ip")]
    );
}

#[test]
fn test_parse_defines() {
    let args = vec![
        "+define+FPGA".to_string(),
        "+define+WIDTH=16".to_string(),
        "top.v".to_string(),
    ];
    let result = parse_vcs_style_args(args, true, true, false).unwrap();

    assert_eq!(result.defines, vec!["FPGA".to_string(), "WIDTH=16".to_string()]);
    assert!(result.verbose);
    assert!(result.json);
}

#[test]
fn test_split_define() {
    assert_eq!(split_define("WIDTH=16"), ("WIDTH".to_string(), "16".to_string()));
    assert_eq!(split_define("FPGA"), ("FPGA".to_string(), String::new()));
}

#[test]
fn test_empty_incdir_is_an_error() {
    let args = vec!["+incdir+".to_string(), "top.v".to_string()];
    let result = parse_vcs_style_args(args, false, false, false);

    assert_eq!(
        result.unwrap_err(),
        "Empty path in +incdir+ directive".to_string()
    );
}

#[test]
fn test_empty_define_is_an_error() {
    let args = vec!["+define+".to_string(), "top.v".to_string()];
    assert!(parse_vcs_style_args(args, false, false, false).is_err());
}

#[test]
fn test_unknown_option_is_an_error() {
    let args = vec!["--bogus".to_string(), "top.v".to_string()];
    let result = parse_vcs_style_args(args, false, false, false);

    assert_eq!(result.unwrap_err(), "Unknown option: --bogus".to_string());
}

#[test]
fn test_passthrough_flags_are_skipped() {
    let args = vec!["-v".to_string(), "--json".to_string(), "top.v".to_string()];
    let result = parse_vcs_style_args(args, false, false, false).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("top.v")]);
}

#[test]
fn test_unsupported_plus_option_is_ignored() {
    let args = vec!["+libext+.v".to_string(), "top.v".to_string()];
    let result = parse_vcs_style_args(args, false, false, false).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("top.v")]);
}

#[test]
fn test_no_files_is_an_error() {
    let args = vec!["+define+FPGA".to_string()];
    let result = parse_vcs_style_args(args, false, false, false);

    assert_eq!(result.unwrap_err(), "No input files specified".to_string());
}

#[test]
fn test_passthrough_top_skips_its_value() {
    let args = vec!["--top".to_string(), "core".to_string(), "soc.sv".to_string()];
    let result = parse_vcs_style_args(args, false, false, true).unwrap();

    assert_eq!(result.files, vec![PathBuf::from("soc.sv")]);
}
