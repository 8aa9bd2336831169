use std::path::PathBuf;

#[derive(Debug, PartialEq)]
pub struct ParsedArgs {
    pub files: Vec<PathBuf>,
    pub search_dirs: Vec<PathBuf>,
    pub defines: Vec<String>,
    pub verbose: bool,
    pub json: bool,
    pub system_verilog: bool,
}

/// Splits a VCS-style argument list into files, `+incdir+` search directories
/// and `+define+` macros.
pub fn parse_vcs_style_args(
    raw_args: Vec<String>,
    verbose: bool,
    json: bool,
    system_verilog: bool,
) -> Result<ParsedArgs, String> {
    let mut files = Vec::new();
    let mut search_dirs = Vec::new();
    let mut defines = Vec::new();

    let mut args = raw_args.into_iter();
    while let Some(arg) = args.next() {
        if let Some(incdir_path) = arg.strip_prefix("+incdir+") {
            if incdir_path.is_empty() {
                return Err("Empty path in +incdir+ directive".to_string());
            }
            // +incdir+a+b is shorthand for two directories
            search_dirs.extend(
                incdir_path
                    .split('+')
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from),
            );
        } else if let Some(define_str) = arg.strip_prefix("+define+") {
            if define_str.is_empty() {
                return Err("Empty define in +define+ directive".to_string());
            }
            defines.push(define_str.to_string());
        } else if arg.starts_with('+') {
            log::warn!("Unsupported VCS option: {}", arg);
        } else if arg.starts_with('-') {
            // Skip clap flags that might have been passed through
            if matches!(arg.as_str(), "-v" | "--verbose" | "--json" | "--sv") {
                continue;
            }
            if arg == "--top" {
                args.next();
                continue;
            }
            if arg.starts_with("--top=") {
                continue;
            }
            return Err(format!("Unknown option: {}", arg));
        } else {
            files.push(PathBuf::from(arg));
        }
    }

    if files.is_empty() {
        return Err("No input files specified".to_string());
    }

    Ok(ParsedArgs {
        files,
        search_dirs,
        defines,
        verbose,
        json,
        system_verilog,
    })
}

/// `NAME=VALUE` or bare `NAME` (defined with an empty body).
pub fn split_define(define: &str) -> (String, String) {
    match define.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (define.to_string(), String::new()),
    }
}
