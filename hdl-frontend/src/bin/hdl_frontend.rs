use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use hdl_frontend::{
    parse_vcs_style_args, symbols::SymbolTable, Diagnostic, Dialect, Frontend, FrontendConfig,
    SignalKind, SignalRecord,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "hdl-frontend")]
#[command(about = "Recovers ports, signals, widths and types from Verilog/SystemVerilog sources")]
#[command(version)]
#[command(disable_help_flag = true)]
struct Cli {
    /// All arguments (mix of +incdir+/+define+ options and files)
    #[arg(allow_hyphen_values = true)]
    args: Vec<String>,

    /// Show help information
    #[arg(long = "help", short = 'h', action = clap::ArgAction::Help)]
    help: Option<bool>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Print the symbol table as JSON
    #[arg(long = "json")]
    json: bool,

    /// Treat sources as SystemVerilog
    #[arg(long = "sv")]
    system_verilog: bool,

    /// Module to extract instead of the first one in each file
    #[arg(long = "top")]
    top: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    file: &'a Path,
    symbols: &'a SymbolTable,
    diagnostics: &'a [Diagnostic],
}

fn main() {
    let cli = Cli::parse();

    let parsed_args = match parse_vcs_style_args(cli.args, cli.verbose, cli.json, cli.system_verilog) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!();
            eprintln!("Usage: hdl-frontend [OPTIONS] [+incdir+<path>]... [+define+<macro>[=<value>]]... <file>...");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  -v, --verbose        Debug logging");
            eprintln!("      --json           Print the symbol table as JSON");
            eprintln!("      --sv             Treat sources as SystemVerilog");
            eprintln!("      --top <module>   Module to extract");
            eprintln!("  -h, --help           Show this help message");
            eprintln!();
            eprintln!("VCS-style options:");
            eprintln!("  +incdir+<path>       Search directory for modules, packages and includes");
            eprintln!("  +define+<macro>=<val> Define preprocessor macro");
            process::exit(1);
        }
    };

    let level = if parsed_args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = FrontendConfig {
        search_dirs: parsed_args.search_dirs.clone(),
        defines: parsed_args
            .defines
            .iter()
            .map(|define| hdl_frontend::cli::split_define(define))
            .collect(),
        dialect: if parsed_args.system_verilog {
            Dialect::SystemVerilog
        } else {
            Dialect::Verilog
        },
        resolve_instances: true,
        top_module: cli.top,
    };

    let mut had_errors = false;
    for file in &parsed_args.files {
        match run(file, config.clone(), parsed_args.json) {
            Ok(clean) => had_errors |= !clean,
            Err(err) => {
                eprintln!("Error: {:#}", err);
                had_errors = true;
            }
        }
    }
    process::exit(if had_errors { 1 } else { 0 });
}

/// Parses one file and prints its symbol table. Returns false when error
/// diagnostics were reported.
fn run(file: &Path, config: FrontendConfig, json: bool) -> anyhow::Result<bool> {
    let mut frontend = Frontend::new(config);
    frontend
        .parse_file(file)
        .with_context(|| format!("while parsing {}", file.display()))?;

    for diagnostic in frontend.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    if json {
        let report = Report {
            file,
            symbols: frontend.symbols(),
            diagnostics: frontend.diagnostics(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(frontend.symbols());
    }
    Ok(!frontend.has_errors())
}

fn print_summary(symbols: &SymbolTable) {
    let Some(module) = &symbols.module else {
        println!("(no module)");
        return;
    };
    println!("module {}", module);
    for (name, parameter) in &symbols.parameters {
        let value = parameter
            .value
            .map_or_else(|| parameter.text.clone(), |value| value.to_string());
        println!("  parameter {} = {}", name, value);
    }
    for (label, kind) in [
        ("port", SignalKind::Port),
        ("reg", SignalKind::Reg),
        ("wire", SignalKind::Wire),
        ("signal", SignalKind::Signal),
    ] {
        for record in symbols.signals.ordered(kind) {
            println!("  {} {}", label, describe(record));
        }
    }
    for instance in &symbols.instances {
        println!("  instance {} {}", instance.module, instance.name);
        for port in &instance.ports {
            match &port.top {
                Some(top) if port.connected => println!("    .{}({})", port.name, top),
                _ => println!("    .{}()", port.name),
            }
        }
    }
}

fn describe(record: &SignalRecord) -> String {
    let mut text = String::new();
    if let Some(direction) = record.direction {
        text.push_str(&format!("{:?} ", direction).to_lowercase());
    }
    if let Some(bitdef) = &record.bitdef {
        text.push_str(&format!("[{}] ", bitdef));
    }
    text.push_str(&record.name);
    if record.depth > 0 {
        text.push_str(&format!(" (depth {})", record.depth));
    }
    text
}
