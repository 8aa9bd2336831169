pub mod classify;
pub mod cli;
pub mod conditional;
pub mod construct;
pub mod directive;
pub mod eval;
pub mod expr;
pub mod extract;
pub mod frontend;
pub mod generate;
pub mod instance;
pub mod keywords;
pub mod locator;
pub mod reconstruct;
pub mod scan;
pub mod symbols;
pub mod types;
pub mod unify;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub use cli::{parse_vcs_style_args, ParsedArgs};
pub use eval::{Bound, Evaluated};
pub use frontend::{Dialect, Frontend, FrontendConfig, Namespace};
pub use locator::{SearchPath, SourceLocator};
pub use symbols::SymbolTable;
pub use unify::{Mode, PortDirection, SignalKind, SignalRecord};

/// Where in the sources something happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: usize, // 1-based, 0 when unknown
}

impl SourceLocation {
    pub fn new(file: Option<PathBuf>, line: usize) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file.display(), self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    Module,
    Package,
    Include,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Module => write!(f, "module"),
            SourceKind::Package => write!(f, "package"),
            SourceKind::Include => write!(f, "include file"),
        }
    }
}

/// Conditions the engine cannot continue from. Everything else is reported as a
/// [`Diagnostic`] and parsing goes on.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("Failed to read file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{location}: cannot locate {kind} '{name}'")]
    MissingSource {
        kind: SourceKind,
        name: String,
        location: SourceLocation,
    },

    #[error("{location}: `{directive} without a matching `ifdef/`ifndef")]
    UnbalancedConditional {
        directive: String,
        location: SourceLocation,
    },

    #[error("{location}: unknown typedef '{reference}' for '{signal}' (searched {searched})")]
    UnknownTypedef {
        reference: String,
        signal: String,
        searched: String,
        location: SourceLocation,
    },

    #[error("{location}: module '{module}' (instance '{instance}') has no port '{port}'")]
    UnknownPort {
        module: String,
        instance: String,
        port: String,
        location: SourceLocation,
    },

    #[error("{location}: module '{module}' (instance '{instance}') has no parameter '{parameter}'")]
    UnknownParameter {
        module: String,
        instance: String,
        parameter: String,
        location: SourceLocation,
    },

    #[error("{location}: '{construct}' is not allowed")]
    Disallowed {
        construct: String,
        location: SourceLocation,
    },

    #[error("{location}: cyclic load of {}", path.display())]
    CyclicLoad {
        path: PathBuf,
        location: SourceLocation,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    /// `package::class::member` path of the offending symbol, when there is one.
    pub scope: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: String, location: SourceLocation) -> Self {
        Self {
            severity,
            message,
            location,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: String) -> Self {
        self.scope = Some(scope);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", self.location, severity, self.message)?;
        if let Some(scope) = &self.scope {
            write!(f, " (in {})", scope)?;
        }
        Ok(())
    }
}
