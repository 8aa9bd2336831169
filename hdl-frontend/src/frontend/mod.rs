//! The parsing context that drives every other component over a source file.

mod behavior;
mod declarations;
mod directives;
mod instantiate;
mod resolve;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;

use crate::classify::{classify, Statement};
use crate::conditional::ConditionalStack;
use crate::construct::ConstructStack;
use crate::eval::{evaluate, Evaluated};
use crate::generate::GenerateExpander;
use crate::keywords::is_preprocessor_directive;
use crate::locator::{SearchPath, SourceLocator};
use crate::reconstruct::LineReconstructor;
use crate::scan::{first_word, is_identifier};
use crate::symbols::SymbolTable;
use crate::types::{ScopePath, TypeTable, DEFAULT_SCOPE};
use crate::{Diagnostic, FrontendError, Severity, SourceKind, SourceLocation};

use self::directives::EdgeRegion;
use self::instantiate::PendingInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
    Verilog,
    SystemVerilog,
}

/// Which parse a context belongs to. Submodule parses run in `Sub`, where
/// some fatal conditions are downgraded to warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Top,
    Sub,
}

#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub search_dirs: Vec<PathBuf>,
    /// `NAME` -> body, as if given with `` `define ``.
    pub defines: Vec<(String, String)>,
    pub dialect: Dialect,
    /// Parse submodules to wire instances. Child parses never do.
    pub resolve_instances: bool,
    /// Module to extract; the first module in the file when unset.
    pub top_module: Option<String>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            defines: Vec::new(),
            dialect: Dialect::Verilog,
            resolve_instances: true,
            top_module: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Restriction {
    FirstModule,
    Module(String),
    Package(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Outside,
    Module,
    SkippedModule,
    Package,
}

/// Parse position saved while a package is loaded from another file.
struct Suspended {
    restrict: Restriction,
    region: Region,
    scope: ScopePath,
    imports: Vec<String>,
    conditionals: ConditionalStack,
    constructs: ConstructStack,
    generate: GenerateExpander,
    in_subroutine: bool,
    parser_off: bool,
    skip_ifdef: bool,
    edge_region: Option<EdgeRegion>,
    location: SourceLocation,
}

pub struct Frontend {
    config: FrontendConfig,
    locator: Rc<dyn SourceLocator>,
    namespace: Namespace,
    restrict: Restriction,
    region: Region,
    symbols: SymbolTable,
    defines: HashMap<String, String>,
    conditionals: ConditionalStack,
    constructs: ConstructStack,
    generate: GenerateExpander,
    scope: ScopePath,
    imports: Vec<String>,
    in_subroutine: bool,
    parser_off: bool,
    skip_ifdef: bool,
    genvars: HashSet<String>,
    integers: HashSet<String>,
    loop_variables: HashSet<String>,
    pending_instance: Option<PendingInstance>,
    edge_region: Option<EdgeRegion>,
    /// Parameter values forced by the instantiating module.
    overrides: HashMap<String, String>,
    loading: HashSet<(PathBuf, Namespace)>,
    loaded_packages: HashSet<String>,
    diagnostics: Vec<Diagnostic>,
    location: SourceLocation,
}

impl Frontend {
    pub fn new(config: FrontendConfig) -> Self {
        let locator = Rc::new(SearchPath::new(config.search_dirs.clone()));
        Self::with_locator(config, locator)
    }

    pub fn with_locator(config: FrontendConfig, locator: Rc<dyn SourceLocator>) -> Self {
        let restrict = match &config.top_module {
            Some(name) => Restriction::Module(name.clone()),
            None => Restriction::FirstModule,
        };
        let defines = config.defines.iter().cloned().collect();
        Self {
            config,
            locator,
            namespace: Namespace::Top,
            restrict,
            region: Region::Outside,
            symbols: SymbolTable::new(),
            defines,
            conditionals: ConditionalStack::new(),
            constructs: ConstructStack::new(),
            generate: GenerateExpander::new(),
            scope: ScopePath::root(),
            imports: Vec::new(),
            in_subroutine: false,
            parser_off: false,
            skip_ifdef: false,
            genvars: HashSet::new(),
            integers: HashSet::new(),
            loop_variables: HashSet::new(),
            pending_instance: None,
            edge_region: None,
            overrides: HashMap::new(),
            loading: HashSet::new(),
            loaded_packages: HashSet::new(),
            diagnostics: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    /// Context for parsing one submodule on behalf of `self`.
    fn child(&self, module: &str, overrides: HashMap<String, String>) -> Self {
        let config = FrontendConfig {
            search_dirs: self.config.search_dirs.clone(),
            defines: self
                .defines
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            dialect: self.config.dialect,
            resolve_instances: false,
            top_module: Some(module.to_string()),
        };
        let mut child = Self::with_locator(config, Rc::clone(&self.locator));
        child.namespace = Namespace::Sub;
        child.overrides = overrides;
        child
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<(), FrontendError> {
        log::info!("Parsing {}", path.display());
        self.load_file(path)?;
        self.finish_top();
        Ok(())
    }

    pub fn parse_content(&mut self, content: &str) -> Result<(), FrontendError> {
        self.process_content(content, None)?;
        self.finish_top();
        Ok(())
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn into_symbols(self) -> SymbolTable {
        self.symbols
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn conditional_depth(&self) -> usize {
        self.conditionals.depth()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    fn types(&self) -> &TypeTable {
        &self.symbols.types
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}: {}", self.location, message);
        self.diagnostics.push(Diagnostic::new(
            Severity::Warning,
            message,
            self.location.clone(),
        ));
    }

    fn error(&mut self, message: String) {
        log::error!("{}: {}", self.location, message);
        self.diagnostics.push(Diagnostic::new(
            Severity::Error,
            message,
            self.location.clone(),
        ));
    }

    fn scoped_warning(&mut self, message: String, member: &str) {
        log::warn!("{}: {} ({}::{})", self.location, message, self.scope, member);
        let diagnostic = Diagnostic::new(Severity::Warning, message, self.location.clone())
            .with_scope(format!("{}::{}", self.scope, member));
        self.diagnostics.push(diagnostic);
    }

    fn finish_top(&mut self) {
        if self.conditionals.depth() > 0 {
            self.error(format!(
                "{} unterminated `ifdef/`ifndef block(s) at end of input",
                self.conditionals.depth()
            ));
        }
        if let Some(pending) = self.pending_instance.take() {
            self.error(format!(
                "&BeginInstance {} at line {} has no &EndInstance",
                pending.module, pending.line
            ));
        }
        if self.symbols.module.is_none() && self.namespace == Namespace::Top {
            self.warn("No module found".to_string());
        }
    }

    fn load_file(&mut self, path: &Path) -> Result<(), FrontendError> {
        let key = (
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()),
            self.namespace,
        );
        if self.loading.contains(&key) {
            return Err(FrontendError::CyclicLoad {
                path: path.to_path_buf(),
                location: self.location.clone(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.loading.insert(key.clone());
        let result = self.process_content(&content, Some(path));
        self.loading.remove(&key);
        result
    }

    fn process_content(&mut self, content: &str, file: Option<&Path>) -> Result<(), FrontendError> {
        let mut lines = LineReconstructor::new();
        let file = file.map(Path::to_path_buf);

        for (index, raw) in content.lines().enumerate() {
            self.location = SourceLocation::new(file.clone(), index + 1);
            let cleaned = lines.clean(raw);

            if lines.in_directive() || is_directive_line(&cleaned) {
                if let Some(directive) = lines.push_directive(index + 1, &cleaned) {
                    self.location.line = directive.line;
                    self.preprocess(&directive.text, file.as_deref())?;
                }
                continue;
            }
            if !self.skip_ifdef && !self.conditionals.is_active() {
                continue;
            }
            for statement in lines.push(index + 1, &cleaned) {
                self.location.line = statement.line;
                self.handle_statement(&statement.text)?;
            }
        }

        if let Some(line) = lines.finish() {
            self.location.line = line;
            self.error("Missing ';': statement never terminated".to_string());
        }
        Ok(())
    }

    fn preprocess(&mut self, text: &str, file: Option<&Path>) -> Result<(), FrontendError> {
        let body = text.trim_start_matches('`');
        let directive = first_word(body);
        let rest = body[directive.len()..].trim();

        let conditional = matches!(directive, "ifdef" | "ifndef" | "elsif" | "else" | "endif");
        if conditional && self.skip_ifdef {
            return Ok(());
        }
        let outcome = match directive {
            "ifdef" | "ifndef" => {
                let defined = self.defines.contains_key(first_word(rest));
                self.conditionals.push_ifdef(defined, directive == "ifndef");
                Ok(())
            }
            "elsif" => match self.conditionals.can_take_elsif() {
                Ok(open) => {
                    let condition = open && self.elsif_condition(rest);
                    self.conditionals.elsif(condition)
                }
                Err(err) => Err(err),
            },
            "else" => self.conditionals.else_branch(),
            "endif" => self.conditionals.endif(),
            _ => return self.apply_directive(directive, rest, file),
        };
        outcome.map_err(|_| FrontendError::UnbalancedConditional {
            directive: directive.to_string(),
            location: self.location.clone(),
        })
    }

    /// Non-conditional directives, honoured only in active regions.
    fn apply_directive(&mut self, directive: &str, rest: &str, file: Option<&Path>) -> Result<(), FrontendError> {
        if !self.conditionals.is_active() {
            return Ok(());
        }
        match directive {
            "define" => {
                let name = first_word(rest);
                if name.is_empty() {
                    self.warn("`define without a name".to_string());
                } else {
                    let mut value = &rest[name.len()..];
                    // macro arguments are not expanded, only skipped
                    if value.starts_with('(') {
                        if let Some(close) = value.find(')') {
                            value = &value[close + 1..];
                        }
                    }
                    log::debug!("`define {} {}", name, value.trim());
                    self.defines.insert(name.to_string(), value.trim().to_string());
                }
            }
            "undef" => {
                self.defines.remove(first_word(rest));
            }
            "undefineall" => self.defines.clear(),
            "include" => {
                let name = rest.trim_matches(|c| c == '"' || c == '<' || c == '>');
                self.include(name, file)?;
            }
            _ => log::debug!("Ignoring `{}", directive),
        }
        Ok(())
    }

    fn elsif_condition(&mut self, rest: &str) -> bool {
        if is_identifier(rest) {
            return self.defines.contains_key(rest);
        }
        match evaluate(rest, self) {
            Evaluated::Number(value) => value != 0,
            _ => {
                self.warn(format!("Cannot evaluate `elsif condition '{}'", rest));
                false
            }
        }
    }

    fn include(&mut self, name: &str, from: Option<&Path>) -> Result<(), FrontendError> {
        let path = self
            .locator
            .locate_include(name, from)
            .ok_or_else(|| FrontendError::MissingSource {
                kind: SourceKind::Include,
                name: name.to_string(),
                location: self.location.clone(),
            })?;
        log::debug!("Including {}", path.display());
        let location = self.location.clone();
        let result = self.load_file(&path);
        self.location = location;
        result
    }

    fn suspend(&mut self, restrict: Restriction) -> Suspended {
        Suspended {
            restrict: std::mem::replace(&mut self.restrict, restrict),
            region: std::mem::replace(&mut self.region, Region::Outside),
            scope: std::mem::take(&mut self.scope),
            imports: std::mem::take(&mut self.imports),
            conditionals: std::mem::take(&mut self.conditionals),
            constructs: std::mem::take(&mut self.constructs),
            generate: std::mem::take(&mut self.generate),
            in_subroutine: std::mem::take(&mut self.in_subroutine),
            parser_off: std::mem::take(&mut self.parser_off),
            skip_ifdef: std::mem::take(&mut self.skip_ifdef),
            edge_region: self.edge_region.take(),
            location: self.location.clone(),
        }
    }

    fn resume(&mut self, saved: Suspended) {
        self.restrict = saved.restrict;
        self.region = saved.region;
        self.scope = saved.scope;
        self.imports = saved.imports;
        self.conditionals = saved.conditionals;
        self.constructs = saved.constructs;
        self.generate = saved.generate;
        self.in_subroutine = saved.in_subroutine;
        self.parser_off = saved.parser_off;
        self.skip_ifdef = saved.skip_ifdef;
        self.edge_region = saved.edge_region;
        self.location = saved.location;
    }

    /// Makes sure `package` has been read, loading its file on first use.
    fn ensure_package(&mut self, package: &str) -> Result<(), FrontendError> {
        if self.loaded_packages.contains(package) || self.scope.package == package {
            return Ok(());
        }
        let path = self
            .locator
            .locate_package(package)
            .ok_or_else(|| FrontendError::MissingSource {
                kind: SourceKind::Package,
                name: package.to_string(),
                location: self.location.clone(),
            })?;
        log::debug!("Loading package {} from {}", package, path.display());

        let saved = self.suspend(Restriction::Package(package.to_string()));
        let result = self.load_file(&path);
        self.resume(saved);
        result?;

        if !self.loaded_packages.contains(package) {
            self.warn(format!(
                "{} does not define package '{}'",
                path.display(),
                package
            ));
            self.loaded_packages.insert(package.to_string());
        }
        Ok(())
    }

    fn handle_statement(&mut self, text: &str) -> Result<(), FrontendError> {
        if text.starts_with('&') {
            if let Some(directive) = crate::directive::parse_directive(text) {
                return self.handle_directive(directive);
            }
        }
        if self.parser_off {
            return Ok(());
        }
        if self.in_subroutine {
            if matches!(first_word(text), "endfunction" | "endtask") {
                self.in_subroutine = false;
            }
            return Ok(());
        }

        match self.region {
            Region::Module if self.scope.class == DEFAULT_SCOPE => {
                let text = if self.generate.is_active() {
                    self.generate.rewrite(text)
                } else {
                    text.to_string()
                };
                self.handle_module_text(&text)?;
                self.generate.track(&text);
                Ok(())
            }
            Region::SkippedModule => {
                if first_word(text) == "endmodule" {
                    self.region = Region::Outside;
                }
                Ok(())
            }
            _ => self.handle_declarative_text(text),
        }
    }

    /// Statements outside the extracted module, in packages and in classes,
    /// where only declarations matter.
    fn handle_declarative_text(&mut self, text: &str) -> Result<(), FrontendError> {
        match classify(text, false) {
            Statement::Module(header) if self.region == Region::Outside => {
                if self.wants_module(&header.name) {
                    self.enter_module(&header)?;
                } else {
                    log::debug!("Skipping module {}", header.name);
                    self.region = Region::SkippedModule;
                }
            }
            Statement::Package { name } if self.region == Region::Outside => {
                self.region = Region::Package;
                self.scope = ScopePath::package(&name);
                self.symbols.types.ensure_scope(&self.scope);
            }
            Statement::EndPackage if self.region == Region::Package => {
                log::debug!("Loaded package {}", self.scope.package);
                self.loaded_packages.insert(self.scope.package.clone());
                self.scope = ScopePath::root();
                self.region = Region::Outside;
            }
            Statement::Class { name } => {
                self.scope.class = name;
                self.symbols.types.ensure_scope(&self.scope);
            }
            Statement::EndClass => self.scope.class = DEFAULT_SCOPE.to_string(),
            Statement::Import { items } => self.import(&items)?,
            Statement::Parameter { local, body } => self.declare_parameters(&body, local),
            Statement::Typedef { body } => self.declare_typedef(&body)?,
            Statement::Function { name, .. } => self.enter_subroutine(&name, text),
            _ => {}
        }
        Ok(())
    }

    fn wants_module(&self, name: &str) -> bool {
        if self.symbols.module.is_some() {
            return false;
        }
        match &self.restrict {
            Restriction::FirstModule => true,
            Restriction::Module(target) => target == name,
            Restriction::Package(_) => false,
        }
    }

    fn enter_subroutine(&mut self, name: &str, text: &str) {
        if !name.is_empty() {
            self.symbols.functions.insert(name.to_string());
        }
        let prototype = matches!(first_word(text), "extern" | "pure")
            || text.contains("endfunction")
            || text.contains("endtask");
        if !prototype {
            self.in_subroutine = true;
        }
    }
}

fn is_directive_line(cleaned: &str) -> bool {
    cleaned
        .trim_start()
        .strip_prefix('`')
        .map_or(false, |rest| is_preprocessor_directive(first_word(rest)))
}
