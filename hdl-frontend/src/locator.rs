use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["sv", "v", "svh", "vh"];

/// Finds source files for modules, packages and includes.
pub trait SourceLocator {
    fn locate_module(&self, name: &str) -> Option<PathBuf>;

    fn locate_package(&self, name: &str) -> Option<PathBuf> {
        self.locate_module(name)
    }

    /// `from` is the file containing the `` `include ``.
    fn locate_include(&self, name: &str, from: Option<&Path>) -> Option<PathBuf>;
}

/// Scans a list of directories for `<name>.{sv,v,svh,vh}`.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn find_named(&self, name: &str) -> Option<PathBuf> {
        for dir in &self.dirs {
            for extension in EXTENSIONS {
                let candidate = dir.join(format!("{}.{}", name, extension));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl SourceLocator for SearchPath {
    fn locate_module(&self, name: &str) -> Option<PathBuf> {
        self.find_named(name)
    }

    fn locate_package(&self, name: &str) -> Option<PathBuf> {
        self.find_named(name)
            .or_else(|| name.strip_suffix("_pkg").and_then(|base| self.find_named(base)))
    }

    fn locate_include(&self, name: &str, from: Option<&Path>) -> Option<PathBuf> {
        let requested = Path::new(name);
        if requested.is_absolute() {
            return requested.is_file().then(|| requested.to_path_buf());
        }

        // Relative to the including file first
        if let Some(parent) = from.and_then(Path::parent) {
            let candidate = parent.join(requested);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        self.dirs
            .iter()
            .map(|dir| dir.join(requested))
            .find(|candidate| candidate.is_file())
    }
}
