use std::fs;
use std::path::{Path, PathBuf};

use hdl_frontend::{Diagnostic, Dialect, Frontend, FrontendConfig, FrontendError, Severity};
use tempfile::TempDir;

pub fn create_temp_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// A scratch directory that doubles as the only search directory, so
/// submodules, packages and includes written into it are found by name.
pub struct TestHarness {
    dir: TempDir,
    dialect: Dialect,
    defines: Vec<(String, String)>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            dialect: Dialect::Verilog,
            defines: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn system_verilog(mut self) -> Self {
        self.dialect = Dialect::SystemVerilog;
        self
    }

    #[allow(dead_code)]
    pub fn with_define(mut self, name: &str, value: &str) -> Self {
        self.defines.push((name.to_string(), value.to_string()));
        self
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, filename: &str, content: &str) -> PathBuf {
        create_temp_file(&self.dir, filename, content)
    }

    pub fn config(&self) -> FrontendConfig {
        FrontendConfig {
            search_dirs: vec![self.dir.path().to_path_buf()],
            defines: self.defines.clone(),
            dialect: self.dialect,
            ..FrontendConfig::default()
        }
    }

    pub fn parse_file(&self, filename: &str) -> Result<Frontend, FrontendError> {
        let mut frontend = Frontend::new(self.config());
        frontend.parse_file(&self.dir.path().join(filename))?;
        Ok(frontend)
    }

    #[allow(dead_code)]
    pub fn parse_file_ok(&self, filename: &str) -> Frontend {
        self.parse_file(filename)
            .unwrap_or_else(|err| panic!("Failed to parse {}: {}", filename, err))
    }

    pub fn parse_content(&self, content: &str) -> Result<Frontend, FrontendError> {
        let mut frontend = Frontend::new(self.config());
        frontend.parse_content(content)?;
        Ok(frontend)
    }

    #[allow(dead_code)]
    pub fn parse_content_ok(&self, content: &str) -> Frontend {
        self.parse_content(content)
            .unwrap_or_else(|err| panic!("Failed to parse content: {}", err))
    }

    #[allow(dead_code)]
    pub fn parse_content_err(&self, content: &str) -> FrontendError {
        match self.parse_content(content) {
            Ok(_) => panic!("Expected parsing to fail but it succeeded"),
            Err(err) => err,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
pub fn parse_ok(content: &str) -> Frontend {
    TestHarness::default().parse_content_ok(content)
}

#[allow(dead_code)]
pub fn parse_err(content: &str) -> FrontendError {
    TestHarness::default().parse_content_err(content)
}

#[allow(dead_code)]
pub fn warnings(frontend: &Frontend) -> Vec<&Diagnostic> {
    frontend
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Warning)
        .collect()
}

#[allow(dead_code)]
pub fn errors(frontend: &Frontend) -> Vec<&Diagnostic> {
    frontend
        .diagnostics()
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .collect()
}
