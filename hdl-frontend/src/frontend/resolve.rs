use crate::eval::SymbolResolver;
use crate::types::{TypeRef, TypeTable};
use crate::FrontendError;

use super::{Frontend, Namespace};

impl Frontend {
    /// Resolves a typedef name as seen from the current scope, loading its
    /// package when qualified. An unknown type is fatal for the top module and
    /// a warning inside submodules.
    pub(super) fn lookup_type(
        &mut self,
        type_name: &str,
        signal: &str,
    ) -> Result<Option<TypeRef>, FrontendError> {
        if let Some((package, _)) = type_name.split_once("::") {
            self.ensure_package(package.trim())?;
        }
        if let Some(type_ref) = self.types().lookup(type_name, &self.scope, &self.imports) {
            return Ok(Some(type_ref));
        }

        let searched = TypeTable::search_order(&self.scope, &self.imports)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match self.namespace {
            Namespace::Top => Err(FrontendError::UnknownTypedef {
                reference: type_name.to_string(),
                signal: signal.to_string(),
                searched,
                location: self.location.clone(),
            }),
            Namespace::Sub => {
                self.warn(format!(
                    "Unknown typedef '{}' for '{}' (searched {})",
                    type_name, signal, searched
                ));
                Ok(None)
            }
        }
    }

    /// Like [`Frontend::lookup_type`] but never fatal; package load failures
    /// become error diagnostics.
    fn visible_type(&mut self, name: &str) -> Option<TypeRef> {
        if let Some((package, _)) = name.split_once("::") {
            if let Err(err) = self.ensure_package(package.trim()) {
                self.error(err.to_string());
                return None;
            }
        }
        self.types().lookup(name, &self.scope, &self.imports)
    }

    fn package_value(&mut self, package: &str, name: &str) -> Option<String> {
        if let Err(err) = self.ensure_package(package) {
            self.error(err.to_string());
            return None;
        }
        let types = self.types();
        types
            .package_parameter(package, name)
            .cloned()
            .or_else(|| types.package_enum_constant(package, name).map(|v| v.to_string()))
    }

    pub(super) fn scoped_value(&self, name: &str) -> Option<String> {
        let types = self.types();
        TypeTable::search_order(&self.scope, &self.imports)
            .iter()
            .filter_map(|scope| types.scope(scope))
            .find_map(|scope| scope.parameters.get(name).cloned())
            .or_else(|| {
                types
                    .enum_constant(name, &self.scope, &self.imports)
                    .map(|value| value.to_string())
            })
    }
}

impl SymbolResolver for Frontend {
    fn resolve_identifier(&mut self, name: &str) -> Option<String> {
        if let Some(macro_name) = name.strip_prefix('`') {
            return self.defines.get(macro_name).cloned();
        }
        if let Some((package, rest)) = name.split_once("::") {
            let rest = rest.rsplit("::").next().unwrap_or(rest);
            return self.package_value(package.trim(), rest.trim());
        }
        if let Some(parameter) = self.symbols.parameters.get(name) {
            return Some(parameter.substitution());
        }
        if let Some(value) = self.scoped_value(name) {
            return Some(value);
        }
        self.defines.get(name).cloned()
    }

    fn resolve_width(&mut self, reference: &str) -> Option<i64> {
        let reference = reference.trim();
        let mut path = reference.split('.').map(str::trim);
        let base = path.next()?;
        let members: Vec<&str> = path.collect();
        let base_name = base.split('[').next().unwrap_or(base).trim();

        if let Some(binding) = self.types().binding(base_name).cloned() {
            let width = self.types().member_width(&binding.type_ref, &members)?;
            if !members.is_empty() {
                return Some(width);
            }
            let factor = self.packed_factor(&binding.packed)?;
            return Some(width * factor);
        }
        if let Some(type_ref) = self.visible_type(base_name) {
            return self.types().member_width(&type_ref, &members);
        }
        if members.is_empty() {
            return self.symbols.find(base_name).and_then(|record| record.width());
        }
        None
    }
}
