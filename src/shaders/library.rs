//! The WGSL kernel sources, embedded into the binary at build time. A module
//! may pull in shared code with a `// #import <name>` line; composition
//! inlines each import once, in dependency order, before the code that needs
//! it. Unknown modules and import cycles are construction-time errors, never
//! a missing-file failure at startup.

use std::collections::HashMap;

use thiserror::Error;

const IMPORT_PREFIX: &str = "// #import ";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader module `{module}` (imported from `{requested_by}`) does not exist")]
    UnknownModule { module: String, requested_by: String },
    #[error("shader import cycle through `{module}`")]
    ImportCycle { module: String },
}

pub struct ShaderLibrary {
    modules: HashMap<&'static str, &'static str>,
}

impl ShaderLibrary {
    /// The kernel set this renderer ships with.
    pub fn builtin() -> Self {
        Self::from_modules([
            ("rng", include_str!("wgsl/rng.wgsl")),
            ("gbuffer", include_str!("wgsl/gbuffer.wgsl")),
            ("tracer", include_str!("wgsl/tracer.wgsl")),
            ("svgf_temporal", include_str!("wgsl/svgf_temporal.wgsl")),
            ("svgf_spatial", include_str!("wgsl/svgf_spatial.wgsl")),
            ("present", include_str!("wgsl/present.wgsl")),
        ])
    }

    pub fn from_modules<const N: usize>(modules: [(&'static str, &'static str); N]) -> Self {
        Self {
            modules: modules.into_iter().collect(),
        }
    }

    /// Flatten `entry` and everything it imports into one WGSL source.
    pub fn compose(&self, entry: &str) -> Result<String, ShaderError> {
        let mut order = Vec::new();
        self.schedule(entry, entry, &mut order, &mut Vec::new())?;

        let mut source = String::new();
        for name in order {
            for line in self.modules[name].lines() {
                if !line.trim_start().starts_with(IMPORT_PREFIX) {
                    source.push_str(line);
                    source.push('\n');
                }
            }
            source.push('\n');
        }
        Ok(source)
    }

    /// Post-order walk: a module lands in `order` after everything it
    /// imports, and at most once, so shared modules are emitted a single
    /// time. `visiting` holds the active import chain for cycle detection.
    fn schedule(
        &self,
        name: &str,
        requested_by: &str,
        order: &mut Vec<&'static str>,
        visiting: &mut Vec<&'static str>,
    ) -> Result<(), ShaderError> {
        let Some((&key, source)) = self.modules.get_key_value(name) else {
            return Err(ShaderError::UnknownModule {
                module: name.to_string(),
                requested_by: requested_by.to_string(),
            });
        };
        if order.contains(&key) {
            return Ok(());
        }
        if visiting.contains(&key) {
            return Err(ShaderError::ImportCycle {
                module: key.to_string(),
            });
        }

        visiting.push(key);
        for line in source.lines() {
            if let Some(import) = line.trim_start().strip_prefix(IMPORT_PREFIX) {
                self.schedule(import.trim(), key, order, visiting)?;
            }
        }
        visiting.pop();
        order.push(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kernels_compose() {
        let lib = ShaderLibrary::builtin();
        for entry in ["tracer", "svgf_temporal", "svgf_spatial", "present"] {
            let source = lib.compose(entry).unwrap();
            assert!(
                source.contains("fn main") || source.contains("fn fs_main"),
                "{entry} has no entry point"
            );
            assert!(!source.contains("#import"), "{entry} leaked an import line");
        }
    }

    #[test]
    fn test_imports_precede_importer() {
        let lib = ShaderLibrary::from_modules([
            ("helpers", "fn helper() {}"),
            ("kernel", "// #import helpers\nfn main() { helper(); }"),
        ]);
        let source = lib.compose("kernel").unwrap();
        assert!(source.find("fn helper").unwrap() < source.find("fn main").unwrap());
    }

    #[test]
    fn test_shared_import_emitted_once() {
        let lib = ShaderLibrary::from_modules([
            ("shared", "fn shared_fn() {}"),
            ("a", "// #import shared\nfn a_fn() {}"),
            ("b", "// #import shared\nfn b_fn() {}"),
            ("kernel", "// #import a\n// #import b\nfn main() {}"),
        ]);
        let source = lib.compose("kernel").unwrap();
        assert_eq!(source.matches("fn shared_fn").count(), 1);
    }

    #[test]
    fn test_unknown_import_names_the_importer() {
        let lib = ShaderLibrary::from_modules([("kernel", "// #import missing\nfn main() {}")]);
        let err = lib.compose("kernel").unwrap_err();
        assert!(matches!(
            err,
            ShaderError::UnknownModule { ref module, ref requested_by }
                if module == "missing" && requested_by == "kernel"
        ));
    }

    #[test]
    fn test_import_cycle_is_an_error() {
        let lib =
            ShaderLibrary::from_modules([("a", "// #import b\n"), ("b", "// #import a\n")]);
        assert!(matches!(
            lib.compose("a"),
            Err(ShaderError::ImportCycle { .. })
        ));
    }
}
