//! Shader source loading.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::errors::{Result, TidalError};

/// Provides the text of a named program.
///
/// `path` is the file the program lives in and `name` selects the program
/// inside it, so one file may hold several programs.
pub trait ShaderLoader {
    fn load_source(&mut self, path: &str, name: &str) -> Result<String>;
}

/// Reads shader files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsShaderLoader {
    root: PathBuf,
}

impl FsShaderLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ShaderLoader for FsShaderLoader {
    fn load_source(&mut self, path: &str, name: &str) -> Result<String> {
        let full = self.root.join(path);
        log::debug!("Loading program '{name}' from {}", full.display());
        std::fs::read_to_string(&full).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                TidalError::AssetNotFound(full.display().to_string())
            } else {
                TidalError::IoError(err)
            }
        })
    }
}

/// Serves sources registered in memory, keyed by program name.
#[derive(Debug, Clone, Default)]
pub struct StaticShaderLoader {
    sources: FxHashMap<String, String>,
}

impl StaticShaderLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }
}

impl ShaderLoader for StaticShaderLoader {
    fn load_source(&mut self, path: &str, name: &str) -> Result<String> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| TidalError::AssetNotFound(format!("{path}#{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_loader_serves_by_name() {
        let mut loader = StaticShaderLoader::new().with_source("BLOOM", "// bloom");
        assert_eq!(loader.load_source("bloom.wgsl", "BLOOM").unwrap(), "// bloom");
        assert!(matches!(
            loader.load_source("blur.wgsl", "BLUR"),
            Err(TidalError::AssetNotFound(_))
        ));
    }

    #[test]
    fn fs_loader_reports_missing_files() {
        let mut loader = FsShaderLoader::new("/nonexistent-shader-root");
        assert!(matches!(
            loader.load_source("water.wgsl", "WATER"),
            Err(TidalError::AssetNotFound(_))
        ));
    }
}
