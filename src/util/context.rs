//! Global context for crossport operations.
//!
//! Provides centralized access to the working directory, the project root
//! (the directory holding `Crossport.toml`), and the merged tool config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::util::config::{global_config_dir, load_config, project_config_path, Config};

/// File name of the app catalog.
pub const CATALOG_FILE: &str = "Crossport.toml";

/// Failure to locate the app catalog.
#[derive(Debug, Error)]
pub enum CatalogLookupError {
    #[error("could not find `{CATALOG_FILE}` in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Global config directory (~/.crossport/)
    home: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            home: global_config_dir(),
        }
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join("config.toml"))
    }

    /// Find `Crossport.toml` starting from cwd and searching upward.
    pub fn find_catalog(&self) -> Result<PathBuf, CatalogLookupError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(CATALOG_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(CatalogLookupError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Find the project root (directory containing `Crossport.toml`).
    pub fn find_project_root(&self) -> Result<PathBuf, CatalogLookupError> {
        let catalog = self.find_catalog()?;
        Ok(catalog
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone()))
    }

    /// Load the merged global + project tool config.
    pub fn load_config(&self, project_root: &Path) -> Config {
        let project_path = project_config_path(project_root);
        match self.config_path() {
            Some(global) => load_config(&global, &project_path),
            None => load_config(Path::new(""), &project_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_catalog_walks_upward() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CATALOG_FILE), "[app]\nname = \"x\"\n").unwrap();
        let nested = tmp.path().join("net").join("src");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        let root = ctx.find_project_root().unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_find_catalog_not_found() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        assert!(matches!(
            ctx.find_catalog(),
            Err(CatalogLookupError::NotFound { .. })
        ));
    }

    #[test]
    fn test_project_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".crossport");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), "[build]\nmode = \"release\"\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = ctx.load_config(tmp.path());
        assert_eq!(config.build.mode.as_deref(), Some("release"));
    }
}
