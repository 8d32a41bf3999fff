// File: ./src/context.rs
//! Where skysync keeps its files.
//!
//! Everything that touches the filesystem (config loading, the log file)
//! receives an `&dyn AppContext`; nothing resolves paths on its own.
//! `StandardContext` is the platform layout (or everything under `--root`),
//! `TestContext` a throwaway directory removed on drop.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "skysync.log";

/// The two directories skysync uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirKind {
    Config,
    Data,
}

impl DirKind {
    /// Subdirectory name used under an explicit root.
    fn subdir(self) -> &'static str {
        match self {
            DirKind::Config => "config",
            DirKind::Data => "data",
        }
    }
}

pub trait AppContext: Send + Sync + std::fmt::Debug {
    /// Resolve (and create if needed) one of the application directories.
    fn dir(&self, kind: DirKind) -> Result<PathBuf>;

    fn get_config_dir(&self) -> Result<PathBuf> {
        self.dir(DirKind::Config)
    }

    fn get_data_dir(&self) -> Result<PathBuf> {
        self.dir(DirKind::Data)
    }

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// `None` when the data directory cannot be created; logging then stays
    /// on the terminal only.
    fn get_log_path(&self) -> Option<PathBuf> {
        self.get_data_dir().ok().map(|p| p.join(LOG_FILE_NAME))
    }
}

fn create_dir(path: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    Ok(path)
}

#[derive(Clone, Debug, Default)]
pub struct StandardContext {
    root: Option<PathBuf>,
}

impl StandardContext {
    /// With `Some(root)`, config and data live in `root/config` and
    /// `root/data` instead of the platform directories.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl AppContext for StandardContext {
    fn dir(&self, kind: DirKind) -> Result<PathBuf> {
        let path = match &self.root {
            Some(root) => root.join(kind.subdir()),
            None => {
                let proj = ProjectDirs::from("com", "skysync", "skysync")
                    .ok_or_else(|| anyhow::anyhow!("No home directory"))?;
                match kind {
                    DirKind::Config => proj.config_dir().to_path_buf(),
                    DirKind::Data => proj.data_dir().to_path_buf(),
                }
            }
        };
        create_dir(path)
    }
}

/// Isolated directory tree for tests.
#[derive(Debug)]
pub struct TestContext {
    pub root: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("skysync_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("failed to create TestContext temp dir");
        Self { root }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext for TestContext {
    fn dir(&self, kind: DirKind) -> Result<PathBuf> {
        create_dir(self.root.join(kind.subdir()))
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
