use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Executable name of the console build of the engine.
pub const ENGINE_BINARY: &str = "TexasSolverConsole";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("solver engine not found (searched {} location(s))", searched.len())]
pub struct EngineNotFound {
    pub searched: Vec<PathBuf>,
}

/// Result of probing one candidate location.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CandidateCheck {
    pub path: PathBuf,
    pub exists: bool,
    pub executable: bool,
}

/// Finds the solving engine executable and remembers where it is.
///
/// The first successful [`resolve`](Self::resolve) caches the path for the
/// lifetime of the locator; later calls return it without touching the
/// filesystem. If the binary disappears afterwards the failure surfaces when
/// the engine is spawned, not here. [`invalidate`](Self::invalidate) is the
/// only way to force a new search.
#[derive(Debug)]
pub struct EngineLocator {
    candidates: Vec<PathBuf>,
    resolved: RwLock<Option<PathBuf>>,
}

impl EngineLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            resolved: RwLock::new(None),
        }
    }

    /// Standard search order: explicit override, macOS application bundle,
    /// build output, checkout root, then the working directory.
    pub fn with_defaults(engine_path: Option<&Path>, engine_root: &Path) -> Self {
        Self::new(default_candidates(engine_path, engine_root))
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Returns the cached path, resolving it on first use.
    pub fn resolve(&self) -> Result<PathBuf, EngineNotFound> {
        if let Some(path) = self.cached() {
            return Ok(path);
        }

        let mut guard = self
            .resolved
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // another caller may have resolved while we waited for the lock
        if let Some(path) = guard.as_ref() {
            return Ok(path.clone());
        }

        match self.candidates.iter().find(|path| is_executable(path)) {
            Some(path) => {
                tracing::info!(engine_path = %path.display(), "solver engine resolved");
                *guard = Some(path.clone());
                Ok(path.clone())
            }
            None => {
                tracing::warn!(
                    candidates = self.candidates.len(),
                    "solver engine not found in any candidate location"
                );
                Err(EngineNotFound {
                    searched: self.candidates.clone(),
                })
            }
        }
    }

    /// Peeks at the cache without searching.
    pub fn cached(&self) -> Option<PathBuf> {
        self.resolved
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Forgets the cached path so the next `resolve` searches again.
    pub fn invalidate(&self) {
        let mut guard = self
            .resolved
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.take() {
            tracing::info!(engine_path = %previous.display(), "solver engine cache cleared");
        }
    }

    /// Probes every candidate without touching the cache.
    pub fn inspect(&self) -> Vec<CandidateCheck> {
        self.candidates
            .iter()
            .map(|path| CandidateCheck {
                path: path.clone(),
                exists: path.exists(),
                executable: is_executable(path),
            })
            .collect()
    }
}

pub fn default_candidates(engine_path: Option<&Path>, engine_root: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(5);
    if let Some(path) = engine_path {
        candidates.push(path.to_path_buf());
    }
    candidates.push(
        engine_root
            .join("TexasSolverGui.app")
            .join("Contents")
            .join("MacOS")
            .join("TexasSolverGui"),
    );
    candidates.push(engine_root.join("build").join(ENGINE_BINARY));
    candidates.push(engine_root.join(ENGINE_BINARY));
    candidates.push(Path::new(".").join(ENGINE_BINARY));
    candidates
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
