use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// User id → bearer token.
pub type TokenMap = BTreeMap<String, String>;

/// Flat JSON file holding the cached bearer tokens.
///
/// The file is rewritten wholesale on every save; there is a single writer.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache. A missing file is an empty cache.
    pub fn load(&self) -> Result<TokenMap> {
        if !self.path.exists() {
            return Ok(TokenMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(TokenMap::new());
        }
        let tokens: TokenMap = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(tokens)
    }

    pub fn save(&self, tokens: &TokenMap) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(tokens).context("failed to serialize token cache")?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
