//! Refresh-token denylist
//!
//! Tokens known to be leaked or revoked out of band are rejected before any
//! call to the identity provider is made.

use std::fs;

use subtle::ConstantTimeEq;

use crate::config::DenylistConfig;
use crate::{Error, Result};

/// Static set of refresh tokens that must never be exchanged
#[derive(Default)]
pub struct Denylist {
    tokens: Vec<String>,
}

impl Denylist {
    /// Create a denylist from explicit tokens. Blank entries are dropped.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        tokens.sort();
        tokens.dedup();
        Self { tokens }
    }

    /// Build from configuration: inline tokens plus the optional token file
    ///
    /// # Errors
    ///
    /// Returns an error if the configured file cannot be read.
    pub fn from_config(config: &DenylistConfig) -> Result<Self> {
        let mut tokens = config.tokens.clone();

        if let Some(ref path) = config.file {
            let contents = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read denylist {}: {e}", path.display()))
            })?;
            tokens.extend(parse_token_file(&contents));
        }

        Ok(Self::new(tokens))
    }

    /// Exact-match lookup
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        // Constant-time per entry so lookups don't leak how much of a token matched
        self.tokens
            .iter()
            .fold(false, |hit, t| hit | bool::from(t.as_bytes().ct_eq(token.as_bytes())))
    }

    /// Number of denylisted tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the denylist is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for Denylist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Denylist").field("len", &self.len()).finish()
    }
}

fn parse_token_file(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}
