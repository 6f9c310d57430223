// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean pipeline configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::geometry::DEFAULT_TOLERANCE;

/// Resolution applied when two local votes classify the same face differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the classification that was recorded first
    FirstWins,
    /// Overwrite with the most recent vote
    LastWins,
    /// Abort the operation with `CsgError::ClassificationAmbiguous`
    Reject,
}

impl FromStr for ConflictPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first_wins" | "first" => Ok(Self::FirstWins),
            "last_wins" | "last" => Ok(Self::LastWins),
            "reject" => Ok(Self::Reject),
            other => bail!("Unknown conflict policy: {}", other),
        }
    }
}

/// Configuration of `csg_difference`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsgConfig {
    /// Distance below which points are considered coincident
    pub tolerance: f64,
    /// How disagreeing face classifications are resolved
    pub conflict_policy: ConflictPolicy,
    /// Compute face-pair intersections on the rayon thread pool
    pub parallel: bool,
    /// Distance used to weld duplicated vertices of imported meshes
    pub weld_tolerance: f64,
}

impl Default for CsgConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            conflict_policy: ConflictPolicy::FirstWins,
            parallel: true,
            weld_tolerance: 1e-9,
        }
    }
}

impl CsgConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: CsgConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `dynmesh.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from("dynmesh.toml").exists() {
            Self::from_file("dynmesh.toml")?
        } else {
            Self::default()
        };

        if let Ok(tolerance) = std::env::var("DYNMESH_TOLERANCE") {
            config.tolerance = tolerance
                .parse()
                .with_context(|| format!("Invalid DYNMESH_TOLERANCE: {}", tolerance))?;
        }

        if let Ok(parallel) = std::env::var("DYNMESH_PARALLEL") {
            config.parallel = parallel.parse().unwrap_or(config.parallel);
        }

        if let Ok(policy) = std::env::var("DYNMESH_CONFLICT_POLICY") {
            config.conflict_policy = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            bail!("tolerance must be positive, got {}", self.tolerance);
        }
        if !(self.weld_tolerance.is_finite() && self.weld_tolerance >= 0.0) {
            bail!("weld_tolerance must be non-negative, got {}", self.weld_tolerance);
        }
        Ok(())
    }
}
