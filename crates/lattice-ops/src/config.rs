//! Processing configuration.
//!
//! [`ProcessingConfig`] bundles the parameters of every filter so a caller
//! can build it once (in code or from YAML) and hand the relevant section to
//! each operation. Missing YAML fields take their defaults.
//!
//! # Example
//!
//! ```yaml
//! correlation:
//!   boundary: zero
//!   normalized: true
//! deriche:
//!   boundary: neumann
//! diffusion:
//!   amplitude: 40.0
//!   anisotropy: 0.8
//!   interpolation: runge_kutta2
//! ```

use std::path::Path;

use lattice_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::correlate::CorrelateOptions;
use crate::deriche::DericheConfig;
use crate::diffusion::DiffusionParams;

/// Parameters for correlation, recursive filtering and diffusion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Correlation and convolution options.
    pub correlation: CorrelateOptions,
    /// Recursive Gaussian filter options.
    pub deriche: DericheConfig,
    /// Anisotropic diffusion parameters.
    pub diffusion: DiffusionParams,
}

impl ProcessingConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for malformed YAML or out-of-range values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::invalid_argument("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a YAML configuration file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, otherwise as
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading processing config");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialises to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::invalid_argument("config", e.to_string()))
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        self.diffusion.validate()
    }
}
