use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_MATCH_TOLERANCE_ARCSEC, DEFAULT_NED_URL, DEFAULT_RADIUS_DEG, DEFAULT_TIMEOUT_SECS,
    DEFAULT_UNCERTAINTY, DEFAULT_VIZIER_URL,
};
use crate::error::{RedshiftError, Result};
use crate::policy::{PolicyTable, SearchType};
use crate::units::Angle;

/// Immutable run configuration, loaded once and handed to every stage.
///
/// Any field may be left out of the file; defaults apply. Angle fields must
/// carry an angular unit (`"0.7 deg"`, `"1 arcsec"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Setup {
    /// Search radius around the target
    #[serde(default = "default_radius")]
    pub radius: Angle,
    /// A follow-up measurement below this uncertainty marks a redshift as spectroscopic
    #[serde(default = "default_uncertainty")]
    pub uncertainty: f64,
    /// Catalog-name fragments rejected for redshift searches
    #[serde(default)]
    pub banned_catalogs_redshift: Vec<String>,
    /// Catalog-name fragments rejected for velocity searches
    #[serde(default)]
    pub banned_catalogs_velocity: Vec<String>,
    /// Rows closer than this are treated as the same source
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance: Angle,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional replacement for the built-in keyword/unit policy
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
    #[serde(default)]
    pub services: ServiceEndpoints,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEndpoints {
    #[serde(default = "default_vizier_url")]
    pub vizier_url: String,
    #[serde(default = "default_ned_url")]
    pub ned_url: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            vizier_url: default_vizier_url(),
            ned_url: default_ned_url(),
        }
    }
}

fn default_radius() -> Angle {
    Angle::from_degrees(DEFAULT_RADIUS_DEG)
}

fn default_match_tolerance() -> Angle {
    Angle::from_arcsec(DEFAULT_MATCH_TOLERANCE_ARCSEC)
}

fn default_uncertainty() -> f64 {
    DEFAULT_UNCERTAINTY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_vizier_url() -> String {
    DEFAULT_VIZIER_URL.to_string()
}

fn default_ned_url() -> String {
    DEFAULT_NED_URL.to_string()
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            uncertainty: default_uncertainty(),
            banned_catalogs_redshift: Vec::new(),
            banned_catalogs_velocity: Vec::new(),
            match_tolerance: default_match_tolerance(),
            timeout_secs: default_timeout_secs(),
            policy_file: None,
            services: ServiceEndpoints::default(),
        }
    }
}

impl Setup {
    /// Read and validate a TOML configuration file
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            RedshiftError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let setup: Setup = toml::from_str(content)?;
        setup.validate()?;
        Ok(setup)
    }

    fn validate(&self) -> Result<()> {
        if self.radius.degrees() <= 0.0 {
            return Err(RedshiftError::Config(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if self.match_tolerance.degrees() <= 0.0 {
            return Err(RedshiftError::Config(format!(
                "match_tolerance must be positive, got {}",
                self.match_tolerance
            )));
        }
        if self.uncertainty <= 0.0 {
            return Err(RedshiftError::Config(format!(
                "uncertainty must be positive, got {}",
                self.uncertainty
            )));
        }
        Ok(())
    }

    /// Banned catalog-name fragments for one search type
    pub fn banned_catalogs(&self, search_type: SearchType) -> &[String] {
        match search_type {
            SearchType::Redshift => &self.banned_catalogs_redshift,
            SearchType::Velocity => &self.banned_catalogs_velocity,
        }
    }

    /// The policy table this run uses: the configured file, or the built-in one
    pub fn load_policy(&self) -> Result<PolicyTable> {
        match &self.policy_file {
            Some(path) => PolicyTable::load(path),
            None => Ok(PolicyTable::default()),
        }
    }
}
