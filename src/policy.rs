//! Keyword/unit policy tables.
//!
//! Pure data: which description keywords make a column interesting, which
//! ones disqualify it, which name fragments and units mark non-measurement
//! columns, and which object types/flags the extragalactic database uses
//! for things that are not individual spectroscopic galaxies. The defaults
//! below can be replaced wholesale by a TOML file without touching code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{REDSHIFT_UCD, VELOCITY_UCD};
use crate::error::{RedshiftError, Result};

/// Which kind of column a catalog-aggregator search is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Redshift,
    Velocity,
}

impl SearchType {
    pub fn all() -> [SearchType; 2] {
        [SearchType::Redshift, SearchType::Velocity]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Redshift => "redshift",
            SearchType::Velocity => "velocity",
        }
    }

    /// UCD filter sent with the remote search
    pub fn ucd(&self) -> &'static str {
        match self {
            SearchType::Redshift => REDSHIFT_UCD,
            SearchType::Velocity => VELOCITY_UCD,
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = RedshiftError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "redshift" => Ok(SearchType::Redshift),
            "velocity" => Ok(SearchType::Velocity),
            other => Err(RedshiftError::Config(format!("unknown search type '{}'", other))),
        }
    }
}

/// Column-selection rules for one search type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// At least one must appear in the column description
    pub wanted_keywords: Vec<String>,
    /// None may appear in the column description
    pub banned_keywords: Vec<String>,
    /// None may appear in the column name
    pub banned_name_fragments: Vec<String>,
    /// None may appear in the column unit
    pub banned_units: Vec<String>,
    /// Description markers that win a tie between several candidates
    pub spectroscopic_markers: Vec<String>,
    /// Column unit must be a speed
    #[serde(default)]
    pub require_speed_unit: bool,
    /// Columns declaring fewer decimals than this are not candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_declared_precision: Option<u32>,
    /// Columns that declare no precision at all are not candidates
    #[serde(default)]
    pub require_declared_precision: bool,
}

/// Row-level exclusions for the extragalactic database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtragalacticPolicy {
    /// Object types that are groups, clusters, pairs or otherwise not a galaxy
    pub excluded_types: Vec<String>,
    /// Redshift qualifiers marking photometric, estimated or tentative values
    pub excluded_flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    /// Length of the run of repeated 9s or 0s that marks a machine-rounded value
    #[serde(default = "default_run_length")]
    pub photometric_run_length: usize,
    pub redshift: RuleSet,
    pub velocity: RuleSet,
    pub extragalactic: ExtragalacticPolicy,
}

fn default_run_length() -> usize {
    6
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PolicyTable {
    pub fn rules(&self, search_type: SearchType) -> &RuleSet {
        match search_type {
            SearchType::Redshift => &self.redshift,
            SearchType::Velocity => &self.velocity,
        }
    }

    /// Load a policy table from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RedshiftError::Config(format!(
                "Failed to read policy file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let policy: PolicyTable = toml::from_str(&content)?;
        if policy.photometric_run_length == 0 {
            return Err(RedshiftError::Config(
                "photometric_run_length must be at least 1".to_string(),
            ));
        }
        Ok(policy)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            photometric_run_length: default_run_length(),
            redshift: RuleSet {
                wanted_keywords: strings(&["Redshift", "redshift"]),
                banned_keywords: strings(&[
                    "cluster",
                    "Cluster",
                    "sigma",
                    "Sigma",
                    "Photometric",
                    "photometric",
                    "origin",
                    "Origin",
                    "reference",
                    "Reference",
                    "citation",
                    "Citation",
                    "number",
                    "Number",
                    "uncertainty",
                    "Uncertainty",
                    "error",
                    "Error on",
                    "Error of",
                    "distance modulus",
                    "quality code",
                    "Quality flag",
                    "nearest neighbor",
                    "of the neighbors",
                    "Type of",
                    "Source of",
                    "Source for",
                    "photo-z",
                    "Display the Object type",
                    "of the center",
                    "of the group center",
                    "corrected to the CMB",
                    "qualifier",
                    "Reliability of",
                    "Peak of",
                    "Flag",
                    "source flag",
                    "FWHM",
                    "Identifier",
                ]),
                banned_name_fragments: strings(&["ph", "f_", "n_", "r_", "e_"]),
                banned_units: strings(&["Mpc", "Y:M:D", "mag"]),
                spectroscopic_markers: strings(&["spectroscopic", "Spectroscopic"]),
                require_speed_unit: false,
                min_declared_precision: Some(4),
                require_declared_precision: true,
            },
            velocity: RuleSet {
                wanted_keywords: strings(&["velocity", "Velocity", "redshift", "Redshift"]),
                banned_keywords: strings(&[
                    "proper motion",
                    "Unreliable",
                    "dispersion",
                    "expansion",
                    "Expansion",
                    "transverse",
                    "Transverse",
                    "Tangential",
                    "tangential",
                    "Rotational",
                    "rotational",
                    "peculiar",
                    "Peculiar",
                    "error of",
                    "Uncertainty of",
                    "CIV troughs",
                    "BAL troughs",
                    "velocity width",
                    "component of",
                    "radial velocity deviation",
                    "precision needed for",
                    "sigma",
                    "CMB frame",
                    "CMB reference",
                    "microturbulence",
                    "Microturbulence",
                    "microturbulent",
                    "Microtubulent",
                    "apparent velocity",
                    "velocity shift",
                    "Velocity shift",
                    "group velocity",
                    "velocity of group",
                    "Group center velocity",
                    "component U",
                    "component V",
                    "component W",
                    "velocity U",
                    "velocity V",
                    "velocity W",
                    "U vel",
                    "V vel",
                    "W vel",
                    "Uvel",
                    "Vvel",
                    "Wvel",
                    "along x",
                    "along y",
                    "along z",
                    "Vx",
                    "Vy",
                    "Vz",
                    "VX",
                    "VY",
                    "VZ",
                    "center U",
                    "rotation V",
                    "Pole W",
                    "in local sheet reference frame",
                    "Interstellar",
                    "Local Standard of Rest",
                    "cylindrical reference frame",
                    "on GLON",
                    "on GLAT",
                    "radial velocity difference",
                    "Minimum velocity",
                    "Maximum velocity",
                    "maximum velocity",
                    "minimum velocity",
                    "Radial velocity correction",
                    "velocity offset",
                    "Velocity difference between",
                    "cluster velocity",
                    "cluster mean velocity",
                ]),
                banned_name_fragments: strings(&["e_"]),
                banned_units: strings(&["Mpc", "Y:M:D", "mag"]),
                spectroscopic_markers: strings(&["spectroscopic", "Spectroscopic"]),
                require_speed_unit: true,
                min_declared_precision: None,
                require_declared_precision: false,
            },
            extragalactic: ExtragalacticPolicy {
                excluded_types: strings(&[
                    "QGroup", "GClstr", "GGroup", "GPair", "GTrpl", "Other", "PofG",
                ]),
                excluded_flags: strings(&[
                    "::", "?", "CONT", "EST", "FoF", "LUM", "MFA", "MOD", "PHOT", "PEAK", "PRED",
                    "SED", "TENT", "TOMO",
                ]),
            },
        }
    }
}
