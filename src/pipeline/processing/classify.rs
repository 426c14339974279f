use std::fmt;
use tracing::debug;

use crate::constants::{VIZIER_DEC_COLUMN, VIZIER_RA_COLUMN};
use crate::domain::{CatalogTable, Column};
use crate::pipeline::processing::normalize::velocity_to_redshift;
use crate::policy::{PolicyTable, RuleSet, SearchType};
use crate::units::is_speed;

/// Why a column did not make it into the candidate set
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRejection {
    /// Description carries none of the wanted keywords
    NoWantedKeyword,
    BannedKeyword(String),
    BannedNameFragment(String),
    BannedUnit(String),
    /// Velocity search on a column whose unit is missing or not a speed
    NotASpeed,
    /// Declared fewer decimals than the policy minimum
    LowPrecision(u32),
    /// Declared no precision where the policy requires one
    NoDeclaredPrecision,
}

impl fmt::Display for ColumnRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRejection::NoWantedKeyword => write!(f, "no wanted keyword"),
            ColumnRejection::BannedKeyword(k) => write!(f, "banned keyword '{}'", k),
            ColumnRejection::BannedNameFragment(n) => write!(f, "banned name fragment '{}'", n),
            ColumnRejection::BannedUnit(u) => write!(f, "banned unit '{}'", u),
            ColumnRejection::NotASpeed => write!(f, "unit is not a speed"),
            ColumnRejection::LowPrecision(p) => write!(f, "declares only {} decimals", p),
            ColumnRejection::NoDeclaredPrecision => write!(f, "declares no precision"),
        }
    }
}

/// Picks the single redshift-bearing column of a catalog, if any
pub trait ColumnClassifier {
    fn classify(&self, table: &CatalogTable, search_type: SearchType) -> Option<String>;
}

/// Keyword/unit classifier driven by a [`PolicyTable`]
pub struct KeywordClassifier<'a> {
    pub policy: &'a PolicyTable,
    /// Columns never considered (the position columns)
    pub skip_columns: Vec<String>,
}

impl<'a> KeywordClassifier<'a> {
    pub fn new(policy: &'a PolicyTable) -> Self {
        Self {
            policy,
            skip_columns: vec![VIZIER_RA_COLUMN.to_string(), VIZIER_DEC_COLUMN.to_string()],
        }
    }

    /// Inclusion and exclusion tests for one column
    pub fn check_column(
        &self,
        column: &Column,
        rules: &RuleSet,
    ) -> std::result::Result<(), ColumnRejection> {
        let description = column.description.as_str();

        if !rules
            .wanted_keywords
            .iter()
            .any(|k| description.contains(k.as_str()))
        {
            return Err(ColumnRejection::NoWantedKeyword);
        }
        if let Some(keyword) = rules
            .banned_keywords
            .iter()
            .find(|k| description.contains(k.as_str()))
        {
            return Err(ColumnRejection::BannedKeyword(keyword.clone()));
        }
        if let Some(fragment) = rules
            .banned_name_fragments
            .iter()
            .find(|n| column.name.contains(n.as_str()))
        {
            return Err(ColumnRejection::BannedNameFragment(fragment.clone()));
        }
        if let Some(unit) = column.unit.as_deref() {
            if let Some(banned) = rules.banned_units.iter().find(|u| unit.contains(u.as_str())) {
                return Err(ColumnRejection::BannedUnit(banned.clone()));
            }
        }
        if rules.require_speed_unit && !column.unit.as_deref().map(is_speed).unwrap_or(false) {
            return Err(ColumnRejection::NotASpeed);
        }
        if rules.require_declared_precision && column.precision.is_none() {
            return Err(ColumnRejection::NoDeclaredPrecision);
        }
        if let (Some(minimum), Some(declared)) = (rules.min_declared_precision, column.precision) {
            if declared < minimum {
                return Err(ColumnRejection::LowPrecision(declared));
            }
        }
        Ok(())
    }

    /// Every column passing the inclusion and exclusion tests, in table order
    pub fn candidates<'t>(&self, table: &'t CatalogTable, search_type: SearchType) -> Vec<&'t Column> {
        let rules = self.policy.rules(search_type);
        table
            .columns()
            .iter()
            .filter(|column| !self.skip_columns.iter().any(|s| *s == column.name))
            .filter(|column| match self.check_column(column, rules) {
                Ok(()) => true,
                Err(ColumnRejection::NoWantedKeyword) => false,
                Err(reason) => {
                    debug!("{}: column {} rejected, {}", table.name, column.name, reason);
                    false
                }
            })
            .collect()
    }

    /// Spectroscopic marker wins, otherwise the first candidate
    fn break_tie<'t>(&self, candidates: &[&'t Column], rules: &RuleSet) -> Option<&'t Column> {
        candidates
            .iter()
            .find(|column| {
                rules
                    .spectroscopic_markers
                    .iter()
                    .any(|m| column.description.contains(m.as_str()))
            })
            .or_else(|| candidates.first())
            .copied()
    }
}

impl<'a> ColumnClassifier for KeywordClassifier<'a> {
    fn classify(&self, table: &CatalogTable, search_type: SearchType) -> Option<String> {
        let candidates = self.candidates(table, search_type);
        let chosen = self.break_tie(&candidates, self.policy.rules(search_type))?;

        if candidates.len() > 1 {
            debug!(
                "{}: {} candidates, picked {}",
                table.name,
                candidates.len(),
                chosen.name
            );
        }
        // Velocities are judged after conversion, so integer km/s columns qualify
        let converted = velocity_to_redshift(chosen);
        let values = converted.as_ref().unwrap_or(chosen);
        if !values.data.is_float() {
            debug!(
                "{}: column {} is {}, not floating point",
                table.name,
                chosen.name,
                values.data.dtype()
            );
            return None;
        }
        if values.all_masked() {
            debug!("{}: column {} has no values", table.name, chosen.name);
            return None;
        }
        Some(chosen.name.clone())
    }
}
