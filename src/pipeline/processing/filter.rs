use tracing::debug;

use crate::config::Setup;
use crate::constants::{NED_FLAG_COLUMN, NED_REDSHIFT_COLUMN, NED_TYPE_COLUMN};
use crate::domain::{CatalogTable, Column, ColumnData};
use crate::error::Result;
use crate::policy::{ExtragalacticPolicy, SearchType};

/// Name-level gate: false when the catalog matches a banned fragment for this search type
pub fn accept_catalog(catalog_name: &str, search_type: SearchType, setup: &Setup) -> bool {
    match setup
        .banned_catalogs(search_type)
        .iter()
        .find(|banned| catalog_name.contains(banned.as_str()))
    {
        Some(banned) => {
            debug!(
                "Catalog {} banned for {} searches ({})",
                catalog_name, search_type, banned
            );
            false
        }
        None => true,
    }
}

/// Drop extragalactic-database rows without a redshift, with a non-galaxy
/// object type, or with a non-spectroscopic redshift flag.
///
/// Missing type or flag columns exclude nothing.
pub fn filter_extragalactic_rows(
    table: &mut CatalogTable,
    policy: &ExtragalacticPolicy,
) -> Result<usize> {
    let before = table.num_rows();
    let redshift = table.require_column(NED_REDSHIFT_COLUMN)?;
    let types = table.column(NED_TYPE_COLUMN);
    let flags = table.column(NED_FLAG_COLUMN);

    let excluded = |column: Option<&Column>, row: usize, values: &[String]| {
        column
            .and_then(|c| c.str_at(row))
            .map(|value| values.iter().any(|v| v == value.trim()))
            .unwrap_or(false)
    };

    let keep: Vec<bool> = (0..before)
        .map(|row| {
            redshift.f64_at(row).is_some()
                && !excluded(types, row, &policy.excluded_types)
                && !excluded(flags, row, &policy.excluded_flags)
        })
        .collect();

    table.retain_rows(&keep)?;
    Ok(before - table.num_rows())
}

/// Text form a value takes when written out, used by the precision heuristic
fn rendered(data: &ColumnData, row: usize) -> Option<String> {
    match data {
        ColumnData::Float64(v) => v.get(row).map(|x| x.to_string()),
        ColumnData::Float32(v) => v.get(row).map(|x| x.to_string()),
        ColumnData::Int64(v) => v.get(row).map(|x| x.to_string()),
        ColumnData::Text(v) => v.get(row).cloned(),
    }
}

/// True when `text` has a run of `run_length` nines or zeros.
///
/// A value like 0.299999 or 0.1000001 is a float rounding artifact of a
/// low-precision estimate, not a measured spectroscopic redshift. Heuristic only.
pub fn looks_machine_rounded(text: &str, run_length: usize) -> bool {
    let nines = "9".repeat(run_length);
    let zeros = "0".repeat(run_length);
    text.contains(&nines) || text.contains(&zeros)
}

/// Drop rows whose redshift renders with a long run of 9s or 0s. Masked cells are kept.
pub fn remove_potential_photoz(
    table: &mut CatalogTable,
    redshift_column: &str,
    run_length: usize,
) -> Result<usize> {
    let before = table.num_rows();
    let column = table.require_column(redshift_column)?;

    let keep: Vec<bool> = (0..before)
        .map(|row| {
            if column.is_masked(row) {
                return true;
            }
            !rendered(&column.data, row)
                .map(|text| looks_machine_rounded(&text, run_length))
                .unwrap_or(false)
        })
        .collect();

    table.retain_rows(&keep)?;
    let removed = before - table.num_rows();
    if removed > 0 {
        debug!(
            "{}: dropped {} rows with machine-rounded redshifts",
            table.name, removed
        );
    }
    Ok(removed)
}
