use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::constants::GROUP_ID_COLUMN;
use crate::domain::{CatalogTable, Column};
use crate::error::Result;

/// Characters left in the six-decimal fixed-point rendering of `z` once
/// trailing zeros are stripped (`0.102` -> `"0.102"` -> 5).
///
/// A crude stand-in for measurement precision: it grows with magnitude and
/// sign, so only compare values of similar size.
pub fn precision_proxy(z: f64) -> usize {
    format!("{:.6}", z).trim_end_matches('0').len()
}

/// Outcome of one duplicate-resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub table: CatalogTable,
    /// Groups with more than one member
    pub groups: usize,
    pub removed: usize,
}

/// Row indices per group id; negative or masked ids are singletons and left out
fn group_members(group_ids: &Column, rows: usize) -> BTreeMap<i64, Vec<usize>> {
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for row in 0..rows {
        let id = group_ids
            .i64_at(row)
            .or_else(|| group_ids.f64_at(row).map(|v| v as i64));
        if let Some(id) = id.filter(|id| *id >= 0) {
            groups.entry(id).or_default().push(row);
        }
    }
    groups
}

/// Keep, for each group of co-located rows, the one whose redshift shows the
/// most digits; the first such row wins a tie.
pub fn resolve(table: CatalogTable, redshift_column: &str) -> Result<Resolution> {
    resolve_by(table, GROUP_ID_COLUMN, redshift_column)
}

pub fn resolve_by(
    mut table: CatalogTable,
    group_column: &str,
    redshift_column: &str,
) -> Result<Resolution> {
    let groups = group_members(table.require_column(group_column)?, table.num_rows());
    let redshift = table.require_column(redshift_column)?;

    let mut discard = Vec::new();
    let mut resolved_groups = 0;
    for (id, members) in &groups {
        if members.len() < 2 {
            continue;
        }
        resolved_groups += 1;

        let mut best = members[0];
        let mut best_proxy = None;
        for &row in members {
            let proxy = redshift.f64_at(row).map(precision_proxy);
            if proxy > best_proxy {
                best = row;
                best_proxy = proxy;
            }
        }
        debug!(
            "Group {}: kept row {} of {} (precision proxy {:?})",
            id,
            best,
            members.len(),
            best_proxy
        );
        discard.extend(members.iter().copied().filter(|row| *row != best));
    }

    table.remove_rows(&discard)?;
    info!(
        "{}: resolved {} duplicate groups, removed {} rows, {} remain",
        table.name,
        resolved_groups,
        discard.len(),
        table.num_rows()
    );

    Ok(Resolution {
        table,
        groups: resolved_groups,
        removed: discard.len(),
    })
}
