//! Per-service flows. Remote failures stop here: they are logged, counted
//! and turned into "no data from this source".

use tracing::{debug, info, instrument, warn};

use crate::app::ports::{CatalogServicePort, ExtragalacticDbPort};
use crate::config::Setup;
use crate::constants::{
    META_DESCRIPTION, NED_DEC_COLUMN, NED_DESCRIPTION, NED_OBJECT_NAME_COLUMN, NED_ORIGIN,
    NED_RA_COLUMN, NED_REDSHIFT_COLUMN, NED_UNCERTAINTY_COLUMN, VIZIER_REDSHIFT_DESCRIPTION,
    VIZIER_VELOCITY_DESCRIPTION,
};
use crate::domain::{CatalogTable, RedshiftRow, Target};
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::pipeline::processing::{filter_extragalactic_rows, SourceAggregator};
use crate::policy::{PolicyTable, SearchType};

/// One catalog-aggregator search, reduced to a homogenized table
#[instrument(skip(port, target, setup, policy), fields(target = %target))]
pub async fn query_catalogs(
    port: &dyn CatalogServicePort,
    target: &Target,
    search_type: SearchType,
    setup: &Setup,
    policy: &PolicyTable,
) -> Option<CatalogTable> {
    let raw = match port.query_region(target, setup.radius, search_type).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Vizier {} search failed: {}", search_type, e);
            PipelineMetrics::record_query_failure("vizier");
            return None;
        }
    };
    info!("Vizier {} search returned {} catalogs", search_type, raw.len());

    let name = format!("vizier_{}", search_type);
    match SourceAggregator::new(setup, policy).aggregate(raw, search_type, &name) {
        Ok(Some(mut table)) => {
            let description = match search_type {
                SearchType::Redshift => VIZIER_REDSHIFT_DESCRIPTION,
                SearchType::Velocity => VIZIER_VELOCITY_DESCRIPTION,
            };
            table.set_meta(META_DESCRIPTION, description);
            Some(table)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Vizier {} results could not be combined: {}", search_type, e);
            None
        }
    }
}

/// Keep the object when any published measurement beats the uncertainty threshold
fn has_precise_measurement(history: &CatalogTable, threshold: f64) -> bool {
    let Some(uncertainty) = history.column(NED_UNCERTAINTY_COLUMN) else {
        return false;
    };
    (0..history.num_rows())
        .filter_map(|row| uncertainty.f64_at(row))
        .any(|u| u < threshold)
}

fn reduce_extragalactic(batch: &CatalogTable) -> Result<Vec<(String, RedshiftRow)>> {
    let names = batch.require_column(NED_OBJECT_NAME_COLUMN)?;
    let ra = batch.require_column(NED_RA_COLUMN)?;
    let dec = batch.require_column(NED_DEC_COLUMN)?;
    let redshift = batch.require_column(NED_REDSHIFT_COLUMN)?;

    Ok((0..batch.num_rows())
        .filter_map(|row| {
            Some((
                names.str_at(row)?.to_string(),
                RedshiftRow {
                    ra: ra.f64_at(row)?,
                    dec: dec.f64_at(row)?,
                    redshift: redshift.f64_at(row)?,
                    origin: NED_ORIGIN.to_string(),
                },
            ))
        })
        .collect())
}

/// Extragalactic-database batch query, category filter, then a per-object
/// follow-up that keeps only objects with a precise published redshift
#[instrument(skip(port, target, setup, policy), fields(target = %target))]
pub async fn query_extragalactic(
    port: &dyn ExtragalacticDbPort,
    target: &Target,
    setup: &Setup,
    policy: &PolicyTable,
) -> Option<CatalogTable> {
    let mut batch = match port.query_region(target, setup.radius).await {
        Ok(batch) => batch,
        Err(e) => {
            warn!("NED region query failed: {}", e);
            PipelineMetrics::record_query_failure("ned");
            return None;
        }
    };
    let received = batch.num_rows();

    let candidates = match filter_extragalactic_rows(&mut batch, &policy.extragalactic)
        .and_then(|_| reduce_extragalactic(&batch))
    {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("NED response unusable: {}", e);
            PipelineMetrics::record_query_failure("ned");
            return None;
        }
    };
    info!(
        "NED returned {} objects, {} candidates after type and flag filters",
        received,
        candidates.len()
    );

    let mut rows = Vec::with_capacity(candidates.len());
    for (object_name, row) in candidates {
        match port.redshift_history(&object_name).await {
            Ok(history) if has_precise_measurement(&history, setup.uncertainty) => rows.push(row),
            Ok(_) => debug!("{}: no measurement below {}", object_name, setup.uncertainty),
            Err(e) => debug!("{}: redshift history unavailable: {}", object_name, e),
        }
    }

    if rows.is_empty() {
        info!("No NED redshifts kept");
        return None;
    }
    PipelineMetrics::record_rows_kept("ned", rows.len());
    info!("Kept {} NED redshifts", rows.len());

    match RedshiftRow::into_table(NED_ORIGIN, &rows) {
        Ok(mut table) => {
            table.set_meta(META_DESCRIPTION, NED_DESCRIPTION);
            Some(table)
        }
        Err(e) => {
            warn!("NED rows could not be tabulated: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Column, ColumnData};

    #[test]
    fn test_precise_measurement() {
        let history = CatalogTable::from_columns(
            "NGC 1",
            vec![Column::new(
                NED_UNCERTAINTY_COLUMN,
                ColumnData::Float64(vec![0.01, 0.0, 0.001]),
            )
            .with_mask(vec![false, true, false])],
        )
        .unwrap();
        assert!(has_precise_measurement(&history, 0.002));
        assert!(!has_precise_measurement(&history, 0.001));
        assert!(!has_precise_measurement(&CatalogTable::new("empty"), 0.002));
    }
}
