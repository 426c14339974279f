use tracing::{debug, info, warn};

use crate::config::Setup;
use crate::constants::{
    DEC_COLUMN, ORIGIN_COLUMN, RA_COLUMN, REDSHIFT_COLUMN, VIZIER_DEC_COLUMN, VIZIER_RA_COLUMN,
};
use crate::domain::{CatalogTable, Column, ColumnData};
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::pipeline::processing::classify::{ColumnClassifier, KeywordClassifier};
use crate::pipeline::processing::filter::{accept_catalog, remove_potential_photoz};
use crate::pipeline::processing::normalize::normalize;
use crate::policy::{PolicyTable, SearchType};

/// Reduces the raw catalogs of one query to a single homogenized table
pub struct SourceAggregator<'a> {
    setup: &'a Setup,
    policy: &'a PolicyTable,
}

impl<'a> SourceAggregator<'a> {
    pub fn new(setup: &'a Setup, policy: &'a PolicyTable) -> Self {
        Self { setup, policy }
    }

    /// Filter, classify and normalize one catalog, then reduce it to
    /// `RA`, `DEC`, `Redshift`, `Origin` with only the rows that have a redshift.
    pub fn process_catalog(
        &self,
        mut catalog: CatalogTable,
        search_type: SearchType,
    ) -> Result<Option<CatalogTable>> {
        PipelineMetrics::record_catalog_seen(search_type);

        if !accept_catalog(&catalog.name, search_type, self.setup) {
            PipelineMetrics::record_catalog_rejected("banned");
            return Ok(None);
        }
        if !catalog.has_column(VIZIER_RA_COLUMN) || !catalog.has_column(VIZIER_DEC_COLUMN) {
            warn!("{}: no position columns, skipped", catalog.name);
            PipelineMetrics::record_catalog_rejected("no_position");
            return Ok(None);
        }

        let classifier = KeywordClassifier::new(self.policy);
        let Some(chosen) = classifier.classify(&catalog, search_type) else {
            debug!("{}: no usable {} column", catalog.name, search_type);
            PipelineMetrics::record_catalog_rejected("no_column");
            return Ok(None);
        };

        if normalize(&mut catalog, &chosen) {
            debug!("{}: {} converted from velocity", catalog.name, chosen);
        }

        let mut reduced =
            catalog.select_columns(&[VIZIER_RA_COLUMN, VIZIER_DEC_COLUMN, chosen.as_str()])?;
        reduced.rename_column(VIZIER_RA_COLUMN, RA_COLUMN)?;
        reduced.rename_column(VIZIER_DEC_COLUMN, DEC_COLUMN)?;
        reduced.rename_column(&chosen, REDSHIFT_COLUMN)?;
        for name in [RA_COLUMN, DEC_COLUMN] {
            if let Some(column) = reduced.column_mut(name) {
                if column.unit.is_none() {
                    column.unit = Some("deg".to_string());
                }
            }
        }

        let rows = reduced.num_rows();
        reduced.add_column(Column::new(
            ORIGIN_COLUMN,
            ColumnData::Text(vec![catalog.name.clone(); rows]),
        ))?;

        let keep: Vec<bool> = {
            let ra = reduced.require_column(RA_COLUMN)?;
            let dec = reduced.require_column(DEC_COLUMN)?;
            let z = reduced.require_column(REDSHIFT_COLUMN)?;
            (0..rows)
                .map(|row| {
                    z.f64_at(row).is_some() && ra.f64_at(row).is_some() && dec.f64_at(row).is_some()
                })
                .collect()
        };
        reduced.retain_rows(&keep)?;

        if reduced.is_empty() {
            PipelineMetrics::record_catalog_rejected("no_rows");
            return Ok(None);
        }
        debug!(
            "{}: {} rows from column {}",
            catalog.name,
            reduced.num_rows(),
            chosen
        );
        Ok(Some(reduced))
    }

    /// Stack every surviving catalog, then drop machine-rounded redshifts.
    /// `None` when nothing survives.
    pub fn aggregate(
        &self,
        raw_catalogs: Vec<CatalogTable>,
        search_type: SearchType,
        name: &str,
    ) -> Result<Option<CatalogTable>> {
        let received = raw_catalogs.len();
        let mut kept = Vec::new();
        for catalog in raw_catalogs {
            let catalog_name = catalog.name.clone();
            match self.process_catalog(catalog, search_type) {
                Ok(Some(table)) => kept.push(table),
                Ok(None) => {}
                Err(e) => {
                    warn!("{}: could not be homogenized: {}", catalog_name, e);
                    PipelineMetrics::record_catalog_rejected("schema");
                }
            }
        }

        if kept.is_empty() {
            info!(
                "No usable {} catalogs among {} received",
                search_type, received
            );
            return Ok(None);
        }

        let used = kept.len();
        let mut stacked = CatalogTable::vstack(name, kept)?;
        let dropped = remove_potential_photoz(
            &mut stacked,
            REDSHIFT_COLUMN,
            self.policy.photometric_run_length,
        )?;
        PipelineMetrics::record_photoz_dropped(dropped);

        if stacked.is_empty() {
            return Ok(None);
        }
        PipelineMetrics::record_rows_kept(search_type.as_str(), stacked.num_rows());
        info!(
            "{} search: {} rows from {} of {} catalogs",
            search_type,
            stacked.num_rows(),
            used,
            received
        );
        Ok(Some(stacked))
    }
}
