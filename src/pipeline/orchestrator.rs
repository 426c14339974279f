use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::app::ports::{CatalogServicePort, CrossMatchPort, ExtragalacticDbPort, TableStorePort};
use crate::config::Setup;
use crate::constants::{
    GRAND_DESCRIPTION, GRAND_FILE_SUFFIX, IDENT_FILE_SUFFIX, META_DESCRIPTION, NED_FILE_SUFFIX,
    REDSHIFT_COLUMN, TABLE_FILE_EXTENSION, UNIQUE_FILE_SUFFIX, VIZIER_REDSHIFT_FILE_SUFFIX,
    VIZIER_VELOCITY_FILE_SUFFIX,
};
use crate::domain::{CatalogTable, Target};
use crate::metrics::PipelineMetrics;
use crate::pipeline::processing::resolve;
use crate::pipeline::sources::{query_catalogs, query_extragalactic};
use crate::policy::{PolicyTable, SearchType};

/// How a target run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        grand_rows: usize,
        unique_rows: usize,
        unique_path: PathBuf,
    },
    /// No source produced a single redshift
    NoRedshifts,
}

/// Where every table of one target lands: `{path}/{name}/{name}{suffix}.json`
#[derive(Debug, Clone)]
pub struct TargetLayout {
    dir: PathBuf,
    name: String,
}

impl TargetLayout {
    pub fn new(path: &Path, name: &str) -> Self {
        Self {
            dir: path.join(name),
            name: name.to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, suffix: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.name, suffix, TABLE_FILE_EXTENSION))
    }

    pub fn ned(&self) -> PathBuf {
        self.file(NED_FILE_SUFFIX)
    }

    pub fn vizier(&self, search_type: SearchType) -> PathBuf {
        match search_type {
            SearchType::Redshift => self.file(VIZIER_REDSHIFT_FILE_SUFFIX),
            SearchType::Velocity => self.file(VIZIER_VELOCITY_FILE_SUFFIX),
        }
    }

    pub fn grand(&self) -> PathBuf {
        self.file(GRAND_FILE_SUFFIX)
    }

    pub fn ident(&self) -> PathBuf {
        self.file(&format!("{}{}", GRAND_FILE_SUFFIX, IDENT_FILE_SUFFIX))
    }

    pub fn unique(&self) -> PathBuf {
        self.file(&format!(
            "{}{}{}",
            GRAND_FILE_SUFFIX, IDENT_FILE_SUFFIX, UNIQUE_FILE_SUFFIX
        ))
    }
}

/// Runs one target end to end against the configured collaborators
pub struct RedshiftPipeline {
    catalogs: Arc<dyn CatalogServicePort>,
    extragalactic: Arc<dyn ExtragalacticDbPort>,
    matcher: Arc<dyn CrossMatchPort>,
    store: Arc<dyn TableStorePort>,
    setup: Setup,
    policy: PolicyTable,
}

impl RedshiftPipeline {
    pub fn new(
        catalogs: Arc<dyn CatalogServicePort>,
        extragalactic: Arc<dyn ExtragalacticDbPort>,
        matcher: Arc<dyn CrossMatchPort>,
        store: Arc<dyn TableStorePort>,
        setup: Setup,
        policy: PolicyTable,
    ) -> Self {
        Self {
            catalogs,
            extragalactic,
            matcher,
            store,
            setup,
            policy,
        }
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    fn save(&self, table: &CatalogTable, path: &Path) -> Result<()> {
        self.store
            .save(table, path)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Query every source, stack their redshifts, group co-located rows and
    /// keep one measurement per source. Each intermediate table is persisted.
    #[instrument(skip(self, path, target), fields(target = %target))]
    pub async fn run_target(&self, path: &Path, name: &str, target: &Target) -> Result<RunOutcome> {
        let layout = TargetLayout::new(path, name);
        fs::create_dir_all(layout.dir())
            .with_context(|| format!("failed to create {}", layout.dir().display()))?;
        info!("Collecting redshifts for {} within {}", target, self.setup.radius);

        let ned =
            query_extragalactic(self.extragalactic.as_ref(), target, &self.setup, &self.policy)
                .await;
        if let Some(ned) = &ned {
            self.save(ned, &layout.ned())?;
        }

        // Catalog rows precede the database rows; resolver ties go to the first row
        let mut sources = Vec::new();
        for search_type in SearchType::all() {
            if let Some(vizier) = query_catalogs(
                self.catalogs.as_ref(),
                target,
                search_type,
                &self.setup,
                &self.policy,
            )
            .await
            {
                self.save(&vizier, &layout.vizier(search_type))?;
                sources.push(vizier);
            }
        }
        sources.extend(ned);

        if sources.is_empty() {
            warn!("No redshifts found for {}, nothing to cross-match", name);
            return Ok(RunOutcome::NoRedshifts);
        }

        let mut grand = CatalogTable::vstack(name, sources)
            .context("failed to stack source tables")?;
        grand.set_meta(META_DESCRIPTION, GRAND_DESCRIPTION);
        self.save(&grand, &layout.grand())?;
        let grand_rows = grand.num_rows();

        let unique = match self
            .matcher
            .identify(&grand, self.setup.match_tolerance)
            .context("cross-match failed")?
        {
            Some(ident) => {
                self.save(&ident, &layout.ident())?;
                let resolution =
                    resolve(ident, REDSHIFT_COLUMN).context("duplicate resolution failed")?;
                PipelineMetrics::record_duplicates_removed(resolution.removed);
                resolution.table
            }
            None => {
                info!("No duplicates within {}", self.setup.match_tolerance);
                self.save(&grand, &layout.ident())?;
                grand
            }
        };

        let unique_path = layout.unique();
        self.save(&unique, &unique_path)?;
        info!(
            "{}: {} redshifts, {} unique, written to {}",
            name,
            grand_rows,
            unique.num_rows(),
            unique_path.display()
        );

        Ok(RunOutcome::Completed {
            grand_rows,
            unique_rows: unique.num_rows(),
            unique_path,
        })
    }
}

/// Duplicate resolution over an already group-annotated stored table
pub fn resolve_file(
    store: &dyn TableStorePort,
    input: &Path,
    output: &Path,
    redshift_column: &str,
) -> Result<usize> {
    let table = store
        .load(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let resolution = resolve(table, redshift_column)
        .with_context(|| format!("cannot resolve duplicates in {}", input.display()))?;
    PipelineMetrics::record_duplicates_removed(resolution.removed);
    store
        .save(&resolution.table, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(resolution.table.num_rows())
}
