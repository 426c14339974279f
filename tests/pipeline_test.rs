use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use online_redshift::app::ports::{CatalogServicePort, ExtragalacticDbPort, TableStorePort};
use online_redshift::config::Setup;
use online_redshift::constants::{
    GROUP_ID_COLUMN, NED_UNCERTAINTY_COLUMN, VIZIER_DEC_COLUMN, VIZIER_RA_COLUMN,
};
use online_redshift::domain::{CatalogTable, Column, ColumnData, RedshiftRow, SkyPosition, Target};
use online_redshift::error::{RedshiftError, Result};
use online_redshift::infra::{JsonTableStore, SkyMatcher};
use online_redshift::pipeline::{resolve_file, RedshiftPipeline, RunOutcome, TargetLayout};
use online_redshift::policy::{PolicyTable, SearchType};
use online_redshift::units::Angle;

const ARCSEC: f64 = 1.0 / 3600.0;

/// Canned catalog-aggregator responses per search type
struct MockCatalogs {
    responses: HashMap<SearchType, Vec<CatalogTable>>,
    fail: bool,
}

#[async_trait]
impl CatalogServicePort for MockCatalogs {
    async fn query_region(
        &self,
        _target: &Target,
        _radius: Angle,
        search_type: SearchType,
    ) -> Result<Vec<CatalogTable>> {
        if self.fail {
            return Err(RedshiftError::service("vizier", "connection reset"));
        }
        Ok(self.responses.get(&search_type).cloned().unwrap_or_default())
    }
}

/// Canned batch table plus per-object histories; unknown objects fail
struct MockNed {
    batch: Option<CatalogTable>,
    histories: HashMap<String, CatalogTable>,
    history_calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ExtragalacticDbPort for MockNed {
    async fn query_region(&self, _target: &Target, _radius: Angle) -> Result<CatalogTable> {
        self.batch
            .clone()
            .ok_or_else(|| RedshiftError::service("ned", "timed out"))
    }

    async fn redshift_history(&self, object_name: &str) -> Result<CatalogTable> {
        self.history_calls.lock().unwrap().push(object_name.to_string());
        self.histories
            .get(object_name)
            .cloned()
            .ok_or_else(|| RedshiftError::service("ned", "no such object"))
    }
}

fn text(values: &[&str]) -> ColumnData {
    ColumnData::Text(values.iter().map(|s| s.to_string()).collect())
}

fn ned_batch() -> CatalogTable {
    CatalogTable::from_columns(
        "NED",
        vec![
            Column::new("Object Name", text(&["NGC 1", "ABELL 1", "NGC 2", "NGC 3"])),
            Column::new("RA", ColumnData::Float64(vec![150.0, 150.2, 150.3, 150.4])),
            Column::new("DEC", ColumnData::Float64(vec![2.0, 2.2, 2.3, 2.4])),
            Column::new("Type", text(&["G", "GClstr", "G", "G"])),
            Column::new("Redshift", ColumnData::Float64(vec![0.102, 0.05, 0.2, 0.3])),
            Column::new("Redshift Flag", text(&["", "", "", ""]))
                .with_mask(vec![true, true, true, true]),
        ],
    )
    .unwrap()
}

fn history(uncertainties: &[f64]) -> CatalogTable {
    CatalogTable::from_columns(
        "history",
        vec![Column::new(
            NED_UNCERTAINTY_COLUMN,
            ColumnData::Float64(uncertainties.to_vec()),
        )],
    )
    .unwrap()
}

fn mock_ned() -> MockNed {
    let mut histories = HashMap::new();
    histories.insert("NGC 1".to_string(), history(&[0.01, 0.0001]));
    histories.insert("NGC 2".to_string(), history(&[0.01]));
    // NGC 3 has no history: the follow-up fails and the object is dropped
    MockNed {
        batch: Some(ned_batch()),
        histories,
        history_calls: Mutex::new(Vec::new()),
    }
}

fn vizier_catalog() -> CatalogTable {
    vizier_catalog_with(0.0987654)
}

/// Three spectroscopic rows; the first sits 0.3 arcsec from NGC 1
fn vizier_catalog_with(first_redshift: f64) -> CatalogTable {
    CatalogTable::from_columns(
        "J/MNRAS/9/spec",
        vec![
            Column::new(
                VIZIER_RA_COLUMN,
                ColumnData::Float64(vec![150.0, 151.0, 152.0]),
            )
            .with_unit("deg"),
            Column::new(
                VIZIER_DEC_COLUMN,
                ColumnData::Float64(vec![2.0 + 0.3 * ARCSEC, 3.0, 4.0]),
            )
            .with_unit("deg"),
            Column::new(
                "zsp",
                ColumnData::Float64(vec![first_redshift, 0.31, 0.42]),
            )
            .with_description("Spectroscopic redshift")
            .with_precision(7),
        ],
    )
    .unwrap()
}

fn pipeline(catalogs: MockCatalogs, ned: MockNed) -> RedshiftPipeline {
    RedshiftPipeline::new(
        Arc::new(catalogs),
        Arc::new(ned),
        Arc::new(SkyMatcher::default()),
        Arc::new(JsonTableStore),
        Setup::default(),
        PolicyTable::default(),
    )
}

fn target() -> Target {
    Target::Position(SkyPosition::new(150.0, 2.0).unwrap())
}

#[tokio::test]
async fn test_full_run_writes_every_table_and_dedupes() {
    let dir = tempfile::tempdir().unwrap();
    let mut responses = HashMap::new();
    responses.insert(SearchType::Redshift, vec![vizier_catalog()]);
    let pipeline = pipeline(
        MockCatalogs {
            responses,
            fail: false,
        },
        mock_ned(),
    );

    let outcome = pipeline
        .run_target(dir.path(), "field", &target())
        .await
        .unwrap();

    let layout = TargetLayout::new(dir.path(), "field");
    // NED keeps NGC 1 only; Vizier adds 3 rows, one of which sits on NGC 1
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            grand_rows: 4,
            unique_rows: 3,
            unique_path: layout.unique(),
        }
    );
    assert!(layout.ned().exists());
    assert!(layout.vizier(SearchType::Redshift).exists());
    assert!(!layout.vizier(SearchType::Velocity).exists());
    assert!(layout.grand().exists());
    assert!(layout.ident().exists());

    let store = JsonTableStore;
    let ident = store.load(&layout.ident()).unwrap();
    assert!(ident.has_column(GROUP_ID_COLUMN));

    let unique = store.load(&layout.unique()).unwrap();
    let rows = RedshiftRow::from_table(&unique).unwrap();
    assert_eq!(rows.len(), 3);
    // 0.0987654 shows more digits than NED's 0.102 and wins the pair
    assert!(rows.iter().any(|r| r.redshift == 0.0987654 && r.origin == "J/MNRAS/9/spec"));
    assert!(!rows.iter().any(|r| r.origin == "NED"));
}

#[tokio::test]
async fn test_catalog_rows_win_precision_ties() {
    let dir = tempfile::tempdir().unwrap();
    let mut responses = HashMap::new();
    responses.insert(SearchType::Redshift, vec![vizier_catalog_with(0.103)]);
    let pipeline = pipeline(
        MockCatalogs {
            responses,
            fail: false,
        },
        mock_ned(),
    );

    pipeline
        .run_target(dir.path(), "field", &target())
        .await
        .unwrap();

    let layout = TargetLayout::new(dir.path(), "field");
    let store = JsonTableStore;
    let grand = RedshiftRow::from_table(&store.load(&layout.grand()).unwrap()).unwrap();
    let origins: Vec<&str> = grand.iter().map(|r| r.origin.as_str()).collect();
    assert_eq!(
        origins,
        vec!["J/MNRAS/9/spec", "J/MNRAS/9/spec", "J/MNRAS/9/spec", "NED"]
    );

    // 0.103 and 0.102 render to the same number of digits; the first row stays
    let unique = RedshiftRow::from_table(&store.load(&layout.unique()).unwrap()).unwrap();
    assert!(unique.iter().any(|r| r.redshift == 0.103 && r.origin == "J/MNRAS/9/spec"));
    assert!(!unique.iter().any(|r| r.origin == "NED"));
}

#[tokio::test]
async fn test_follow_up_only_for_filtered_objects() {
    let dir = tempfile::tempdir().unwrap();
    let ned = Arc::new(mock_ned());
    let pipeline = RedshiftPipeline::new(
        Arc::new(MockCatalogs {
            responses: HashMap::new(),
            fail: false,
        }),
        ned.clone(),
        Arc::new(SkyMatcher::default()),
        Arc::new(JsonTableStore),
        Setup::default(),
        PolicyTable::default(),
    );

    let outcome = pipeline
        .run_target(dir.path(), "field", &target())
        .await
        .unwrap();

    assert_eq!(
        *ned.history_calls.lock().unwrap(),
        vec!["NGC 1".to_string(), "NGC 2".to_string(), "NGC 3".to_string()]
    );
    let layout = TargetLayout::new(dir.path(), "field");
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            grand_rows: 1,
            unique_rows: 1,
            unique_path: layout.unique(),
        }
    );

    // Without duplicates the grand table is copied to both downstream files
    let store = JsonTableStore;
    let grand = store.load(&layout.grand()).unwrap();
    assert_eq!(store.load(&layout.ident()).unwrap(), grand);
    assert_eq!(store.load(&layout.unique()).unwrap(), grand);
}

#[tokio::test]
async fn test_failed_sources_end_with_no_redshifts() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        MockCatalogs {
            responses: HashMap::new(),
            fail: true,
        },
        MockNed {
            batch: None,
            histories: HashMap::new(),
            history_calls: Mutex::new(Vec::new()),
        },
    );

    let outcome = pipeline
        .run_target(dir.path(), "empty", &target())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NoRedshifts);
    let layout = TargetLayout::new(dir.path(), "empty");
    assert!(!layout.grand().exists());
    assert!(!layout.ned().exists());
}

#[tokio::test]
async fn test_catalog_failure_leaves_ned_contribution() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        MockCatalogs {
            responses: HashMap::new(),
            fail: true,
        },
        mock_ned(),
    );

    let outcome = pipeline
        .run_target(dir.path(), "field", &target())
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Completed { grand_rows: 1, .. }));
}

#[test]
fn test_resolve_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ident.json");
    let output = dir.path().join("unique.json");

    let table = CatalogTable::from_columns(
        "ident",
        vec![
            Column::new("Redshift", ColumnData::Float64(vec![0.102, 0.0987654, 0.5])),
            Column::new(GROUP_ID_COLUMN, ColumnData::Int64(vec![0, 0, -1])),
        ],
    )
    .unwrap();
    let store = JsonTableStore;
    store.save(&table, &input).unwrap();

    let rows = resolve_file(&store, &input, &output, "Redshift").unwrap();

    assert_eq!(rows, 2);
    let unique = store.load(&output).unwrap();
    let z = unique.column("Redshift").unwrap();
    assert_eq!(z.f64_at(0), Some(0.0987654));
    assert_eq!(z.f64_at(1), Some(0.5));
}
