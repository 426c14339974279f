use metrics_exporter_prometheus::PrometheusBuilder;

use online_redshift::metrics::PipelineMetrics;
use online_redshift::policy::SearchType;

#[test]
fn test_recorded_metrics_reach_the_exporter() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("recorder installs once per test binary");

    PipelineMetrics::record_duplicates_removed(3);
    PipelineMetrics::record_catalog_seen(SearchType::Velocity);
    PipelineMetrics::record_query_failure("ned");

    let rendered = handle.render();
    assert!(
        rendered.contains("online_redshift_duplicates_removed_total 3"),
        "{}",
        rendered
    );
    assert!(rendered.contains("online_redshift_catalogs_total{search_type=\"velocity\"} 1"));
    assert!(rendered.contains("online_redshift_query_failures_total{service=\"ned\"} 1"));
}
