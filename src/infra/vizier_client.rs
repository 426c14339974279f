use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::app::ports::{CatalogServicePort, HttpClientPort};
use crate::domain::{CatalogTable, Target};
use crate::error::{RedshiftError, Result};
use crate::infra::tsv::parse_vizier_tsv;
use crate::metrics::PipelineMetrics;
use crate::policy::SearchType;
use crate::units::Angle;

const SERVICE: &str = "vizier";

/// Catalog aggregator over the `asu-tsv` interface
pub struct VizierClient {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl VizierClient {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Query parameters for one cone search: every row, every catalog, J2000
    /// positions computed by the service, only columns matching the UCD filter.
    pub fn query_params(target: &Target, radius: Angle, search_type: SearchType) -> Vec<(&'static str, String)> {
        vec![
            ("-source", "*".to_string()),
            ("-c", target.to_string()),
            ("-c.rd", format!("{}", radius.degrees())),
            ("-out.max", "unlimited".to_string()),
            ("-out.add", "_RAJ2000,_DEJ2000".to_string()),
            ("-out", "**".to_string()),
            ("-ucd", search_type.ucd().to_string()),
            ("-oc.form", "d".to_string()),
        ]
    }
}

#[async_trait]
impl CatalogServicePort for VizierClient {
    async fn query_region(
        &self,
        target: &Target,
        radius: Angle,
        search_type: SearchType,
    ) -> Result<Vec<CatalogTable>> {
        let started = Instant::now();
        let params = Self::query_params(target, radius, search_type);
        let response = self.http.get(&self.base_url, &params).await?;
        PipelineMetrics::record_query_duration(SERVICE, started.elapsed().as_secs_f64());

        if !response.is_success() {
            return Err(RedshiftError::service(
                SERVICE,
                format!("HTTP {} for {} search around {}", response.status, search_type, target),
            ));
        }
        let tables = parse_vizier_tsv(&response.body)?;
        debug!(
            "{} search around {} returned {} catalogs",
            search_type,
            target,
            tables.len()
        );
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpGetResult;
    use crate::domain::SkyPosition;
    use std::sync::Mutex;

    struct RecordingHttp {
        body: String,
        status: u16,
        seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    #[async_trait]
    impl HttpClientPort for RecordingHttp {
        async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpGetResult> {
            self.seen.lock().unwrap().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ));
            Ok(HttpGetResult {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_query_sends_ucd_and_parses() {
        let http = Arc::new(RecordingHttp {
            body: "#Table\tT:\n#Name: J/X/1\n#Column\tz\t(F6.4)\tRedshift\n_RAJ2000\t_DEJ2000\tz\ndeg\tdeg\t\n---\t---\t---\n1.0\t2.0\t0.1234\n".into(),
            status: 200,
            seen: Mutex::new(Vec::new()),
        });
        let client = VizierClient::new(http.clone(), "http://vizier.test/asu-tsv");
        let target = Target::Position(SkyPosition::new(150.0, 2.0).unwrap());

        let tables = client
            .query_region(&target, Angle::from_degrees(0.5), SearchType::Velocity)
            .await
            .unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "J/X/1");
        let seen = http.seen.lock().unwrap();
        assert_eq!(seen[0].0, "http://vizier.test/asu-tsv");
        assert!(seen[0]
            .1
            .contains(&("-ucd".to_string(), "spect.dopplerVeloc*|phys.veloc*".to_string())));
        assert!(seen[0].1.contains(&("-c.rd".to_string(), "0.5".to_string())));
    }

    #[tokio::test]
    async fn test_http_error_is_service_error() {
        let http = Arc::new(RecordingHttp {
            body: String::new(),
            status: 503,
            seen: Mutex::new(Vec::new()),
        });
        let client = VizierClient::new(http, "http://vizier.test/asu-tsv");
        let err = client
            .query_region(
                &Target::Name("M31".into()),
                Angle::from_degrees(0.7),
                SearchType::Redshift,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RedshiftError::Service { .. }));
    }
}
