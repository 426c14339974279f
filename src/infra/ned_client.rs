use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::app::ports::{ExtragalacticDbPort, HttpClientPort};
use crate::constants::{NED_OBJECT_NAME_COLUMN, NED_UNCERTAINTY_COLUMN};
use crate::domain::{CatalogTable, Target};
use crate::error::{RedshiftError, Result};
use crate::infra::tsv::parse_delimited;
use crate::metrics::PipelineMetrics;
use crate::units::Angle;

const SERVICE: &str = "ned";

/// Extragalactic database over its tab-separated object and data search pages
pub struct NedClient {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl NedClient {
    pub fn new(http: Arc<dyn HttpClientPort>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn region_params(target: &Target, radius: Angle) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("of", "ascii_tab".to_string()),
            ("radius", format!("{}", radius.arcmin())),
            ("out_csys", "Equatorial".to_string()),
            ("out_equinox", "J2000.0".to_string()),
            ("obj_sort", "Distance to search center".to_string()),
            ("list_limit", "0".to_string()),
            ("img_stamp", "NO".to_string()),
        ];
        match target {
            Target::Name(name) => {
                params.push(("search_type", "Near Name Search".to_string()));
                params.push(("objname", name.clone()));
            }
            Target::Position(position) => {
                params.push(("search_type", "Near Position Search".to_string()));
                params.push(("in_csys", "Equatorial".to_string()));
                params.push(("in_equinox", "J2000.0".to_string()));
                params.push(("lon", format!("{}d", position.ra)));
                params.push(("lat", format!("{}d", position.dec)));
            }
        }
        params
    }

    async fn fetch(&self, path: &str, params: &[(&str, String)], what: &str) -> Result<String> {
        let started = Instant::now();
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url, params).await?;
        PipelineMetrics::record_query_duration(SERVICE, started.elapsed().as_secs_f64());
        if !response.is_success() {
            return Err(RedshiftError::service(
                SERVICE,
                format!("HTTP {} for {}", response.status, what),
            ));
        }
        Ok(response.body)
    }
}

/// History tables label the uncertainty column in several ways
fn canonical_uncertainty(table: &mut CatalogTable) {
    if table.has_column(NED_UNCERTAINTY_COLUMN) {
        return;
    }
    let alias = table
        .column_names()
        .into_iter()
        .find(|name| name.contains("Uncertainty"))
        .map(str::to_string);
    if let Some(alias) = alias {
        // The canonical name is free, so the rename cannot collide
        let _ = table.rename_column(&alias, NED_UNCERTAINTY_COLUMN);
    }
}

#[async_trait]
impl ExtragalacticDbPort for NedClient {
    async fn query_region(&self, target: &Target, radius: Angle) -> Result<CatalogTable> {
        let params = Self::region_params(target, radius);
        let body = self
            .fetch("/cgi-bin/objsearch", &params, &format!("region around {}", target))
            .await?;
        parse_delimited(&body, "NED", NED_OBJECT_NAME_COLUMN)
    }

    async fn redshift_history(&self, object_name: &str) -> Result<CatalogTable> {
        let params = [
            ("search_type", "Redshifts".to_string()),
            ("objname", object_name.to_string()),
            ("of", "ascii_tab".to_string()),
        ];
        let body = self
            .fetch("/cgi-bin/datasearch", &params, &format!("redshifts of {}", object_name))
            .await?;
        let mut table = parse_delimited(&body, object_name, "Published Redshift")?;
        canonical_uncertainty(&mut table);
        Ok(table)
    }
}
