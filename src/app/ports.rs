use async_trait::async_trait;
use std::path::Path;

use crate::domain::{CatalogTable, Target};
use crate::error::Result;
use crate::policy::SearchType;
use crate::units::Angle;

// Transport port
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub body: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Catalog aggregator: every catalog with columns matching a search type around a target
#[async_trait]
pub trait CatalogServicePort: Send + Sync {
    async fn query_region(
        &self,
        target: &Target,
        radius: Angle,
        search_type: SearchType,
    ) -> Result<Vec<CatalogTable>>;
}

/// Extragalactic database: a batch of nearby objects plus per-object redshift history
#[async_trait]
pub trait ExtragalacticDbPort: Send + Sync {
    async fn query_region(&self, target: &Target, radius: Angle) -> Result<CatalogTable>;

    async fn redshift_history(&self, object_name: &str) -> Result<CatalogTable>;
}

/// Positional cross-match; `None` when no two rows fall within the tolerance
pub trait CrossMatchPort: Send + Sync {
    fn identify(&self, table: &CatalogTable, tolerance: Angle) -> Result<Option<CatalogTable>>;
}

pub trait TableStorePort: Send + Sync {
    fn save(&self, table: &CatalogTable, path: &Path) -> Result<()>;
    fn load(&self, path: &Path) -> Result<CatalogTable>;
}
