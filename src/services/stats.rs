use crate::model::{Factor, SiteOverview};
use crate::services::EnvironmentService;
use crate::store::SiteDirectory;
use anyhow::Result;
use std::sync::Arc;

/// Cross-boundary statistics: the storage site list decorated with each
/// site's most recent environmental values.
pub struct StatsService {
    sites: Arc<dyn SiteDirectory>,
    environment: Arc<EnvironmentService>,
}

impl StatsService {
    pub fn new(sites: Arc<dyn SiteDirectory>, environment: Arc<EnvironmentService>) -> Self {
        Self { sites, environment }
    }

    pub async fn sites_overview(&self) -> Result<Vec<SiteOverview>> {
        let sites = self.sites.sites().await?;
        let mut overview = Vec::with_capacity(sites.len());
        for site in sites {
            let temperature = self
                .environment
                .latest(site.id, Factor::Temperature)
                .await?
                .map(|p| p.value);
            let humidity = self
                .environment
                .latest(site.id, Factor::Humidity)
                .await?
                .map(|p| p.value);
            overview.push(SiteOverview {
                site,
                temperature,
                humidity,
            });
        }
        Ok(overview)
    }
}
