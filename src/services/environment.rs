use crate::model::{DataPoint, Extrema, Factor};
use crate::reduce;
use crate::store::EnvironmentalStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Query surface over the environmental time-series store. History is
/// density-reduced to the configured chart budget before it leaves this
/// service.
pub struct EnvironmentService {
    store: Arc<dyn EnvironmentalStore>,
    chart_max_points: usize,
}

impl EnvironmentService {
    pub fn new(store: Arc<dyn EnvironmentalStore>, chart_max_points: usize) -> Self {
        Self {
            store,
            chart_max_points: chart_max_points.max(2),
        }
    }

    pub async fn latest(&self, site_id: Uuid, factor: Factor) -> Result<Option<DataPoint>> {
        self.store.latest(site_id, factor).await
    }

    pub async fn history(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_points: Option<usize>,
    ) -> Result<Vec<DataPoint>> {
        let history = self.store.history(site_id, factor, start, end).await?;
        if history.is_empty() {
            return Ok(history);
        }
        let budget = max_points.unwrap_or(self.chart_max_points).max(2);
        Ok(reduce::reduce(&history, budget))
    }

    pub async fn extrema(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Extrema> {
        self.store.extrema(site_id, factor, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::EnvironmentService;
    use crate::model::Factor;
    use crate::store::EnvironmentalStore;
    use crate::test_support::{base_time, snapshot, InMemoryEnvironmentalStore};
    use chrono::Duration;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn extrema_over_empty_interval_has_no_bounds() {
        let store = Arc::new(InMemoryEnvironmentalStore::default());
        let service = EnvironmentService::new(store, 100);
        let extrema = service
            .extrema(
                Uuid::new_v4(),
                Factor::Temperature,
                base_time(),
                base_time() + Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(extrema.min_value, None);
        assert_eq!(extrema.max_value, None);
    }

    #[tokio::test]
    async fn extrema_over_a_single_point_collapses_to_it() {
        let site = Uuid::new_v4();
        let store = Arc::new(InMemoryEnvironmentalStore::default());
        store
            .record(&snapshot(site, 60, Some(21.5), None))
            .await
            .unwrap();
        let service = EnvironmentService::new(store, 100);
        let extrema = service
            .extrema(
                site,
                Factor::Temperature,
                base_time(),
                base_time() + Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(extrema.min_value, Some(21.5));
        assert_eq!(extrema.max_value, Some(21.5));
    }

    #[tokio::test]
    async fn history_is_reduced_to_the_budget() {
        let site = Uuid::new_v4();
        let store = Arc::new(InMemoryEnvironmentalStore::default());
        for i in 0..200 {
            store
                .record(&snapshot(site, 10 * i, Some((i as f64).sin() * 10.0), None))
                .await
                .unwrap();
        }
        let service = EnvironmentService::new(store, 20);
        let history = service
            .history(
                site,
                Factor::Temperature,
                base_time() - Duration::seconds(1),
                base_time() + Duration::hours(1),
                None,
            )
            .await
            .unwrap();
        assert!(!history.is_empty());
        assert!(history.len() <= 20);
    }

    #[tokio::test]
    async fn history_only_returns_the_requested_factor() {
        let site = Uuid::new_v4();
        let store = Arc::new(InMemoryEnvironmentalStore::default());
        store
            .record(&snapshot(site, 10, Some(20.0), None))
            .await
            .unwrap();
        store
            .record(&snapshot(site, 20, None, Some(55.0)))
            .await
            .unwrap();
        let service = EnvironmentService::new(store, 100);
        let humidity = service
            .history(
                site,
                Factor::Humidity,
                base_time(),
                base_time() + Duration::hours(1),
                None,
            )
            .await
            .unwrap();
        assert_eq!(humidity.len(), 1);
        assert_eq!(humidity[0].value, 55.0);
    }
}
