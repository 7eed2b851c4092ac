use async_trait::async_trait;

use iris_core::analytics::{
    DeviceStat, EventRepository, PageStat, ReferrerStat, SiteStat, StatsResult, TimeSeriesBucket,
    TimeWindow, VitalStat,
};
use iris_core::error::RepositoryResult;
use iris_core::event::Event;

use crate::DuckDbBackend;

#[async_trait]
impl EventRepository for DuckDbBackend {
    async fn insert(&self, event: &Event) -> RepositoryResult<()> {
        DuckDbBackend::insert_event(self, event).await
    }

    async fn get_stats(&self, domain: &str, window: &TimeWindow) -> RepositoryResult<StatsResult> {
        DuckDbBackend::get_stats(self, domain, window).await
    }

    async fn get_top_pages(
        &self,
        domain: &str,
        window: &TimeWindow,
        limit: u32,
    ) -> RepositoryResult<Vec<PageStat>> {
        DuckDbBackend::get_top_pages(self, domain, window, limit).await
    }

    async fn get_top_referrers(
        &self,
        domain: &str,
        window: &TimeWindow,
        limit: u32,
    ) -> RepositoryResult<Vec<ReferrerStat>> {
        DuckDbBackend::get_top_referrers(self, domain, window, limit).await
    }

    async fn get_vitals(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<VitalStat>> {
        DuckDbBackend::get_vitals(self, domain, window).await
    }

    async fn get_devices(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<DeviceStat>> {
        DuckDbBackend::get_devices(self, domain, window).await
    }

    async fn get_pageviews_time_series(
        &self,
        domain: &str,
        window: &TimeWindow,
    ) -> RepositoryResult<Vec<TimeSeriesBucket>> {
        DuckDbBackend::get_pageviews_time_series(self, domain, window).await
    }

    async fn get_sites(&self) -> RepositoryResult<Vec<SiteStat>> {
        DuckDbBackend::get_sites(self).await
    }

    async fn close(&self) -> RepositoryResult<()> {
        DuckDbBackend::close(self).await
    }
}
