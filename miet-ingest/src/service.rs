//! Cached schedule access per group.
//!
//! Two cache layers, both keyed by group: the raw payload (`raw:<group>`) and
//! the normalized snapshot (`parsed:<group>`). Upstream fetches are
//! serialized per group so concurrent misses for one group trigger a single
//! request while other groups proceed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use miet_core::{
    resolve_today, resolve_week, Denylist, RawPayload, ScheduleError, ScheduleSnapshot, TodayView,
    TtlCache, WeekSettings, WeekView,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::upstream::ScheduleSource;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct ScheduleService<S> {
    source: S,
    ttl: Duration,
    denylist: Denylist,
    raw: TtlCache<Arc<RawPayload>>,
    parsed: TtlCache<Arc<ScheduleSnapshot>>,
    fetch_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

fn require_group(group: &str) -> Result<&str> {
    let group = group.trim();
    if group.is_empty() {
        return Err(ScheduleError::UpstreamData("no group specified".to_string()).into());
    }
    Ok(group)
}

impl<S: ScheduleSource> ScheduleService<S> {
    pub fn new(source: S, ttl: Duration, denylist: Denylist) -> Self {
        Self {
            source,
            ttl,
            denylist,
            raw: TtlCache::new(),
            parsed: TtlCache::new(),
            fetch_locks: StdMutex::new(HashMap::new()),
        }
    }

    fn fetch_lock(&self, group: &str) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(group.to_string()).or_default())
    }

    /// Raw upstream payload for `group`, fetched at most once per TTL.
    pub async fn raw(&self, group: &str) -> Result<Arc<RawPayload>> {
        let group = require_group(group)?;
        let key = format!("raw:{group}");
        if let Some(payload) = self.raw.get(&key) {
            return Ok(payload);
        }

        let lock = self.fetch_lock(group);
        let _guard = lock.lock().await;
        if let Some(payload) = self.raw.get(&key) {
            return Ok(payload);
        }

        info!(group, "fetching schedule from upstream");
        let payload = Arc::new(self.source.fetch(group).await?);
        self.raw.insert(key, self.ttl, Arc::clone(&payload));
        Ok(payload)
    }

    /// Normalized snapshot for `group`.
    pub async fn snapshot(&self, group: &str) -> Result<Arc<ScheduleSnapshot>> {
        let group = require_group(group)?;
        let key = format!("parsed:{group}");
        if let Some(snapshot) = self.parsed.get(&key) {
            return Ok(snapshot);
        }

        let raw = self.raw(group).await?;
        let snapshot = self.parsed.get_or_try_insert_with(&key, self.ttl, || {
            let snapshot = ScheduleSnapshot::build(RawPayload::clone(&raw), &self.denylist)?;
            info!(
                group,
                entries = snapshot.entries.len(),
                cycle = snapshot.meta.cycle,
                shift = snapshot.meta.shift,
                dated = snapshot.has_dates,
                "schedule normalized"
            );
            Ok::<_, ScheduleError>(Arc::new(snapshot))
        })?;
        Ok(snapshot)
    }

    pub async fn today(
        &self,
        group: &str,
        settings: &WeekSettings,
        today: NaiveDate,
        week_offset: i64,
    ) -> Result<TodayView> {
        let snapshot = self.snapshot(group).await?;
        Ok(resolve_today(&snapshot, settings, today, week_offset)?)
    }

    pub async fn week(
        &self,
        group: &str,
        settings: &WeekSettings,
        today: NaiveDate,
        week_offset: i64,
    ) -> Result<WeekView> {
        let snapshot = self.snapshot(group).await?;
        Ok(resolve_week(&snapshot, settings, today, week_offset)?)
    }

    /// Drop both cache layers for `group`.
    pub fn invalidate(&self, group: &str) {
        let group = group.trim();
        self.raw.invalidate(&format!("raw:{group}"));
        self.parsed.invalidate(&format!("parsed:{group}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::Notify;

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0) }
        }
    }

    impl ScheduleSource for CountingSource {
        async fn fetch(&self, _group: &str) -> Result<RawPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawPayload::new(json!({
                "Data": [
                    {
                        "Day": 1, "DayNumber": 0,
                        "Time": {"Time": "1 пара", "TimeFrom": "09:00", "TimeTo": "10:20"},
                        "Class": {"Name": "Физика [Лек]", "TeacherFull": "Иванов И.И."},
                        "Room": {"Name": "3103"}
                    },
                    {
                        "Day": 1, "DayNumber": 1,
                        "Time": {"Time": "2 пара", "TimeFrom": "10:30", "TimeTo": "11:50"},
                        "Class": {"Name": "Химия [Лаб]", "TeacherFull": "Петров П.П."},
                        "Room": {"Name": "4208"}
                    }
                ]
            })))
        }
    }

    fn service(ttl: Duration) -> ScheduleService<CountingSource> {
        ScheduleService::new(CountingSource::new(), ttl, Denylist::default())
    }

    #[tokio::test]
    async fn fetches_once_per_group() {
        let svc = service(DEFAULT_CACHE_TTL);
        svc.snapshot("ИТД-11М").await.unwrap();
        svc.snapshot("ИТД-11М").await.unwrap();
        svc.raw("ИТД-11М").await.unwrap();
        assert_eq!(svc.source.calls.load(Ordering::SeqCst), 1);

        svc.raw("МП-21").await.unwrap();
        assert_eq!(svc.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let svc = Arc::new(service(DEFAULT_CACHE_TTL));
        let (a, b) = tokio::join!(svc.raw("ИТД-11М"), svc.raw("ИТД-11М"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(svc.source.calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct GatedSource {
        entered: Notify,
        release: Notify,
    }

    impl ScheduleSource for GatedSource {
        async fn fetch(&self, group: &str) -> Result<RawPayload> {
            if group == "МП-21" {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(RawPayload::new(json!({"Data": []})))
        }
    }

    #[tokio::test]
    async fn slow_group_does_not_block_others() {
        let svc = Arc::new(ScheduleService::new(
            GatedSource::default(),
            DEFAULT_CACHE_TTL,
            Denylist::default(),
        ));
        let slow = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.raw("МП-21").await.map(|_| ()) }
        });
        svc.source.entered.notified().await;

        let fast = tokio::time::timeout(Duration::from_secs(1), svc.raw("ИТД-11М")).await;
        assert!(fast.is_ok_and(|r| r.is_ok()));

        svc.source.release.notify_one();
        slow.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn empty_group_is_rejected() {
        let svc = service(DEFAULT_CACHE_TTL);
        let err = svc.snapshot("  ").await.unwrap_err();
        assert!(matches!(
            err,
            crate::IngestError::Schedule(ScheduleError::UpstreamData(_))
        ));
        assert_eq!(svc.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_ttl_refetches() {
        let svc = service(Duration::ZERO);
        svc.raw("ИТД-11М").await.unwrap();
        svc.raw("ИТД-11М").await.unwrap();
        assert_eq!(svc.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let svc = service(DEFAULT_CACHE_TTL);
        svc.snapshot("ИТД-11М").await.unwrap();
        svc.invalidate("ИТД-11М");
        svc.snapshot("ИТД-11М").await.unwrap();
        assert_eq!(svc.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn week_view_through_service() {
        let svc = service(DEFAULT_CACHE_TTL);
        let settings = WeekSettings {
            override_label: Some("1".to_string()),
            ..WeekSettings::default()
        };
        // 2026-02-09 is a Monday.
        let today = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        let view = svc.today("ИТД-11М", &settings, today, 0).await.unwrap();
        assert_eq!(view.week_cycle, 2);
        assert_eq!(view.week_index, 0);
        assert_eq!(view.lessons.len(), 1);
        assert_eq!(view.lessons[0].subject, "Физика");
    }
}
