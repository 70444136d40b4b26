//! Progress Dashboard
//!
//! Holds the latest [`ProgressReport`] and keeps it current by listening on
//! the store's change bus. Only changes to keys a step reads trigger a
//! recompute.

use crate::progress::{ProgressReport, StepId};
use isms_common::{ChangeEvent, IsmsStore, Subscription};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live dashboard
pub struct Dashboard {
    store: IsmsStore,
    report: RwLock<ProgressReport>,
    recomputes: AtomicU64,
    subscription: Mutex<Option<Subscription>>,
}

impl Dashboard {
    /// Compute the report and subscribe to store changes. The subscription
    /// ends when the dashboard is dropped.
    pub fn attach(store: &IsmsStore) -> Arc<Self> {
        let dashboard = Arc::new(Self {
            store: store.clone(),
            report: RwLock::new(ProgressReport::compute(store)),
            recomputes: AtomicU64::new(1),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&dashboard);
        let subscription = store.bus().subscribe(move |event: &ChangeEvent| {
            if let Some(dashboard) = weak.upgrade() {
                dashboard.on_change(event);
            }
        });
        *dashboard.subscription.lock() = Some(subscription);
        dashboard
    }

    /// Whether a change to `key` can move any step
    pub fn tracks(key: &str) -> bool {
        StepId::ALL.iter().any(|step| step.reads().contains(&key))
    }

    fn on_change(&self, event: &ChangeEvent) {
        if Self::tracks(&event.key) {
            tracing::debug!("Dashboard refresh after change to '{}'", event.key);
            self.refresh();
        }
    }

    /// Recompute from the store
    pub fn refresh(&self) -> ProgressReport {
        let report = ProgressReport::compute(&self.store);
        self.recomputes.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "Dashboard: {}% overall, {}/{} steps completed",
            report.overall,
            report.completed_count(),
            report.steps.len()
        );
        *self.report.write() = report.clone();
        report
    }

    /// Latest report
    pub fn report(&self) -> ProgressReport {
        self.report.read().clone()
    }

    pub fn overall(&self) -> u8 {
        self.report.read().overall
    }

    /// Number of computations so far, including the initial one
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("overall", &self.overall())
            .field("recomputes", &self.recompute_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::StepStatus;
    use crate::scope::{Organization, ScopeData};
    use isms_common::{keys, FileStore};

    #[test]
    fn test_recomputes_on_tracked_writes() {
        let store = IsmsStore::in_memory();
        let dashboard = Dashboard::attach(&store);
        assert_eq!(dashboard.overall(), 0);
        assert_eq!(dashboard.recompute_count(), 1);

        let scope = ScopeData {
            organization: Organization {
                name: "Acme".into(),
                industry: "Retail".into(),
                ..Organization::default()
            },
            ..ScopeData::default()
        };
        scope.save(&store).unwrap();

        assert_eq!(dashboard.recompute_count(), 2);
        let step = dashboard.report().step(StepId::Scope).cloned().unwrap();
        assert_eq!(step.completion, 12);
        assert_eq!(step.status, StepStatus::InProgress);

        store.write_raw("unrelated", "{}").unwrap();
        assert_eq!(dashboard.recompute_count(), 2);
    }

    #[test]
    fn test_unsubscribes_on_drop() {
        let store = IsmsStore::in_memory();
        let dashboard = Dashboard::attach(&store);
        assert_eq!(store.bus().listener_count(), 1);
        drop(dashboard);
        assert_eq!(store.bus().listener_count(), 0);
        store.write_raw(keys::SCOPE, "{}").unwrap();
    }

    #[test]
    fn test_recomputes_on_external_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("isms.json");
        let writer = IsmsStore::new(Arc::new(FileStore::open(&path).unwrap()));
        let reader = IsmsStore::new(Arc::new(FileStore::open(&path).unwrap()));
        let dashboard = Dashboard::attach(&reader);

        writer.write_raw(keys::TRAINING, r#"{"programs": [{"name": "Onboarding"}]}"#).unwrap();
        assert_eq!(dashboard.report().step(StepId::Training).unwrap().completion, 0);

        assert_eq!(reader.sync_external().unwrap(), 1);
        assert_eq!(dashboard.report().step(StepId::Training).unwrap().completion, 25);
        assert_eq!(dashboard.recompute_count(), 2);
    }

    #[test]
    fn test_tracks_secondary_keys() {
        assert!(Dashboard::tracks(keys::SOA_LEGACY));
        assert!(Dashboard::tracks(keys::RISK_TREATMENTS));
        assert!(!Dashboard::tracks(keys::SAVED_ASSESSMENTS));
    }
}
