//! Periodic sweeps over all pending orders.
//!
//! Sweeps are triggered organically (a storefront page load, an admin request), never by an automated scheduler, and
//! at most once per interval. The interval is enforced by a [`SweepGuard`], a single process-wide timestamp that is
//! only ever changed through compare-and-swap. It starts out as "never run".
use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use log::*;

use crate::{
    cpe_api::reconcile_api::{ReconcileApi, ReconcileOutcome},
    db_types::{meta_keys, PENDING_STATUSES},
    traits::OrderStore,
};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 4;
const NEVER_RUN: i64 = i64::MIN;

/// What asked for a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepTrigger {
    /// A storefront page was served
    PageLoad,
    /// An operator asked for a sweep
    Manual,
    /// An automated scheduler (cron and friends). These never start a sweep.
    Scheduled,
}

/// Throttles sweeps to one per interval.
#[derive(Debug)]
pub struct SweepGuard {
    last_sweep_ms: AtomicI64,
    interval_ms: i64,
}

impl SweepGuard {
    pub fn new(interval: Duration) -> Self {
        let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
        Self { last_sweep_ms: AtomicI64::new(NEVER_RUN), interval_ms }
    }

    /// Claim the right to sweep at time `now_ms`. Of several racing callers, at most one gets `true` per interval.
    pub fn try_begin(&self, now_ms: i64) -> bool {
        let mut last = self.last_sweep_ms.load(Ordering::Acquire);
        loop {
            if last != NEVER_RUN && now_ms.saturating_sub(last) < self.interval_ms {
                return false;
            }
            match self.last_sweep_ms.compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(current) => last = current,
            }
        }
    }

    pub fn last_sweep(&self) -> Option<DateTime<Utc>> {
        match self.last_sweep_ms.load(Ordering::Acquire) {
            NEVER_RUN => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }
}

/// Runs throttled sweeps of all pending crypto orders through a [`ReconcileApi`].
#[derive(Clone)]
pub struct Sweeper<B> {
    reconciler: ReconcileApi<B>,
    guard: Arc<SweepGuard>,
    concurrency: usize,
}

impl<B> Debug for Sweeper<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sweeper(concurrency: {}, last sweep: {:?})", self.concurrency, self.guard.last_sweep())
    }
}

impl<B> Sweeper<B> {
    pub fn new(reconciler: ReconcileApi<B>, interval: Duration, concurrency: usize) -> Self {
        Self { reconciler, guard: Arc::new(SweepGuard::new(interval)), concurrency: concurrency.max(1) }
    }

    pub fn reconciler(&self) -> &ReconcileApi<B> {
        &self.reconciler
    }

    pub fn guard(&self) -> &SweepGuard {
        &self.guard
    }
}

impl<B> Sweeper<B>
where B: OrderStore
{
    /// Sweep all pending orders if `trigger` is allowed to start a sweep and the interval has elapsed.
    ///
    /// Returns the number of orders processed, which is zero when no sweep ran.
    pub async fn run_sweep_if_due(&self, trigger: SweepTrigger) -> usize {
        if trigger == SweepTrigger::Scheduled {
            trace!("🧹️ Automated sweep triggers are ignored");
            return 0;
        }
        if !self.guard.try_begin(Utc::now().timestamp_millis()) {
            trace!("🧹️ Sweep not due yet. Last sweep was at {:?}", self.guard.last_sweep());
            return 0;
        }
        debug!("🧹️ Starting sweep ({trigger:?})");
        self.sweep().await
    }

    /// Reconcile every pending crypto order, ignoring the guard. Errors are logged, and never stop the sweep.
    pub async fn sweep(&self) -> usize {
        let orders =
            match self.reconciler.db().fetch_orders_by_status_and_meta(&PENDING_STATUSES, meta_keys::CURRENCY).await {
                Ok(orders) => orders,
                Err(e) => {
                    error!("🧹️ Could not fetch pending orders. {e}");
                    return 0;
                },
            };
        let total = orders.len();
        let reconciler = &self.reconciler;
        let (detected, confirmed, failed) = stream::iter(orders)
            .map(|order| async move {
                let result = reconciler.reconcile_order(&order).await;
                if let Err(e) = &result {
                    warn!("🧹️ Reconciliation of order {} failed. {e}", order.order_id);
                }
                result
            })
            .buffer_unordered(self.concurrency)
            .fold((0usize, 0usize, 0usize), |(d, c, f), result| async move {
                match result {
                    Ok(ReconcileOutcome::Detected { .. }) => (d + 1, c, f),
                    Ok(ReconcileOutcome::Confirmed { .. }) => (d, c + 1, f),
                    Ok(_) => (d, c, f),
                    Err(_) => (d, c, f + 1),
                }
            })
            .await;
        info!("🧹️ Sweep complete. {total} orders checked: {detected} detected, {confirmed} confirmed, {failed} failed");
        total
    }
}
