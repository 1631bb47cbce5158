//! HR-timeout sweep.
//!
//! [`TimeoutSweeper`] runs hourly, scanning requisitions stuck in
//! `approved` without HR authorization and force-rejecting those past the
//! configured deadline. Each eligible record is processed as its own task
//! so one failure never blocks the rest, and the resulting write is fed
//! back through the [`TransitionReactor`] so the requester's rejection
//! notice fires exactly as it would for a manual rejection.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use mifugo_core::config::WorkflowConfig;
use mifugo_core::domain::requisition::{HistoryEntry, Requisition, RequisitionStatus};
use mifugo_db::repositories::{RepositoryError, RequisitionRepository};

use crate::compose::default_timeout_reason;
use crate::reactor::TransitionReactor;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Per-run counters, logged once per sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub scanned: usize,
    pub rejected: usize,
}

pub struct TimeoutSweeper {
    requisitions: Arc<dyn RequisitionRepository>,
    reactor: Arc<TransitionReactor>,
    timeout_hours: u64,
}

impl TimeoutSweeper {
    pub fn new(
        requisitions: Arc<dyn RequisitionRepository>,
        reactor: Arc<TransitionReactor>,
        workflow: &WorkflowConfig,
    ) -> Self {
        Self { requisitions, reactor, timeout_hours: workflow.approval_timeout_hours }
    }

    /// Run the sweep loop until the token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("timeout sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One sweep pass. Naturally idempotent: anything already rejected or
    /// authorized is skipped on re-scan.
    pub async fn run_once(&self) -> SweepSummary {
        let approved =
            match self.requisitions.list_by_status(RequisitionStatus::Approved.as_str()).await {
                Ok(approved) => approved,
                Err(e) => {
                    error!(error = %e, "approved-requisition scan failed; skipping sweep");
                    return SweepSummary::default();
                }
            };

        let scanned = approved.len();
        let now = Utc::now();
        let deadline_ms = (now - chrono::Duration::hours(self.timeout_hours as i64))
            .timestamp_millis();

        let mut jobs = JoinSet::new();
        for requisition in approved {
            if requisition.is_authorized() {
                continue;
            }

            let Some(approved_at_ms) =
                requisition.approved_at.as_deref().and_then(approved_at_millis)
            else {
                debug!(
                    requisition_id = %requisition.id.0,
                    approved_at = requisition.approved_at.as_deref().unwrap_or(""),
                    "unparseable approval timestamp; skipping"
                );
                continue;
            };

            // Not yet past the deadline.
            if approved_at_ms > deadline_ms {
                continue;
            }

            let repository = Arc::clone(&self.requisitions);
            let reactor = Arc::clone(&self.reactor);
            let timeout_hours = self.timeout_hours;
            jobs.spawn(async move {
                let id = requisition.id.0.clone();
                (id, auto_reject(repository, reactor, timeout_hours, requisition).await)
            });
        }

        let mut rejected = 0;
        while let Some(result) = jobs.join_next().await {
            match result {
                Ok((_, Ok(()))) => rejected += 1,
                Ok((id, Err(e))) => {
                    error!(requisition_id = %id, error = %e, "auto-rejection failed");
                }
                Err(e) => {
                    error!(error = %e, "auto-rejection task panicked");
                }
            }
        }

        info!(
            scanned,
            rejected,
            timeout_hours = self.timeout_hours,
            "hr timeout sweep finished"
        );
        SweepSummary { scanned, rejected }
    }
}

async fn auto_reject(
    repository: Arc<dyn RequisitionRepository>,
    reactor: Arc<TransitionReactor>,
    timeout_hours: u64,
    requisition: Requisition,
) -> Result<(), RepositoryError> {
    let now = Utc::now();
    let reason = default_timeout_reason(timeout_hours);

    let before = requisition.clone();
    let mut after = requisition;
    after.status = RequisitionStatus::Rejected.as_str().to_string();
    after.rejected_by = Some("HR".to_string());
    after.rejected_at = Some(now.to_rfc3339());
    after.rejection_reason = Some(reason.clone());
    after.hr_auto_rejected = true;
    after.hr_auto_rejected_at = Some(now.to_rfc3339());
    after.append_history(HistoryEntry::new("auto_rejected", "HR").with_details(reason));

    repository.save(after.clone()).await?;

    // The store write would re-trigger the reactor in the hosted setup;
    // feed the same before/after pair through it here.
    reactor.handle_write(Some(&before), Some(&after)).await;

    Ok(())
}

/// Interpret an approval timestamp: numeric epoch milliseconds, a numeric
/// string, or a parseable date string. Anything else is `None` and the
/// record is skipped.
fn approved_at_millis(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(millis) = value.parse::<i64>() {
        return Some(millis);
    }
    if let Ok(millis) = value.parse::<f64>() {
        if millis.is_finite() {
            return Some(millis as i64);
        }
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc).timestamp_millis());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(timestamp.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }

    None
}
