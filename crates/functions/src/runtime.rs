//! Trigger runtime
//!
//! Stands in for the hosting platform: it delivers profile events to the
//! handler with a bounded number of concurrent invocations and redelivers
//! events whose failures were propagated and are transient.

use std::sync::Arc;
use std::time::Duration;

use profilesync_core::{ProfileSyncHandler, SyncFailure, SyncOutcome, SyncStage};
use profilesync_domain::{RuntimeConfig, UserProfileEvent};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

const DEFAULT_REDELIVERY_BACKOFF: Duration = Duration::from_millis(250);

/// Result of delivering one event, including redeliveries
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub uid: String,
    pub event_id: Option<String>,
    /// Number of times the handler was invoked for this event.
    pub deliveries: u32,
    pub result: Result<SyncOutcome, SyncFailure>,
}

impl DeliveryReport {
    pub fn outcome(&self) -> Option<SyncOutcome> {
        self.result.as_ref().ok().copied()
    }
}

/// A propagated failure as reported in a [`DispatchSummary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub stage: SyncStage,
    pub error_type: &'static str,
    pub message: String,
    pub deliveries: u32,
}

/// Totals over one dispatched batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub events: usize,
    pub deliveries: u64,
    pub unchanged: usize,
    pub updated: usize,
    pub created: usize,
    pub abandoned: usize,
    /// Handler tasks that panicked or were cancelled.
    pub aborted: usize,
    pub failures: Vec<FailureRecord>,
}

impl DispatchSummary {
    fn record(&mut self, report: DeliveryReport) {
        self.events += 1;
        self.deliveries += u64::from(report.deliveries);
        match report.result {
            Ok(SyncOutcome::Unchanged) => self.unchanged += 1,
            Ok(SyncOutcome::Updated) => self.updated += 1,
            Ok(SyncOutcome::Created) => self.created += 1,
            Ok(SyncOutcome::Abandoned) => self.abandoned += 1,
            Err(failure) => self.failures.push(FailureRecord {
                uid: failure.uid,
                event_id: report.event_id,
                stage: failure.stage,
                error_type: failure.source.label(),
                message: failure.source.to_string(),
                deliveries: report.deliveries,
            }),
        }
    }

    /// Whether any event ended in a propagated failure or an aborted task.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || self.aborted > 0
    }
}

/// Delivers events to a [`ProfileSyncHandler`]
#[derive(Clone)]
pub struct TriggerRuntime {
    handler: Arc<ProfileSyncHandler>,
    permits: Arc<Semaphore>,
    max_delivery_attempts: u32,
    redelivery_backoff: Duration,
}

impl TriggerRuntime {
    pub fn new(handler: Arc<ProfileSyncHandler>, config: &RuntimeConfig) -> Self {
        Self {
            handler,
            permits: Arc::new(Semaphore::new(config.max_instances.max(1))),
            max_delivery_attempts: config.max_delivery_attempts.max(1),
            redelivery_backoff: DEFAULT_REDELIVERY_BACKOFF,
        }
    }

    /// Base delay before a redelivery; doubles on each further attempt.
    pub fn with_redelivery_backoff(mut self, backoff: Duration) -> Self {
        self.redelivery_backoff = backoff;
        self
    }

    /// Deliver one event, redelivering transient propagated failures.
    ///
    /// Does not take a concurrency permit; [`TriggerRuntime::dispatch`] does.
    pub async fn deliver(&self, event: UserProfileEvent) -> DeliveryReport {
        let mut deliveries = 0;

        let result = loop {
            deliveries += 1;
            match self.handler.handle(&event).await {
                Ok(outcome) => break Ok(outcome),
                Err(failure)
                    if failure.is_transient() && deliveries < self.max_delivery_attempts =>
                {
                    warn!(
                        uid = %failure.uid,
                        stage = %failure.stage,
                        delivery = deliveries,
                        max_deliveries = self.max_delivery_attempts,
                        "redelivering event"
                    );
                    self.sleep_before_redelivery(deliveries).await;
                }
                Err(failure) => break Err(failure),
            }
        };

        DeliveryReport {
            uid: event.uid().to_string(),
            event_id: event.event_id.clone(),
            deliveries,
            result,
        }
    }

    /// Deliver every event, at most `max_instances` at a time.
    pub async fn dispatch(&self, events: Vec<UserProfileEvent>) -> DispatchSummary {
        let mut tasks = JoinSet::new();

        for event in events {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    error!(error = %err, "instance limiter closed; dropping remaining events");
                    break;
                }
            };
            let runtime = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                runtime.deliver(event).await
            });
        }

        let mut summary = DispatchSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => summary.record(report),
                Err(err) => {
                    error!(error = %err, "handler task aborted");
                    summary.aborted += 1;
                }
            }
        }
        summary
    }

    async fn sleep_before_redelivery(&self, delivery: u32) {
        let shift = delivery.saturating_sub(1).min(6);
        let delay = self.redelivery_backoff.saturating_mul(1u32 << shift);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
