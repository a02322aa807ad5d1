//! Turns domain events into stored notifications and push deliveries.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::{Actor, DomainEvent, NotificationDraft};
use crate::devices::DeviceRegistry;
use crate::notifications::{NewNotification, NotificationKind, NotificationRecord, NotificationStore};
use crate::push::{DeliveryOutcome, PushGateway, PushMessage};
use crate::server::metrics::{
    record_dedup_hit, record_notification_created, record_push_delivery, record_store_failure,
};

/// What happened to one drafted notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Created,
    Deduplicated,
    SuppressedSelf,
    StoreFailed,
}

/// Push delivery counts for one created notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeliverySummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed_transient: usize,
    pub pruned_tokens: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct DispatchEntry {
    pub recipient_id: usize,
    pub kind: NotificationKind,
    pub outcome: DispatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliverySummary>,
}

/// Per-recipient results of dispatching one event.
#[derive(Clone, Debug, Serialize)]
pub struct DispatchReport {
    pub event_id: String,
    pub results: Vec<DispatchEntry>,
}

impl DispatchReport {
    pub fn has_store_failure(&self) -> bool {
        self.results
            .iter()
            .any(|entry| entry.outcome == DispatchOutcome::StoreFailed)
    }
}

pub struct EventDispatcher {
    store: Arc<dyn NotificationStore>,
    registry: Arc<DeviceRegistry>,
    gateway: Arc<dyn PushGateway>,
    dedup_window_sec: i64,
    fanout_concurrency: usize,
}

impl EventDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        registry: Arc<DeviceRegistry>,
        gateway: Arc<dyn PushGateway>,
        dedup_window_sec: i64,
        fanout_concurrency: usize,
    ) -> Self {
        Self {
            store,
            registry,
            gateway,
            dedup_window_sec,
            fanout_concurrency: fanout_concurrency.max(1),
        }
    }

    /// Runs the full pipeline for one event: derive recipients, store with
    /// dedup, fan out pushes. Failures are per recipient, one bad recipient
    /// never aborts the rest.
    pub async fn dispatch_event(&self, event: &DomainEvent) -> DispatchReport {
        let event_id = Uuid::new_v4().to_string();
        let actor = event.actor();
        let drafts = event.drafts();
        info!(
            "[{}] Dispatching {} from user {} to {} recipient(s)",
            event_id,
            event.kind_name(),
            actor.id,
            drafts.len()
        );

        let mut results = Vec::with_capacity(drafts.len());
        for draft in drafts {
            results.push(self.dispatch_draft(&event_id, actor, draft).await);
        }
        DispatchReport { event_id, results }
    }

    async fn dispatch_draft(
        &self,
        event_id: &str,
        actor: &Actor,
        draft: NotificationDraft,
    ) -> DispatchEntry {
        let recipient_id = draft.recipient_id;
        let kind = draft.kind;

        if recipient_id == actor.id {
            debug!(
                "[{}] Suppressing {} notification, user {} acted on their own content",
                event_id, kind, recipient_id
            );
            return DispatchEntry {
                recipient_id,
                kind,
                outcome: DispatchOutcome::SuppressedSelf,
                notification_id: None,
                delivery: None,
            };
        }

        let candidate = NewNotification {
            recipient_id,
            sender_id: actor.id,
            kind,
            post_id: draft.post_id,
            comment_id: draft.comment_id,
            message: draft.message,
        };
        let (record, created) = match self.store.insert_or_dedup(&candidate, self.dedup_window_sec)
        {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "[{}] Failed to store {} notification for user {}: {:#}",
                    event_id, kind, recipient_id, err
                );
                record_store_failure();
                return DispatchEntry {
                    recipient_id,
                    kind,
                    outcome: DispatchOutcome::StoreFailed,
                    notification_id: None,
                    delivery: None,
                };
            }
        };

        if !created {
            debug!(
                "[{}] Deduplicated {} notification for user {} against id {}",
                event_id, kind, recipient_id, record.id
            );
            record_dedup_hit(kind.as_str());
            return DispatchEntry {
                recipient_id,
                kind,
                outcome: DispatchOutcome::Deduplicated,
                notification_id: Some(record.id),
                delivery: None,
            };
        }

        record_notification_created(kind.as_str());
        let delivery = self.deliver(event_id, &record).await;
        DispatchEntry {
            recipient_id,
            kind,
            outcome: DispatchOutcome::Created,
            notification_id: Some(record.id),
            delivery: Some(delivery),
        }
    }

    async fn deliver(&self, event_id: &str, record: &NotificationRecord) -> DeliverySummary {
        if let Err(err) = self.registry.prune_invalid(record.recipient_id).await {
            warn!(
                "[{}] Token pruning before delivery failed for user {}: {:#}",
                event_id, record.recipient_id, err
            );
        }
        let endpoints = match self.registry.endpoints_for(record.recipient_id) {
            Ok(endpoints) => endpoints,
            Err(err) => {
                warn!(
                    "[{}] Failed to load device endpoints for user {}: {:#}",
                    event_id, record.recipient_id, err
                );
                return DeliverySummary::default();
            }
        };
        if endpoints.is_empty() {
            debug!(
                "[{}] User {} has no registered devices",
                event_id, record.recipient_id
            );
            return DeliverySummary::default();
        }

        let message = render_push_message(record);
        let outcomes: Vec<DeliveryOutcome> = stream::iter(endpoints)
            .map(|endpoint| {
                let gateway = self.gateway.clone();
                let message = message.clone();
                async move { gateway.send(&endpoint.token, &message).await }
            })
            .buffer_unordered(self.fanout_concurrency)
            .collect()
            .await;

        let mut summary = DeliverySummary {
            attempted: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome.error {
                None => {
                    summary.delivered += 1;
                    record_push_delivery("delivered");
                }
                Some(kind) if kind.is_terminal() => {
                    record_push_delivery(kind.as_str());
                    info!(
                        "[{}] Removing token reported {} during delivery to user {}",
                        event_id, kind, record.recipient_id
                    );
                    match self.registry.remove_dead_token(&outcome.token) {
                        Ok(true) => summary.pruned_tokens += 1,
                        Ok(false) => {}
                        Err(err) => {
                            warn!("[{}] Failed to remove dead token: {:#}", event_id, err)
                        }
                    }
                }
                Some(kind) => {
                    summary.failed_transient += 1;
                    record_push_delivery(kind.as_str());
                    debug!(
                        "[{}] Delivery to one device of user {} failed ({}), token kept",
                        event_id, record.recipient_id, kind
                    );
                }
            }
        }
        summary
    }
}

/// Renders the stored notification as a push message. Subject ids travel as
/// strings, absent ones as empty strings.
fn render_push_message(record: &NotificationRecord) -> PushMessage {
    let data = HashMap::from([
        ("type".to_string(), record.kind.as_str().to_string()),
        ("notification_id".to_string(), record.id.to_string()),
        (
            "post_id".to_string(),
            record.post_id.map(|id| id.to_string()).unwrap_or_default(),
        ),
        (
            "comment_id".to_string(),
            record
                .comment_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        ),
    ]);
    PushMessage {
        title: record.kind.push_title().to_string(),
        body: record.message.clone(),
        data,
    }
}
