pub mod store;
pub mod webhook;

pub use store::SnapshotStore;
pub use webhook::{WebhookClient, WebhookPayload};

use crate::snapshot::Snapshot;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    NotConfigured,
    Sent { status: u16 },
    /// Dry run: payload went to stdout instead.
    Printed,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub stored: bool,
    pub webhook: WebhookOutcome,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        !matches!(self.webhook, WebhookOutcome::Failed { .. })
    }
}

/// Fans a finished snapshot out to the serve-mode store and the webhook.
///
/// The store is updated before the push so a failing webhook never hides a
/// fresh snapshot from pollers.
#[derive(Debug, Clone, Default)]
pub struct Distributor {
    webhook: Option<WebhookClient>,
    store: Option<SnapshotStore>,
    dry_run: bool,
}

impl Distributor {
    pub fn new(webhook: Option<WebhookClient>, store: Option<SnapshotStore>) -> Self {
        Self {
            webhook,
            store,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn has_target(&self) -> bool {
        self.webhook.is_some() || self.store.is_some() || self.dry_run
    }

    pub async fn distribute(&self, snapshot: Arc<Snapshot>) -> DeliveryReport {
        let stored = match &self.store {
            Some(store) => {
                store.publish(Arc::clone(&snapshot)).await;
                true
            }
            None => false,
        };

        let webhook = if self.dry_run {
            self.print(&snapshot)
        } else {
            match &self.webhook {
                Some(client) => match client.send(&snapshot).await {
                    Ok(status) => {
                        info!(status, "sent snapshot to webhook");
                        WebhookOutcome::Sent { status }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to send snapshot to webhook");
                        WebhookOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                },
                None => WebhookOutcome::NotConfigured,
            }
        };

        DeliveryReport { stored, webhook }
    }

    fn print(&self, snapshot: &Snapshot) -> WebhookOutcome {
        match serde_json::to_string_pretty(&WebhookPayload::new(snapshot)) {
            Ok(json) => {
                println!("{}", json);
                WebhookOutcome::Printed
            }
            Err(e) => WebhookOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
