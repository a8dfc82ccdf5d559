use crate::sync::{Stage, SyncOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Rejected,
    Started,
    NoBookmark { tag: String },
    Skipped { bookmark_id: String },
    Updating { post_id: u64 },
    Creating { bookmark_id: String },
    Finished(SyncOutcome),
    Failed { stage: Stage, message: String },
}

/// Receives pipeline events. The pipeline never branches on what the
/// observer does with them.
pub trait SyncObserver: Send + Sync {
    fn record(&self, event: &SyncEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn record(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Rejected => tracing::warn!("unauthorized request, invalid secret"),
            SyncEvent::Started => tracing::info!("starting sync"),
            SyncEvent::NoBookmark { tag } => {
                tracing::info!(tag = %tag, "no bookmarks with sync tag found")
            }
            SyncEvent::Skipped { bookmark_id } => tracing::info!(
                bookmark_id = %bookmark_id,
                "bookmark has no notes or highlights, skipping"
            ),
            SyncEvent::Updating { post_id } => {
                tracing::info!(post_id, "updating existing post")
            }
            SyncEvent::Creating { bookmark_id } => {
                tracing::info!(bookmark_id = %bookmark_id, "creating new post")
            }
            SyncEvent::Finished(outcome) => tracing::info!(outcome = %outcome, "sync finished"),
            SyncEvent::Failed { stage, message } => {
                tracing::error!(stage = %stage, error = %message, "sync failed")
            }
        }
    }
}
