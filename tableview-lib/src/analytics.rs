//! Analytics seam for user-driven fetches.

use serde::Serialize;

use crate::query::ApiOptions;

/// Payload emitted after a user-driven fetch loaded: `{tableId, ...apiOptions}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFetchEvent {
    /// Table the fetch belongs to.
    pub table_id: String,
    /// Options sent to the endpoint.
    #[serde(flatten)]
    pub options: ApiOptions,
}

impl TableFetchEvent {
    /// Creates a new event.
    pub fn new(table_id: impl Into<String>, options: ApiOptions) -> Self {
        Self {
            table_id: table_id.into(),
            options,
        }
    }
}

/// Receiver of table fetch events.
///
/// Notified once a fetch has loaded its page into the store. The initial
/// fetch of a mounted table is never reported, nor are fetches that failed,
/// went stale or were cancelled.
pub trait AnalyticsSink: Send + Sync {
    /// Records one fetch.
    fn track(&self, event: &TableFetchEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn track(&self, _event: &TableFetchEvent) {}
}

/// Sink that writes events to the log at info level as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn track(&self, event: &TableFetchEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => log::info!("table fetch: {}", payload),
            Err(e) => log::warn!("failed to serialize analytics event: {}", e),
        }
    }
}
