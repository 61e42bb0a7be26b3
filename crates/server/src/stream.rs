// crates/server/src/stream.rs
//! Progress stream publisher.
//!
//! Turns a session's [`ProgressRecord`] into an ordered event sequence by
//! polling `read_since` on a fixed interval. Every message appended to the
//! record is emitted exactly once, in append order, followed by a single
//! `complete` or `error` event when the record reaches a terminal status.

use std::sync::Arc;
use std::time::Duration;

use amdl_web_core::ProgressRecord;
use amdl_web_types::{DownloadStatus, ProgressPayload, StreamEvent};
use axum::response::sse::Event;
use tokio_stream::Stream;

use crate::metrics::StreamGauge;

pub const COMPLETED_MESSAGE: &str = "Download completed successfully";
pub const FAILED_MESSAGE: &str = "Download failed";
pub const NOT_FOUND_MESSAGE: &str = "Download not found";

/// Event sequence for one subscriber.
///
/// `None` (unknown id) yields a single `error` event. Dropping the stream
/// (client disconnect) stops polling; the record and its worker are
/// unaffected.
pub fn progress_events(
    record: Option<Arc<ProgressRecord>>,
    poll_interval: Duration,
) -> impl Stream<Item = StreamEvent> {
    async_stream::stream! {
        let Some(record) = record else {
            yield StreamEvent::notice_error(NOT_FOUND_MESSAGE);
            return;
        };

        let _gauge = StreamGauge::open();
        let mut offset = 0usize;

        loop {
            let delta = record.read_since(offset);
            offset = delta.total;

            for message in delta.messages {
                yield StreamEvent::Progress(ProgressPayload {
                    message: message.text,
                    severity: message.severity,
                    percent: delta.percent,
                });
            }

            match delta.status {
                DownloadStatus::Completed => {
                    yield StreamEvent::notice_complete(COMPLETED_MESSAGE);
                    break;
                }
                DownloadStatus::Failed => {
                    yield StreamEvent::notice_error(FAILED_MESSAGE);
                    break;
                }
                DownloadStatus::Started | DownloadStatus::Running => {}
            }

            tokio::time::sleep(poll_interval).await;
        }

        tracing::debug!(download_id = %record.id(), "Progress stream finished");
    }
}

/// SSE frame: `event: <kind>`, `data: <payload json>`.
pub fn to_sse(event: &StreamEvent) -> Event {
    Event::default().event(event.kind()).data(event.payload_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amdl_web_types::Severity;
    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;

    const POLL: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn unknown_id_yields_single_error() {
        let events: Vec<StreamEvent> = progress_events(None, POLL).collect().await;
        assert_eq!(events, vec![StreamEvent::notice_error(NOT_FOUND_MESSAGE)]);
    }

    #[tokio::test]
    async fn finished_record_replays_everything_then_closes() {
        let record = Arc::new(ProgressRecord::new("s1"));
        record.append_message("one", Severity::Info);
        record.append_message("two", Severity::Warning);
        record.set_percent(100.0);
        record.set_status(DownloadStatus::Completed);

        let events: Vec<StreamEvent> = progress_events(Some(record), POLL).collect().await;
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StreamEvent::Progress(ProgressPayload {
                message: "one".into(),
                severity: Severity::Info,
                percent: 100.0,
            })
        );
        assert_eq!(events[2], StreamEvent::notice_complete(COMPLETED_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn live_messages_arrive_in_order_exactly_once() {
        let record = Arc::new(ProgressRecord::new("s2"));
        record.set_status(DownloadStatus::Running);

        let writer = Arc::clone(&record);
        tokio::spawn(async move {
            for i in 0..5 {
                writer.append_message(format!("m{i}"), Severity::Info);
                writer.set_percent(i as f64 * 20.0);
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            writer.set_status(DownloadStatus::Completed);
        });

        let events: Vec<StreamEvent> = progress_events(Some(record), POLL).collect().await;
        let texts: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Progress(p) => Some(p.message.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["m0", "m1", "m2", "m3", "m4"]);
        assert_eq!(events.len(), 6);
        assert!(events.last().unwrap().is_closing());
    }

    #[tokio::test]
    async fn failed_record_closes_with_error() {
        let record = Arc::new(ProgressRecord::new("s3"));
        record.append_message("Invalid URL format: nope", Severity::Error);
        record.set_status(DownloadStatus::Failed);

        let events: Vec<StreamEvent> = progress_events(Some(record), POLL).collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], StreamEvent::notice_error(FAILED_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stream_leaves_record_alone() {
        let record = Arc::new(ProgressRecord::new("s4"));
        record.append_message("first", Severity::Info);

        let mut stream = Box::pin(progress_events(Some(Arc::clone(&record)), POLL));
        assert!(stream.next().await.is_some());
        drop(stream);

        record.append_message("second", Severity::Info);
        assert_eq!(record.snapshot().message_count, 2);
        assert_eq!(Arc::strong_count(&record), 1);
    }
}
