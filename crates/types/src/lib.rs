//! Wire types shared by the amdl-web gateway and core.
//!
//! Everything here is serialized straight onto the HTTP surface, so field
//! names follow what the browser UI reads (snake_case unless noted).

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Severity of a single progress message, rendered as `type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Lifecycle status of a tracked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Started,
    Running,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// `completed` and `failed` are terminal; nothing moves a record out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested audio quality. Anything unrecognised falls back to ALAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum Quality {
    #[default]
    Alac,
    Atmos,
    Aac,
}

impl Quality {
    /// Human-readable label used in progress messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Alac => "ALAC (Lossless)",
            Self::Atmos => "Dolby Atmos",
            Self::Aac => "AAC",
        }
    }
}

impl From<Option<String>> for Quality {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("atmos") => Self::Atmos,
            Some("aac") => Self::Aac,
            _ => Self::Alac,
        }
    }
}

/// Presence/version of one external tool or auxiliary service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct DependencyStatus {
    pub installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DependencyStatus {
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Body of `POST /api/download`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub select_mode: bool,
    #[serde(default)]
    pub download_lyrics: bool,
    #[serde(default)]
    pub embed_cover: bool,
}

/// Response of `POST /api/download`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct DownloadResponse {
    pub success: bool,
    pub download_id: String,
}

/// JSON snapshot of a tracked download (`GET /api/download/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct DownloadSnapshot {
    pub download_id: String,
    pub status: DownloadStatus,
    pub percent: f64,
    pub message_count: usize,
}

/// Outcome of a side-effecting action (install, config save, wrapper start).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Static host descriptor (`GET /api/system/info`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct SystemInfo {
    pub os: String,
    pub version: String,
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
}

/// Payload of a `progress` stream event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct ProgressPayload {
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    /// Percent observed when the event was emitted, not when the message was appended.
    pub percent: f64,
}

/// Payload of `complete` and `error` stream events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
pub struct NoticePayload {
    pub message: String,
}

/// One event pushed to a progress-stream subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../web/src/types/generated/"))]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress(ProgressPayload),
    Complete(NoticePayload),
    Error(NoticePayload),
}

impl StreamEvent {
    pub fn notice_complete(message: impl Into<String>) -> Self {
        Self::Complete(NoticePayload {
            message: message.into(),
        })
    }

    pub fn notice_error(message: impl Into<String>) -> Self {
        Self::Error(NoticePayload {
            message: message.into(),
        })
    }

    /// SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress(_) => "progress",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
        }
    }

    /// Closing events end the stream.
    pub fn is_closing(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }

    /// JSON body of the SSE `data:` line (the payload only, without the tag).
    pub fn payload_json(&self) -> String {
        let encoded = match self {
            Self::Progress(p) => serde_json::to_string(p),
            Self::Complete(n) | Self::Error(n) => serde_json::to_string(n),
        };
        encoded.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quality_falls_back_to_alac() {
        let req: DownloadRequest =
            serde_json::from_str(r#"{"url":"u","quality":"lossless-ish"}"#).unwrap();
        assert_eq!(req.quality, Quality::Alac);

        let req: DownloadRequest = serde_json::from_str(r#"{"url":"u","quality":"ATMOS"}"#).unwrap();
        assert_eq!(req.quality, Quality::Atmos);

        let req: DownloadRequest = serde_json::from_str(r#"{"url":"u"}"#).unwrap();
        assert_eq!(req.quality, Quality::Alac);
        assert!(!req.select_mode);
    }

    #[test]
    fn null_quality_falls_back_to_alac() {
        let req: DownloadRequest =
            serde_json::from_str(r#"{"url":"u","quality":null}"#).unwrap();
        assert_eq!(req.quality, Quality::Alac);
    }

    #[test]
    fn dependency_status_omits_empty_fields() {
        let json = serde_json::to_string(&DependencyStatus::missing()).unwrap();
        assert_eq!(json, r#"{"installed":false}"#);

        let status = DependencyStatus {
            installed: true,
            version: Some("ffmpeg version 6.1".into()),
            path: Some("/usr/bin/ffmpeg".into()),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"version\":\"ffmpeg version 6.1\""));
        assert!(json.contains("\"path\":\"/usr/bin/ffmpeg\""));
    }

    #[test]
    fn progress_payload_uses_type_key() {
        let event = StreamEvent::Progress(ProgressPayload {
            message: "Album detected".into(),
            severity: Severity::Info,
            percent: 20.0,
        });
        assert_eq!(event.kind(), "progress");
        assert!(!event.is_closing());

        let data: serde_json::Value = serde_json::from_str(&event.payload_json()).unwrap();
        assert_eq!(data["type"], "info");
        assert_eq!(data["message"], "Album detected");
        assert_eq!(data["percent"], 20.0);
    }

    #[test]
    fn closing_events() {
        let done = StreamEvent::notice_complete("Download completed successfully");
        assert_eq!(done.kind(), "complete");
        assert!(done.is_closing());
        assert_eq!(
            done.payload_json(),
            r#"{"message":"Download completed successfully"}"#
        );

        let err = StreamEvent::notice_error("Download not found");
        assert_eq!(err.kind(), "error");
        assert!(err.is_closing());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!DownloadStatus::Started.is_terminal());
        assert!(!DownloadStatus::Running.is_terminal());
        assert!(DownloadStatus::Completed.is_terminal());
        assert!(DownloadStatus::Failed.is_terminal());
        assert_eq!(DownloadStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn action_response_shapes() {
        assert_eq!(
            serde_json::to_string(&ActionResponse::ok()).unwrap(),
            r#"{"success":true}"#
        );
        assert_eq!(
            serde_json::to_string(&ActionResponse::failed("boom")).unwrap(),
            r#"{"success":false,"error":"boom"}"#
        );
    }
}
