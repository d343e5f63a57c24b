mod local_fs;

pub use local_fs::LocalFileStorage;

use crate::errors::ApiError;
use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Local, SecondsFormat};
use futures::stream::BoxStream;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Upload content as it arrives from the client.
pub type ByteStream<'a> = BoxStream<'a, Result<Bytes, ApiError>>;

/// A file as reported by the listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "uploadDate", serialize_with = "rfc3339_seconds")]
    pub upload_date: DateTime<Local>,
}

fn rfc3339_seconds<S: Serializer>(date: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Writes `body` under `name`, replacing any existing entry. Returns the byte count.
    async fn save(&self, name: &str, body: ByteStream<'_>) -> Result<u64, ApiError>;
    async fn list(&self) -> Result<Vec<StoredFile>, ApiError>;
    /// Path of the existing regular file stored under `name`.
    async fn locate(&self, name: &str) -> Result<PathBuf, ApiError>;
    async fn delete(&self, name: &str) -> Result<(), ApiError>;
}

/// Reduces a client supplied upload name to its final path component.
pub fn upload_name(raw: &str) -> Option<String> {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn upload_name_keeps_only_the_last_component() {
        assert_eq!(upload_name("report.txt").as_deref(), Some("report.txt"));
        assert_eq!(upload_name("C/docs/report.txt").as_deref(), Some("report.txt"));
        assert_eq!(upload_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(upload_name(".."), None);
        assert_eq!(upload_name(""), None);
    }

    #[test]
    fn stored_file_serializes_upload_date_as_rfc3339() {
        let upload_date = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap();
        let file = StoredFile {
            name: "report.txt".into(),
            size: 5,
            upload_date,
        };

        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["name"], "report.txt");
        assert_eq!(json["size"], 5);

        let date = json["uploadDate"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(date).unwrap();
        assert_eq!(parsed, upload_date);
        assert!(!date.contains('.'));
    }
}
