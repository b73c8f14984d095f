use s3notify_common::time::format_event_time;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const EMBED_TITLE: &str = "📁 S3 Object Upload Notification";
pub const EMBED_DESCRIPTION: &str = "A new file was uploaded to an S3 bucket!";
pub const EMBED_COLOR: u32 = 3447003;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    #[serde(rename = "eventTime")]
    pub event_time: String,
    #[serde(rename = "awsRegion")]
    pub aws_region: String,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketInfo,
    pub object: ObjectInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
}

impl S3Event {
    pub fn from_json(bytes: &[u8]) -> s3notify_common::Result<Self> {
        serde_json::from_slice(bytes).map_err(|err| {
            s3notify_common::NotifyError::InvalidEvent(format!("failed to parse s3 event: {err}"))
        })
    }
}

/// One upload worth announcing. The key is kept exactly as the event source
/// delivered it, which usually means percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEvent {
    pub bucket: String,
    pub key: String,
    pub region: String,
    pub event_time: String,
}

impl UploadEvent {
    pub fn from_record(record: &S3EventRecord) -> Self {
        let event_time = match format_event_time(&record.event_time) {
            Some(formatted) => formatted,
            None => {
                warn!(
                    event_time = %record.event_time,
                    "event time is not rfc3339, passing it through unchanged"
                );
                record.event_time.clone()
            }
        };

        Self {
            bucket: record.s3.bucket.name.clone(),
            key: record.s3.object.key.clone(),
            region: record.aws_region.clone(),
            event_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    pub fn single(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}
