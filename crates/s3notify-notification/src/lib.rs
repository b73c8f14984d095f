pub mod adapter;
pub mod config;
pub mod system;
pub mod targets;
pub mod types;

pub use adapter::{KeyDecodeError, build_document, decode_key, normalize_key, path_encode};
pub use config::NotifierConfig;
pub use system::{InvocationReport, NotificationSys, RecordOutcome, run_invocation};
pub use targets::webhook::{
    ReqwestTransport, WEBHOOK_TIMEOUT, WebhookResponse, WebhookSender, WebhookTransport,
};
pub use types::{Embed, EmbedField, S3Event, UploadEvent, WebhookPayload};
