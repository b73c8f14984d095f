use s3notify_common::error::{NotifyError, Result};
use tracing::{debug, info, warn};

use crate::{
    adapter::is_object_created,
    config::NotifierConfig,
    targets::webhook::{WebhookSender, WebhookTransport},
    types::{S3Event, S3EventRecord, UploadEvent},
};

#[derive(Debug)]
pub enum RecordOutcome {
    Delivered {
        bucket: String,
        key: String,
    },
    Skipped {
        event_name: String,
    },
    Failed {
        bucket: String,
        key: String,
        error: NotifyError,
    },
}

#[derive(Debug, Default)]
pub struct InvocationReport {
    outcomes: Vec<RecordOutcome>,
}

impl InvocationReport {
    fn record(mut self, outcome: RecordOutcome) -> Self {
        self.outcomes.push(outcome);
        self
    }

    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    pub fn delivered(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Delivered { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(*outcome)).count()
    }
}

pub struct NotificationSys {
    sender: WebhookSender,
}

impl NotificationSys {
    pub fn new(sender: WebhookSender) -> Self {
        Self { sender }
    }

    /// Processes records one at a time. A failed delivery is logged and
    /// recorded, then the next record is attempted.
    pub async fn handle(&self, event: &S3Event) -> InvocationReport {
        let mut report = InvocationReport::default();
        for record in &event.records {
            let outcome = self.handle_record(record).await;
            report = report.record(outcome);
        }

        info!(
            records = event.records.len(),
            delivered = report.delivered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "finished processing s3 event"
        );
        report
    }

    async fn handle_record(&self, record: &S3EventRecord) -> RecordOutcome {
        if !is_object_created(&record.event_name) {
            debug!(event_name = %record.event_name, "ignoring non object-created event");
            return RecordOutcome::Skipped {
                event_name: record.event_name.clone(),
            };
        }

        let upload = UploadEvent::from_record(record);
        info!(bucket = %upload.bucket, key = %upload.key, "detected upload");

        match self.sender.notify(&upload).await {
            Ok(()) => RecordOutcome::Delivered {
                bucket: upload.bucket,
                key: upload.key,
            },
            Err(err) => {
                warn!(
                    bucket = %upload.bucket,
                    key = %upload.key,
                    kind = err.kind(),
                    error = %err,
                    "failed to send upload notification"
                );
                RecordOutcome::Failed {
                    bucket: upload.bucket,
                    key: upload.key,
                    error: err,
                }
            }
        }
    }
}

/// One invocation over one event batch. Configuration is resolved before any
/// record is looked at; after that only per-record outcomes are reported.
pub async fn run_invocation<F>(
    lookup: F,
    transport: Box<dyn WebhookTransport>,
    event: &S3Event,
) -> Result<InvocationReport>
where
    F: Fn(&str) -> Option<String>,
{
    let config = NotifierConfig::from_lookup(lookup)?;
    let sys = NotificationSys::new(WebhookSender::with_transport(config.webhook_url, transport));
    Ok(sys.handle(event).await)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use s3notify_common::error::{NotifyError, Result};

    use super::{NotificationSys, RecordOutcome, run_invocation};
    use crate::{
        config::WEBHOOK_URL_ENV,
        targets::webhook::{WebhookResponse, WebhookSender, WebhookTransport},
        types::{BucketInfo, ObjectInfo, S3Entity, S3Event, S3EventRecord},
    };

    /// Replays canned results in order and remembers every body it was given.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        script: Arc<Mutex<Vec<Result<WebhookResponse>>>>,
        bodies: Arc<Mutex<Vec<serde_json::Value>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn new(mut script: Vec<Result<WebhookResponse>>) -> Self {
            script.reverse();
            Self {
                script: Arc::new(Mutex::new(script)),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl WebhookTransport for ScriptedTransport {
        async fn post_json(&self, _endpoint: &str, body: Vec<u8>) -> Result<WebhookResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .lock()
                .unwrap()
                .push(serde_json::from_slice(&body).unwrap());
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(no_content()))
        }
    }

    fn no_content() -> WebhookResponse {
        WebhookResponse {
            status: 204,
            body: String::new(),
        }
    }

    fn record(event_name: &str, bucket: &str, key: &str) -> S3EventRecord {
        S3EventRecord {
            event_name: event_name.to_string(),
            event_time: "2024-01-01T00:00:00.000Z".to_string(),
            aws_region: "us-east-1".to_string(),
            s3: S3Entity {
                bucket: BucketInfo {
                    name: bucket.to_string(),
                },
                object: ObjectInfo {
                    key: key.to_string(),
                },
            },
        }
    }

    fn configured(name: &str) -> Option<String> {
        (name == WEBHOOK_URL_ENV).then(|| "https://discord.test/api/webhooks/1/abc".to_string())
    }

    #[tokio::test]
    async fn failed_delivery_does_not_stop_the_batch() {
        let transport = ScriptedTransport::new(vec![
            Err(NotifyError::transport("connection refused")),
            Ok(no_content()),
        ]);
        let event = S3Event {
            records: vec![
                record("ObjectCreated:Put", "my-bucket", "first.txt"),
                record("ObjectCreated:Put", "my-bucket", "folder/my%20file.txt"),
            ],
        };

        let report = run_invocation(configured, Box::new(transport.clone()), &event)
            .await
            .unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.delivered(), 1);
        assert!(matches!(
            &report.outcomes()[0],
            RecordOutcome::Failed { key, error: NotifyError::Transport(_), .. } if key == "first.txt"
        ));
        assert!(matches!(
            &report.outcomes()[1],
            RecordOutcome::Delivered { key, .. } if key == "folder/my%20file.txt"
        ));

        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(
            bodies[1]["embeds"][0]["fields"][2]["value"],
            "`folder/my file.txt`"
        );
        assert_eq!(bodies[1]["embeds"][0]["timestamp"], "2024-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn missing_webhook_url_sends_nothing() {
        let transport = ScriptedTransport::default();
        let event = S3Event {
            records: vec![record("ObjectCreated:Put", "b", "k")],
        };

        let err = run_invocation(|_| None, Box::new(transport.clone()), &event)
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Configuration(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_upload_events_are_skipped() {
        let transport = ScriptedTransport::default();
        let sys = NotificationSys::new(WebhookSender::with_transport(
            "https://discord.test/hook".to_string(),
            Box::new(transport.clone()),
        ));
        let event = S3Event {
            records: vec![
                record("ObjectRemoved:Delete", "b", "gone.txt"),
                record("", "b", "unnamed.txt"),
            ],
        };

        let report = sys.handle(&event).await;

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.delivered(), 1);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unexpected_status_is_recorded_per_record() {
        let transport = ScriptedTransport::new(vec![Ok(WebhookResponse {
            status: 429,
            body: "rate limited".to_string(),
        })]);
        let event = S3Event {
            records: vec![record("ObjectCreated:Copy", "b", "k")],
        };

        let report = run_invocation(configured, Box::new(transport), &event)
            .await
            .unwrap();

        assert!(matches!(
            &report.outcomes()[0],
            RecordOutcome::Failed {
                error: NotifyError::UnexpectedStatus { status: 429, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_batch_is_a_successful_invocation() {
        let report = run_invocation(
            configured,
            Box::new(ScriptedTransport::default()),
            &S3Event::default(),
        )
        .await
        .unwrap();

        assert!(report.outcomes().is_empty());
    }
}
