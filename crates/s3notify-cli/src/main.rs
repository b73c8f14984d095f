use std::path::PathBuf;

use clap::Parser;
use s3notify_common::Result;
use s3notify_notification::{ReqwestTransport, S3Event, WEBHOOK_TIMEOUT, run_invocation};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "s3notify",
    about = "Posts S3 upload events to a Discord webhook (DISCORD_WEBHOOK_URL)"
)]
struct Cli {
    /// S3 event notification document; read from stdin when omitted
    #[arg(long)]
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("s3notify=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let event = read_event(cli.event).await?;
    let transport = ReqwestTransport::new(WEBHOOK_TIMEOUT)?;

    let report = run_invocation(
        |name| std::env::var(name).ok(),
        Box::new(transport),
        &event,
    )
    .await?;
    info!(
        delivered = report.delivered(),
        skipped = report.skipped(),
        failed = report.failed(),
        "invocation complete"
    );

    Ok(())
}

async fn read_event(path: Option<PathBuf>) -> Result<S3Event> {
    let bytes = match path {
        Some(path) => tokio::fs::read(path).await?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            buf
        }
    };
    S3Event::from_json(&bytes)
}
