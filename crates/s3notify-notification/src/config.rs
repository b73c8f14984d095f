use s3notify_common::error::{NotifyError, Result};

pub const WEBHOOK_URL_ENV: &str = "DISCORD_WEBHOOK_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub webhook_url: String,
}

impl NotifierConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup(WEBHOOK_URL_ENV)
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                NotifyError::Configuration(format!("{WEBHOOK_URL_ENV} is not set"))
            })?;

        Ok(Self { webhook_url })
    }
}
