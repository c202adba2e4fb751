use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::advisory::{AdvisoryEvent, AdvisoryKind};

#[async_trait]
pub trait AdvisorySink: Send + Sync {
    async fn send(&self, event: &AdvisoryEvent) -> Result<()>;
}

/// Short tag a farmer sees in front of each delivered advisory.
fn kind_tag(kind: AdvisoryKind) -> &'static str {
    match kind {
        AdvisoryKind::HighSeverityDetected => "HIGH SEVERITY",
        AdvisoryKind::RepeatedDetection => "RECURRING",
        AdvisoryKind::RegionalAlert => "REGIONAL",
    }
}

/// Wire shape posted to generic webhooks. Flattened from the event so
/// receivers get stable field names independent of internal types.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    source: &'static str,
    kind: AdvisoryKind,
    tag: &'static str,
    crop_type: &'a str,
    title: &'a str,
    detail: &'a str,
}

fn webhook_payload(event: &AdvisoryEvent) -> WebhookPayload<'_> {
    WebhookPayload {
        source: "cropsense",
        kind: event.kind,
        tag: kind_tag(event.kind),
        crop_type: &event.crop_type,
        title: &event.title,
        detail: &event.body,
    }
}

fn discord_content(event: &AdvisoryEvent) -> String {
    format!(
        "**[{}] {}** — {}\n{}",
        kind_tag(event.kind),
        event.crop_type,
        event.title,
        event.body
    )
}

pub struct StdoutSink;

#[async_trait]
impl AdvisorySink for StdoutSink {
    async fn send(&self, event: &AdvisoryEvent) -> Result<()> {
        println!(
            "[{}] {}: {} - {}",
            kind_tag(event.kind),
            event.crop_type,
            event.title,
            event.body
        );
        Ok(())
    }
}

pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("cropsense/0.2")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn is_discord(&self) -> bool {
        self.url.contains("discord.com/api/webhooks")
            || self.url.contains("discordapp.com/api/webhooks")
    }
}

#[async_trait]
impl AdvisorySink for WebhookSink {
    async fn send(&self, event: &AdvisoryEvent) -> Result<()> {
        let req = if self.is_discord() {
            self.client
                .post(&self.url)
                .json(&serde_json::json!({ "content": discord_content(event) }))
        } else {
            self.client.post(&self.url).json(&webhook_payload(event))
        };

        req.send().await?.error_for_status()?;
        Ok(())
    }
}
