//! Optional webhook fan-out.
//!
//! Successful ingestions can be forwarded to one configured external URL.
//! Strictly fire-and-forget: the forward runs on a detached task after the
//! success response is already committed, and failures are only logged.

use tracing::warn;

use geoproof_types::VerificationRecord;

use crate::handlers::RecordBody;

pub struct Webhook {
    client: reqwest::Client,
    url: String,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Forward a committed record as JSON. Returns immediately.
    pub fn forward(&self, record: VerificationRecord) {
        let client = self.client.clone();
        let url = self.url.clone();
        let body = RecordBody::from(record);
        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(response) if !response.status().is_success() => {
                    warn!(
                        "webhook {url} answered {} for {}",
                        response.status(),
                        body.transaction_id
                    );
                }
                Ok(_) => {}
                Err(e) => warn!("webhook {url} failed for {}: {e}", body.transaction_id),
            }
        });
    }
}
