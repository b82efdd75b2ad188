use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::NotifyError;
use crate::logging::LogContext;

/// A single outgoing email
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
}

/// Delivers one email to one recipient
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Posts each email as JSON to an HTTP mail relay
pub struct RelayMailer {
    client: Client,
    relay_url: String,
}

impl RelayMailer {
    pub fn new(relay_url: String, timeout_seconds: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { client, relay_url })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let response = self.client.post(&self.relay_url).json(email).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                recipient: email.to.clone(),
                status: status.as_u16(),
            });
        }

        LogContext::new("mailer", "send")
            .with_metadata("to", serde_json::json!(email.to))
            .with_metadata("subject", serde_json::json!(email.subject))
            .debug("Email accepted by relay");
        Ok(())
    }
}

/// Sends notifications through a [`Mailer`], or only logs them when email is disabled
pub struct Notifier {
    mailer: Box<dyn Mailer>,
    enabled: bool,
}

impl Notifier {
    pub fn new(mailer: Box<dyn Mailer>, enabled: bool) -> Self {
        Self { mailer, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Send `message` to every address in `emails`, one email each.
    ///
    /// The first failing recipient aborts the rest and its error is returned.
    pub async fn notify(
        &self,
        emails: &[String],
        message: &str,
        subject: &str,
        from_email: &str,
    ) -> Result<(), NotifyError> {
        if !self.enabled {
            info!("{}", subject);
            info!("{}", message);
            return Ok(());
        }

        debug!("Sending emails to {:?}", emails);
        debug!("{}\n\n{}", subject, message);

        for recipient in emails {
            let email = Email {
                to: recipient.clone(),
                from: from_email.to_string(),
                subject: subject.to_string(),
                html: message.to_string(),
            };
            self.mailer.send(&email).await?;
        }

        Ok(())
    }
}
