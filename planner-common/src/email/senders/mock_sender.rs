use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::email::{EmailError, OutgoingEmail, SendEmail};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    pub subject: String,
    pub destination: String,
    pub reply_to: String,
    pub body: String,
}

/// Stands in for the SMTP relay when email is disabled. Keeps a copy of each message.
#[derive(Clone, Default)]
pub struct MockSender {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl SendEmail for MockSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        log::info!(
            "Email sending is disabled; dropping message \"{}\" to {}",
            email.subject,
            email.to,
        );

        let sent_email = SentEmail {
            subject: email.subject,
            destination: email.to.email.to_string(),
            reply_to: email.reply_to.email.to_string(),
            body: email.body,
        };

        match self.sent.lock() {
            Ok(mut sent) => sent.push(sent_email),
            Err(poisoned) => poisoned.into_inner().push(sent_email),
        }

        Ok(())
    }
}
