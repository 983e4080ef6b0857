pub mod senders;
pub mod templates;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::Address;
use std::fmt;

use crate::email::templates::ContactMessage;
use crate::validators::forms::ContactFields;

#[derive(Debug)]
pub enum EmailError {
    RelayConnectionFailed(String),
    InvalidMessage(lettre::error::Error),
    FailedToSend(String),
}

impl std::error::Error for EmailError {}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailError::RelayConnectionFailed(e) => {
                write!(f, "EmailError: Relay connection failed: {e}")
            }
            EmailError::InvalidMessage(e) => write!(f, "EmailError: Invalid message {e}"),
            EmailError::FailedToSend(e) => write!(f, "EmailError: Failed to send: {e}"),
        }
    }
}

/// Where contact form submissions are delivered.
#[derive(Clone, Debug)]
pub struct ContactRouting {
    pub from: Mailbox,
    pub reply_to: Mailbox,
    pub recipient: Mailbox,
}

/// A plain-text message ready to hand to a relay.
#[derive(Clone, Debug)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub from: Mailbox,
    pub reply_to: Mailbox,
    pub to: Mailbox,
}

impl OutgoingEmail {
    /// Renders a contact form submission for the site owner. Replies go to the
    /// visitor when their address is deliverable, otherwise to the configured
    /// reply-to address.
    pub fn contact(fields: &ContactFields, routing: &ContactRouting) -> Self {
        let reply_to = match fields.email.parse::<Address>() {
            Ok(address) => Mailbox::new(Some(fields.name.clone()), address),
            Err(_) => routing.reply_to.clone(),
        };

        Self {
            subject: ContactMessage::subject(&fields.subject),
            body: ContactMessage::generate(
                &fields.name,
                &fields.email,
                &fields.subject,
                &fields.message,
            ),
            from: routing.from.clone(),
            reply_to,
            to: routing.recipient.clone(),
        }
    }
}

#[async_trait]
pub trait SendEmail: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

pub type EmailSender = Box<dyn SendEmail>;
