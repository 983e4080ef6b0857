use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::email::{EmailError, OutgoingEmail, SendEmail};

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    pub fn with_credentials(
        username: &str,
        password: &str,
        smtp_address: &str,
        max_connections: u32,
        idle_timeout: Duration,
    ) -> Result<Self, EmailError> {
        let credentials = Credentials::new(String::from(username), String::from(password));
        let pool_config = PoolConfig::new()
            .max_size(max_connections)
            .idle_timeout(idle_timeout);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_address)
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))?
            .credentials(credentials)
            .pool_config(pool_config)
            .build();

        Ok(Self { transport })
    }

    pub async fn test_connection(&self) -> Result<bool, EmailError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl SendEmail for SmtpSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(email.from)
            .reply_to(email.reply_to)
            .to(email.to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(EmailError::InvalidMessage)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::FailedToSend(e.to_string()))?;

        Ok(())
    }
}
