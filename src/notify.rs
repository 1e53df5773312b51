use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound delivery of a verification code. Best effort; failures surface
/// to the caller and the client retries by logging in again.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()>;
}

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self {
            mailer,
            from: config.from.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn build_message(&self, to: &str, code: &str) -> anyhow::Result<Message> {
        let message = Message::builder()
            .from(self
                .from
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid from address: {}", self.from))?)
            .to(to
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid recipient address: {to}"))?)
            .subject("Your verification code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your verification code is: {code}\n\nIt expires in 15 minutes."
            ))?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()> {
        let message = self.build_message(to, code)?;
        // A slow relay must not hang the request past the configured bound.
        tokio::time::timeout(self.timeout, self.mailer.send(message))
            .await
            .map_err(|_| anyhow::anyhow!("smtp send timed out after {:?}", self.timeout))??;
        info!(to = %to, "verification code sent");
        Ok(())
    }
}
