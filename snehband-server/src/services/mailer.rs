//! E-mail delivery

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use snehband_common::config::SmtpConfig;
use snehband_common::email::EmailContent;
use snehband_common::{Error, Result};
use tracing::{debug, info};

/// Port on which SMTP speaks TLS from the first byte
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends rendered e-mails
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<()>;
}

/// SMTP relay delivery
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| Error::Config("SMTP host is not set".to_string()))?;
        let from: Mailbox = config
            .from
            .as_deref()
            .ok_or_else(|| Error::Config("SMTP sender is not set".to_string()))?
            .parse()
            .map_err(|e| Error::Config(format!("Invalid SMTP sender: {}", e)))?;

        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| Error::Config(format!("Invalid SMTP relay {}: {}", host, e)))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        info!(host, port = config.port, "SMTP delivery enabled");
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<()> {
        let recipient: Mailbox = to
            .trim()
            .parse()
            .map_err(|e| Error::InvalidInput(format!("Invalid e-mail address {:?}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(content.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(content.html.clone())
            .map_err(|e| Error::Internal(format!("Cannot build e-mail: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::Upstream(format!("SMTP delivery failed: {}", e)))?;

        debug!(to, "E-mail sent");
        Ok(())
    }
}

/// Used when SMTP is not configured; every send fails
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _to: &str, _content: &EmailContent) -> Result<()> {
        Err(Error::Config("E-mail delivery is not configured".to_string()))
    }
}
