//! Outbound mail. The digest scheduler talks to a `MailSender`; production
//! wiring uses `SmtpMailer`.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Address,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{error, info};

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// One synchronous send per call. No queue, no retry.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Address,
    host: String,
    port: u16,
    user: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = if config.enable_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        builder = builder.port(config.port);
        if !config.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from_email.parse()?,
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone().into())
            .to(to.parse::<Address>()?.into())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        info!(
            "Sending mail via {}:{} as {} to {to}",
            self.host,
            self.port,
            mask(&self.user)
        );

        match self.transport.send(message).await {
            Ok(_) => {
                info!("Mail sent to {to}: {subject}");
                Ok(())
            }
            Err(e) => {
                error!(
                    "Mail to {to} failed via {}:{} as {}: {e}",
                    self.host,
                    self.port,
                    mask(&self.user)
                );
                Err(e.into())
            }
        }
    }
}

/// Masks a credential for logs, keeping the first and last two characters.
pub fn mask(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    match chars.len() {
        0 => String::new(),
        1 | 2 => "**".to_string(),
        n => {
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[n - 2..].iter().collect();
            format!("{head}{}{tail}", "*".repeat(n.saturating_sub(4)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_empty() {
        assert_eq!(mask(""), "");
    }

    #[test]
    fn test_mask_short() {
        assert_eq!(mask("ab"), "**");
    }

    #[test]
    fn test_mask_keeps_edges() {
        assert_eq!(mask("alice@example.com"), format!("al{}om", "*".repeat(13)));
        assert_eq!(mask("abcd"), "abcd");
    }

    #[tokio::test]
    async fn test_plain_transport_builds() {
        let config = SmtpConfig {
            host: "localhost".into(),
            port: 2525,
            enable_ssl: false,
            user: String::new(),
            password: String::new(),
            from_email: "digest@example.com".into(),
        };
        assert!(SmtpMailer::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_from_rejected() {
        let config = SmtpConfig {
            host: "localhost".into(),
            port: 2525,
            enable_ssl: false,
            user: String::new(),
            password: String::new(),
            from_email: "not an address".into(),
        };
        assert!(matches!(SmtpMailer::new(&config), Err(MailError::Address(_))));
    }
}
