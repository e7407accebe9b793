//! Outgoing email over SMTP with STARTTLS.

use super::{LazyHandle, ServiceError, env_secret};
use crate::config::FileEmailConfig;
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

pub const GMAIL_SMTP_SERVER: &str = "smtp.gmail.com";

/// SMTP reply code for rejected credentials.
const SMTP_AUTH_FAILED: u16 = 535;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

#[async_trait]
pub trait MailService: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError>;
}

/// Gmail only accepts app passwords from its own accounts.
pub fn check_gmail_credentials(server: &str, username: &str, password: &str) -> Result<(), ServiceError> {
    if server != GMAIL_SMTP_SERVER {
        return Ok(());
    }
    if !username.ends_with("@gmail.com") {
        return Err(ServiceError::InvalidConfiguration(
            "When using Gmail, the SMTP username must be a Gmail address".to_string(),
        ));
    }
    if password.chars().count() != 16 {
        return Err(ServiceError::InvalidConfiguration(
            "When using Gmail, the SMTP password should be a 16-character App Password".to_string(),
        ));
    }
    Ok(())
}

/// Map a failed send to what the model should report.
///
/// Only an authentication rejection from Gmail gets the App Password hint.
fn send_failure(server: &str, status: Option<u16>, error: &dyn std::fmt::Display) -> ServiceError {
    if server == GMAIL_SMTP_SERVER && status == Some(SMTP_AUTH_FAILED) {
        ServiceError::Rejected(
            "Gmail authentication failed. Make sure you're using an App Password, not your regular Gmail password."
                .to_string(),
        )
    } else {
        ServiceError::Rejected(format!("SMTP error: {}", error))
    }
}

struct SmtpSession {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

pub struct SmtpMailer {
    server: String,
    session: LazyHandle<SmtpSession>,
}

impl SmtpMailer {
    pub fn new(config: &FileEmailConfig) -> Self {
        let config = config.clone();
        let server = config.smtp_server.clone();
        Self {
            server,
            session: LazyHandle::new(move || Self::connect(&config)),
        }
    }

    fn connect(config: &FileEmailConfig) -> Result<SmtpSession, ServiceError> {
        let username = env_secret(&config.username_env)?;
        let password = env_secret(&config.password_env)?;
        check_gmail_credentials(&config.smtp_server, &username, &password)?;

        let from: Mailbox = username
            .parse()
            .map_err(|e| ServiceError::InvalidConfiguration(format!("sender address: {}", e)))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| ServiceError::InvalidConfiguration(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(SmtpSession { transport, from })
    }
}

#[async_trait]
impl MailService for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError> {
        let session = self.session.get().await?;

        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| ServiceError::Rejected(format!("Invalid recipient: {}", e)))?;
        let content_type = if email.is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };
        let message = Message::builder()
            .from(session.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(content_type)
            .body(email.body.clone())
            .map_err(|e| ServiceError::Rejected(e.to_string()))?;

        info!(to = %email.to, html = email.is_html, "Sending email");
        session
            .transport
            .send(message)
            .await
            .map_err(|e| send_failure(&self.server, e.status().map(u16::from), &e))?;
        Ok(())
    }
}
