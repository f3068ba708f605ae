//! Account emails
//!
//! Delivery is fire-and-forget: [`dispatch`] sends on a spawned task and failures are only logged.

use async_trait::async_trait;
use flexspace_core::SmtpConfig;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Send on a background task; the caller never waits and never sees a failure.
pub fn dispatch(notifier: Arc<dyn EmailNotifier>, message: EmailMessage) {
    tokio::spawn(async move {
        let to = message.to.clone();
        let subject = message.subject.clone();
        match notifier.send(message).await {
            Ok(()) => debug!("Sent '{}' to {}", subject, to),
            Err(e) => error!("Failed to send '{}' to {}: {}", subject, to, e),
        }
    });
}

/// Renders the account emails
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    app_name: String,
    frontend_url: String,
}

impl EmailTemplates {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    pub fn password_reset(&self, to: &str, user_name: &str, token: &str) -> EmailMessage {
        let link = self.reset_link(token);
        let app = &self.app_name;
        EmailMessage {
            to: to.to_string(),
            subject: "Password reset request".to_string(),
            html: format!(
                r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <h1>Password reset request</h1>
  <p>Hello, {user_name},</p>
  <p>We received a request to reset your password. Use the button below to choose a new one:</p>
  <p><a href="{link}" style="padding: 12px 30px; background-color: #2196F3; color: white; text-decoration: none; border-radius: 5px;">Reset password</a></p>
  <p>Or paste this link into your browser:</p>
  <pre>{link}</pre>
  <p>You can also use this reset token directly:</p>
  <pre>{token}</pre>
  <p><strong>Important:</strong> this link is valid for 1 hour. If you did not request a reset, ignore this email.</p>
  <p>Regards,<br>The {app} team</p>
</body>
</html>"#
            ),
            text: format!(
                "Hello, {user_name},\n\n\
                 We received a request to reset your password. Open this link to choose a new one:\n\n\
                 {link}\n\n\
                 Or use this reset token directly:\n{token}\n\n\
                 This link is valid for 1 hour. If you did not request a reset, ignore this email.\n\n\
                 Regards,\nThe {app} team\n"
            ),
        }
    }

    pub fn password_changed(&self, to: &str, user_name: &str) -> EmailMessage {
        let app = &self.app_name;
        EmailMessage {
            to: to.to_string(),
            subject: "Password reset successful".to_string(),
            html: format!(
                r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <h1>Password reset successful</h1>
  <p>Hello, {user_name},</p>
  <p>Your {app} password was changed. All devices have been signed out.</p>
  <p>If you did not do this, contact support immediately.</p>
</body>
</html>"#
            ),
            text: format!(
                "Hello, {user_name},\n\n\
                 Your {app} password was changed. All devices have been signed out.\n\
                 If you did not do this, contact support immediately.\n"
            ),
        }
    }
}

/// SMTP delivery through lettre
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        // Port 465 speaks TLS from the first byte; anything else upgrades with STARTTLS.
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let mut builder = builder.port(config.port).timeout(Some(Duration::from_secs(15)));
        if let (Some(user), Some(pass)) = (&config.user, &config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = format!("{} <{}>", config.app_name, config.from).parse()?;
        info!("SMTP notifier configured for {}:{}", config.host, config.port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailNotifier for SmtpNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject)
            .multipart(MultiPart::alternative_plain_html(message.text, message.html))?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// Writes emails to the log instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl EmailNotifier for LogNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(to = %message.to, subject = %message.subject, "Email not sent (SMTP disabled)\n{}", message.text);
        Ok(())
    }
}

/// Keeps every message in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    /// Poll until at least `count` messages arrived or two seconds passed
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..200 {
            let sent = self.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent().await
    }
}

#[async_trait]
impl EmailNotifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// SMTP when enabled, the log otherwise
pub fn notifier_from_config(config: &SmtpConfig) -> Result<Arc<dyn EmailNotifier>, EmailError> {
    if config.enabled {
        Ok(Arc::new(SmtpNotifier::new(config)?))
    } else {
        Ok(Arc::new(LogNotifier))
    }
}
