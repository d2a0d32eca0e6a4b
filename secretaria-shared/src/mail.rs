/// Outbound mail
///
/// The reset-code flow talks to a [`Notifier`]. Production uses [`Mailer`], a
/// `lettre` transport that either relays over SMTP (STARTTLS with credentials)
/// or drops `.eml` files into a directory for development. Tests use
/// [`MockNotifier`], which keeps sent messages in memory and can be told to
/// fail.
///
/// Sending is inline and never retried: a failed send surfaces to the caller.
///
/// # Example
///
/// ```no_run
/// use secretaria_shared::config::MailConfig;
/// use secretaria_shared::mail::{Mailer, Notifier};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = Mailer::new(&MailConfig::from_env()?)?;
/// mailer.send_reset_code("alice@x.com", "042917").await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Mutex;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

use crate::config::{MailConfig, MailTransportConfig};
use crate::models::password_reset::RESET_CODE_TTL_MINUTES;

/// Subject line of the reset-code message
pub const RESET_SUBJECT: &str = "Password recovery code - Secretaria AngLon";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to build mail transport: {0}")]
    Transport(String),

    #[error("Invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Failed to send message: {0}")]
    Send(String),
}

/// Delivers reset codes to users
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reset_code(&self, email: &str, code: &str) -> Result<(), MailError>;
}

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// `lettre`-backed notifier
pub struct Mailer {
    transport: MailTransport,
    from: Mailbox,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            MailTransport::Smtp(_) => "smtp",
            MailTransport::File(_) => "file",
        };
        f.debug_struct("Mailer")
            .field("transport", &transport)
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let transport = match &config.transport {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                starttls,
            } => {
                if !starttls {
                    warn!("SMTP STARTTLS is disabled, credentials travel in clear text");
                }

                let builder = if *starttls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| MailError::Transport(e.to_string()))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                };

                let mut builder = builder.port(*port);
                if !username.is_empty() {
                    builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
                }

                MailTransport::Smtp(builder.build())
            }
            MailTransportConfig::File { dir } => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    MailError::Transport(format!("create {}: {}", dir.display(), e))
                })?;
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
        };

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| MailError::Address {
                address: config.from_email.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { transport, from })
    }

    async fn send_html(&self, to_email: &str, subject: &str, body: String) -> Result<(), MailError> {
        let to = to_email.parse::<Mailbox>().map_err(|e| MailError::Address {
            address: to_email.to_string(),
            reason: e.to_string(),
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| MailError::Message(e.to_string()))?;

        match &self.transport {
            MailTransport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| MailError::Send(e.to_string()))?;
            }
            MailTransport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| MailError::Send(e.to_string()))?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn send_reset_code(&self, email: &str, code: &str) -> Result<(), MailError> {
        self.send_html(email, RESET_SUBJECT, reset_code_body(code)).await?;
        info!(to = %email, "Password reset code sent");
        Ok(())
    }
}

/// HTML body of the reset-code message
pub fn reset_code_body(code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password recovery - Secretaria AngLon</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background: #667eea; color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}
        .content {{ background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }}
        .code {{ background: #667eea; color: white; font-size: 24px; font-weight: bold; padding: 15px 30px; border-radius: 8px; text-align: center; margin: 20px 0; letter-spacing: 3px; }}
        .warning {{ background: #fff3cd; border: 1px solid #ffeaa7; color: #856404; padding: 15px; border-radius: 5px; margin: 20px 0; }}
        .footer {{ text-align: center; margin-top: 30px; color: #666; font-size: 14px; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Password recovery</h1>
        <p>Secretaria AngLon</p>
    </div>

    <div class="content">
        <p>Hello,</p>
        <p>We received a request to reset the password of your Secretaria AngLon account.</p>
        <p>Use the following code to continue:</p>

        <div class="code">{code}</div>

        <div class="warning">
            <strong>Important:</strong>
            <ul>
                <li>This code expires in {ttl} minutes</li>
                <li>Do not share this code with anyone</li>
                <li>If you did not request this change, ignore this email</li>
            </ul>
        </div>
    </div>

    <div class="footer">
        <p>This is an automated message, please do not reply.</p>
    </div>
</body>
</html>"#,
        code = code,
        ttl = RESET_CODE_TTL_MINUTES,
    )
}

/// Message captured by [`MockNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub email: String,
    pub code: String,
}

/// In-memory notifier for tests and local runs without a relay
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<SentCode>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier whose every send fails
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<SentCode> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent code sent to `email`
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|s| s.email == email)
            .map(|s| s.code)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_reset_code(&self, email: &str, code: &str) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Send("relay unavailable".to_string()));
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentCode {
                email: email.to_string(),
                code: code.to_string(),
            });
        }

        Ok(())
    }
}
