//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

use super::templates::{render_invitation, render_removal};
use super::{Invitation, MailMessage, Notifier, NotifyError, RemovalNotice};

/// Connection settings for the outbound mail relay.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `Toodoo <noreply@example.com>`.
    pub from: String,
}

/// Delivers notifications through a STARTTLS relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    frontend_url: String,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings, frontend_url: impl Into<String>) -> Result<Self, NotifyError> {
        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("{}: {e}", settings.from)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(settings.port);
        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            frontend_url: frontend_url.into(),
        })
    }

    fn build(&self, mail: &MailMessage) -> Result<Message, NotifyError> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("{}: {e}", mail.to)))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    /// Build the message now and hand delivery to a background task.
    fn deliver(&self, mail: MailMessage) -> Result<(), NotifyError> {
        let message = self.build(&mail)?;
        let transport = self.transport.clone();
        tokio::spawn(async move {
            match transport.send(message).await {
                Ok(_) => debug!(to = %mail.to, subject = %mail.subject, "mail delivered"),
                Err(e) => warn!(to = %mail.to, subject = %mail.subject, "mail delivery failed: {e}"),
            }
        });
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError> {
        self.deliver(render_invitation(invitation, &self.frontend_url))
    }

    async fn send_removal_notice(&self, notice: &RemovalNotice) -> Result<(), NotifyError> {
        self.deliver(render_removal(notice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(from: &str) -> SmtpSettings {
        SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            username: None,
            password: None,
            from: from.into(),
        }
    }

    #[tokio::test]
    async fn rejects_bad_sender() {
        assert!(matches!(
            SmtpNotifier::new(&settings("not an address"), "http://app"),
            Err(NotifyError::Address(_))
        ));
    }

    #[tokio::test]
    async fn builds_plain_text_message() {
        let notifier = SmtpNotifier::new(&settings("Toodoo <noreply@x.com>"), "http://app").unwrap();
        let message = notifier
            .build(&MailMessage {
                to: "bob@x.com".into(),
                subject: "Hi".into(),
                body: "Hello".into(),
            })
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: bob@x.com"));
        assert!(raw.contains("Subject: Hi"));
    }
}
