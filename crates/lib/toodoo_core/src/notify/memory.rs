//! Notifier that records mails in memory.

use std::sync::Mutex;

use async_trait::async_trait;

use super::templates::{render_invitation, render_removal};
use super::{Invitation, MailMessage, Notifier, NotifyError, RemovalNotice};

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMail {
    Invitation(MailMessage),
    Removal(MailMessage),
}

impl SentMail {
    pub fn message(&self) -> &MailMessage {
        match self {
            SentMail::Invitation(m) | SentMail::Removal(m) => m,
        }
    }
}

/// Keeps every rendered mail for later inspection.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    frontend_url: String,
    sent: Mutex<Vec<SentMail>>,
}

impl MemoryNotifier {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All mails recorded so far, oldest first.
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Recipients of recorded invitations, oldest first.
    pub fn invited(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMail::Invitation(mail) => Some(mail.to),
                SentMail::Removal(_) => None,
            })
            .collect()
    }

    /// Recipients of recorded removal notices, oldest first.
    pub fn removed(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SentMail::Removal(mail) => Some(mail.to),
                SentMail::Invitation(_) => None,
            })
            .collect()
    }

    fn record(&self, mail: SentMail) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError> {
        self.record(SentMail::Invitation(render_invitation(
            invitation,
            &self.frontend_url,
        )));
        Ok(())
    }

    async fn send_removal_notice(&self, notice: &RemovalNotice) -> Result<(), NotifyError> {
        self.record(SentMail::Removal(render_removal(notice)));
        Ok(())
    }
}
