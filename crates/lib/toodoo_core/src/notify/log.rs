//! Notifier that only logs rendered mails.

use async_trait::async_trait;
use tracing::info;

use super::templates::{render_invitation, render_removal};
use super::{Invitation, Notifier, NotifyError, RemovalNotice};

/// Logs each notification instead of delivering it. Used when no SMTP
/// server is configured.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    frontend_url: String,
}

impl LogNotifier {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError> {
        let mail = render_invitation(invitation, &self.frontend_url);
        info!(to = %mail.to, subject = %mail.subject, list_id = %invitation.list.id, "invitation (not delivered)");
        Ok(())
    }

    async fn send_removal_notice(&self, notice: &RemovalNotice) -> Result<(), NotifyError> {
        let mail = render_removal(notice);
        info!(to = %mail.to, subject = %mail.subject, list_id = %notice.list.id, "removal notice (not delivered)");
        Ok(())
    }
}
