//! Mail notifications for invitations and list removal.
//!
//! Notifications are best-effort: they are sent after the membership change
//! has committed and a failure never undoes it.

pub mod log;
pub mod memory;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ParticipantRole, TodoList, User};

pub use self::log::LogNotifier;
pub use self::memory::{MemoryNotifier, SentMail};
pub use self::smtp::{SmtpNotifier, SmtpSettings};

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Message build error: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Invitation to collaborate on a list, sent to a newly attached member.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub list: TodoList,
    pub participant: User,
    pub role: ParticipantRole,
    /// Plaintext access hash for the participant's link.
    pub hash: String,
    pub inviting: User,
}

/// Notice that a list a user participated in was removed.
#[derive(Debug, Clone)]
pub struct RemovalNotice {
    pub list: TodoList,
    pub participant: User,
    pub removed_by: User,
}

/// A rendered mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invitation(&self, invitation: &Invitation) -> Result<(), NotifyError>;

    async fn send_removal_notice(&self, notice: &RemovalNotice) -> Result<(), NotifyError>;
}
