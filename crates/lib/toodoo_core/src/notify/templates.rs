//! Plain-text mail bodies.

use super::{Invitation, MailMessage, RemovalNotice};
use crate::models::ParticipantRole;

const APP_NAME: &str = "Toodoo";

/// Link a participant follows to open a list.
pub fn list_link(frontend_url: &str, hash: &str) -> String {
    format!("{}/todo-list/{hash}", frontend_url.trim_end_matches('/'))
}

/// Render an invitation. The list creator gets a welcome variant.
pub fn render_invitation(invitation: &Invitation, frontend_url: &str) -> MailMessage {
    let link = list_link(frontend_url, &invitation.hash);
    let participant = &invitation.participant;
    let list = &invitation.list;

    let (subject, intro) = match invitation.role {
        ParticipantRole::Creator => (
            format!("Your todo list \"{}\" is ready", list.name),
            format!(
                "We are glad you have decided to join us! Have the best on {APP_NAME} collaborating!\n\n\
                 You can access your todo list \"{}\" at the link below.",
                list.name
            ),
        ),
        ParticipantRole::Participant => (
            format!("{} invited you to \"{}\"", invitation.inviting.name, list.name),
            format!(
                "{} has invited you to collaborate in the \"{}\" todo list. \
                 If you agree, follow the link below.",
                invitation.inviting.name, list.name
            ),
        ),
    };

    MailMessage {
        to: participant.email.clone(),
        subject,
        body: format!(
            "Welcome to {APP_NAME}!\n\nHello {}!\n\n{intro}\n\n{link}\n\nThanks,\n{APP_NAME}\n",
            participant.name
        ),
    }
}

/// Render a list removal notice.
pub fn render_removal(notice: &RemovalNotice) -> MailMessage {
    MailMessage {
        to: notice.participant.email.clone(),
        subject: format!("\"{}\" was removed", notice.list.name),
        body: format!(
            "Hello {}!\n\n{} has removed the \"{}\" todo list. \
             Its items are no longer available.\n\nThanks,\n{APP_NAME}\n",
            notice.participant.name, notice.removed_by.name, notice.list.name
        ),
    }
}
