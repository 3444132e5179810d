use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique among live users, compared case-sensitively.
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Attributes used to find or create a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserAttributes {
    pub fn from_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Name to store for a new user: the given one, or the part of the email
    /// before `@`.
    pub fn name_or_default(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => default_name_from_email(&self.email),
        }
    }
}

impl From<&User> for UserAttributes {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: Some(user.name.clone()),
        }
    }
}

/// Local part of an email address.
pub fn default_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}
