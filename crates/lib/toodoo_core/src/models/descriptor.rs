//! Participant descriptors accepted by list creation and invitation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserAttributes;

/// One way of naming a (possibly not yet existing) participant.
///
/// Deserialized untagged: a JSON string is an email, an object with an
/// `email` field is an attribute record, an object with only an `id` refers
/// to an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParticipantDescriptor {
    Email(String),
    Attributes(UserAttributes),
    UserRef { id: Uuid },
}

impl From<&str> for ParticipantDescriptor {
    fn from(email: &str) -> Self {
        Self::Email(email.to_string())
    }
}

impl From<UserAttributes> for ParticipantDescriptor {
    fn from(attrs: UserAttributes) -> Self {
        Self::Attributes(attrs)
    }
}

impl From<&super::User> for ParticipantDescriptor {
    fn from(user: &super::User) -> Self {
        Self::UserRef { id: user.id }
    }
}

/// A single value or a sequence of values.
///
/// `Many` must stay first: records also deserialize from JSON arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_each_descriptor_shape() {
        let json = serde_json::json!([
            "a@x.com",
            {"email": "b@x.com", "name": "Bee"},
            {"id": "0190f5a2-7c1e-7a3b-9d4e-2f6a8b0c1d2e"}
        ]);
        let parsed: OneOrMany<ParticipantDescriptor> = serde_json::from_value(json).unwrap();
        let descriptors = parsed.into_vec();

        assert_eq!(descriptors[0], ParticipantDescriptor::Email("a@x.com".into()));
        assert_eq!(
            descriptors[1],
            ParticipantDescriptor::Attributes(UserAttributes {
                email: "b@x.com".into(),
                name: Some("Bee".into()),
            })
        );
        assert!(matches!(descriptors[2], ParticipantDescriptor::UserRef { .. }));
    }

    #[test]
    fn single_value_becomes_one_element() {
        let parsed: OneOrMany<ParticipantDescriptor> =
            serde_json::from_value(serde_json::json!("solo@x.com")).unwrap();
        assert_eq!(1, parsed.into_vec().len());
    }

    #[test]
    fn pair_of_emails_is_two_descriptors() {
        let parsed: OneOrMany<ParticipantDescriptor> =
            serde_json::from_value(serde_json::json!(["a@x.com", "b@x.com"])).unwrap();
        assert_eq!(
            vec![
                ParticipantDescriptor::from("a@x.com"),
                ParticipantDescriptor::from("b@x.com"),
            ],
            parsed.into_vec()
        );
    }

    #[test]
    fn user_snapshot_with_email_is_an_attribute_record() {
        let parsed: ParticipantDescriptor = serde_json::from_value(serde_json::json!({
            "id": "0190f5a2-7c1e-7a3b-9d4e-2f6a8b0c1d2e",
            "email": "c@x.com",
            "name": "Cee"
        }))
        .unwrap();
        assert!(matches!(parsed, ParticipantDescriptor::Attributes(_)));
    }
}
