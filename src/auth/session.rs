use serde::{Deserialize, Serialize};

use super::account::Account;

/// Identity id shared by every guest episode.
pub const GUEST_ID: &str = "guest";
pub const GUEST_NAME: &str = "Гость";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Guest,
}

/// The active identity, persisted at `currentUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Session {
    pub fn guest() -> Self {
        Session {
            id: GUEST_ID.to_string(),
            username: GUEST_NAME.to_string(),
            email: None,
            role: Role::Guest,
        }
    }

    pub fn for_account(account: &Account) -> Self {
        Session {
            id: account.id.clone(),
            username: account.username.clone(),
            email: account.email.clone(),
            role: Role::User,
        }
    }

    /// Guest status follows the id; a stored record with id `guest` is a guest
    /// whatever its role field says.
    pub fn is_guest(&self) -> bool {
        self.id == GUEST_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_record_shape() {
        let json = serde_json::to_value(Session::guest()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "guest", "username": "Гость", "email": null, "role": "guest"})
        );
    }

    #[test]
    fn guest_is_keyed_by_id() {
        let s: Session =
            serde_json::from_str(r#"{"id":"guest","username":"x","email":null}"#).unwrap();
        assert_eq!(s.role, Role::User);
        assert!(s.is_guest());
    }
}
