use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One registered account, as stored in the `users` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "passwordHash", alias = "passwordChecksum")]
    pub password_checksum: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// Always null; kept so records stay readable by older clients.
    #[serde(default)]
    pub game_data: Option<Value>,
}

impl Account {
    pub fn new(username: &str, password: &str, email: Option<String>, now: DateTime<Utc>) -> Self {
        Account {
            id: generate_id(),
            username: username.to_string(),
            email,
            password_checksum: password_checksum(password),
            created_at: now,
            last_login: Some(now),
            game_data: None,
        }
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password_checksum == password_checksum(password)
    }
}

/// 32-bit rolling checksum of a password (`h = h * 31 + unit` over UTF-16
/// code units, wrapping), rendered as a signed decimal string.
///
/// This is NOT a password hash. It is unsalted, fast and trivially
/// reversible by brute force; it only exists so that account records stay
/// compatible with the browser version of the game. Anything beyond local
/// play would need a salted, slow hash (argon2 or similar).
pub fn password_checksum(password: &str) -> String {
    let mut h: i32 = 0;
    for unit in password.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    h.to_string()
}

/// Opaque, time-ordered account id.
pub fn generate_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_known_values() {
        assert_eq!(password_checksum(""), "0");
        assert_eq!(password_checksum("a"), "97");
        assert_eq!(password_checksum("ab"), "3105");
        // wraps into negative range
        assert!(password_checksum("a much longer password").parse::<i32>().is_ok());
        assert!(password_checksum("zzzzzzzzzz").starts_with('-'));
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn browser_record_decodes() {
        let raw = r#"{"id":"lx1abc","username":"test","email":"test@example.com",
            "passwordHash":"-1422501792","createdAt":"2024-03-01T10:00:00.000Z",
            "lastLogin":null,"gameData":null}"#;
        let acct: Account = serde_json::from_str(raw).unwrap();
        assert_eq!(acct.username, "test");
        assert!(acct.last_login.is_none());
        assert!(acct.password_matches("test123"));
        assert!(!acct.password_matches("test124"));
    }
}
