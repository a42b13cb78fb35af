use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Cumulative correct answers across completed attempts.
    #[serde(rename = "mohsens", default)]
    pub aggregate_score: i64,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub attempt_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl User {
    /// Usernames and emails are stored lowercased and trimmed.
    pub fn new(username: &str, email: &str, password_hash: &str) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_lowercase(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            aggregate_score: 0,
            role: UserRole::User,
            attempt_ids: Vec::new(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
impl User {
    pub fn test_user(username: &str) -> Self {
        User::new(username, &format!("{}@example.com", username), "not-a-real-hash")
    }

    pub fn test_admin(username: &str) -> Self {
        let mut user = User::test_user(username);
        user.role = UserRole::Admin;
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation_normalizes_identity() {
        let user = User::new("  JohnDoe ", "John@Example.COM", "hash");

        assert_eq!(user.username, "johndoe");
        assert_eq!(user.email, "john@example.com");
        assert_eq!(user.aggregate_score, 0);
        assert_eq!(user.role, UserRole::User);
        assert!(user.attempt_ids.is_empty());
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_aggregate_score_is_stored_as_mohsens() {
        let mut user = User::test_user("alice");
        user.aggregate_score = 7;

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["mohsens"], 7);
        assert_eq!(json["role"], "user");
        assert!(json.get("aggregate_score").is_none());
    }

    #[test]
    fn test_admin_role() {
        assert!(User::test_admin("root").is_admin());
        assert!(!User::test_user("bob").is_admin());
    }
}
