use serde::{Deserialize, Serialize};

/// Two-role system. Compared by value; authorization is a single
/// predicate over (role, ownership).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    /// Unknown values fall back to Member rather than erroring; the
    /// column is constrained to the two known values at write time.
    pub fn parse(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            _ => Role::Member,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub nickname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub user_id: Option<i64>,
    pub state: ImageState,
    pub created_at: String,
}

/// An image is `Active` while it is the user's current profile image;
/// replaced or orphaned images are `Pending` until the cleanup sweep
/// removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageState {
    Active,
    Pending,
}

impl ImageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageState::Active => "active",
            ImageState::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> ImageState {
        match s {
            "active" => ImageState::Active,
            _ => ImageState::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!(Role::parse(Role::Admin.as_str()), Role::Admin);
        assert_eq!(Role::parse(Role::Member.as_str()), Role::Member);
    }

    #[test]
    fn unknown_role_defaults_to_member() {
        assert_eq!(Role::parse("superuser"), Role::Member);
    }

    #[test]
    fn user_serialization_skips_password_hash() {
        let user = User {
            id: 1,
            nickname: "alice".into(),
            password_hash: "secret".into(),
            role: Role::Member,
            created_at: "2024-01-01 00:00:00".into(),
            updated_at: "2024-01-01 00:00:00".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("alice"));
    }
}
