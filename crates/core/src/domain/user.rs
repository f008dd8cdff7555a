// User Profile & Session Domain Model

use crate::domain::error::DomainError;
use crate::domain::StaffId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User ID (UUID v4)
pub type UserId = String;

/// Profile role stored alongside the credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Authentication identity plus profile (one row in `users`)
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// `None` when the identity exists without a profile role
    pub role: Option<Role>,
    pub password_hash: String,
    pub created_at: i64, // epoch ms
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

/// Admin identity carried by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

/// Staff identity carried by a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub staff_id: StaffId,
    pub name: String,
    pub department: String,
}

/// Who is calling. Each kind carries only what its role needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Session {
    Admin(AdminIdentity),
    Staff(StaffIdentity),
    Anonymous,
}

impl Session {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }

    /// Admin identity, or `None` for any other session kind
    pub fn admin(&self) -> Option<&AdminIdentity> {
        match self {
            Session::Admin(identity) => Some(identity),
            _ => None,
        }
    }

    /// Staff identity, or `None` for any other session kind
    pub fn staff(&self) -> Option<&StaffIdentity> {
        match self {
            Session::Staff(identity) => Some(identity),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> String {
        match self {
            Session::Admin(a) => format!("admin:{}", a.user_id),
            Session::Staff(s) => format!("staff:{}", s.staff_id),
            Session::Anonymous => "anonymous".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_serializes_as_tagged_union() {
        let session = Session::Staff(StaffIdentity {
            staff_id: "s-1".to_string(),
            name: "Grace".to_string(),
            department: "CS".to_string(),
        });
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["kind"], "staff");
        assert_eq!(json["staff_id"], "s-1");

        let anon = serde_json::to_value(Session::Anonymous).unwrap();
        assert_eq!(anon["kind"], "anonymous");
    }

    #[test]
    fn test_session_accessors() {
        let admin = Session::Admin(AdminIdentity {
            user_id: "u-1".to_string(),
            email: "a@uni.edu".to_string(),
            name: "Alan".to_string(),
        });
        assert!(admin.admin().is_some());
        assert!(admin.staff().is_none());
        assert_eq!(admin.label(), "admin:u-1");
        assert!(Session::Anonymous.is_anonymous());
    }
}
