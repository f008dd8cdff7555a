// Staff Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff member ID (UUID v4)
pub type StaffId = String;

/// Length of a staff access code
pub const ACCESS_CODE_LEN: usize = 8;

/// Alphabet access codes are drawn from
pub const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Staff member's secret dashboard key: 8 characters, `A-Z` and `0-9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(String);

impl AccessCode {
    /// Parse user input. Surrounding whitespace is ignored and lowercase
    /// letters are accepted, since codes are read off paper and typed by hand.
    pub fn parse(input: &str) -> Result<Self> {
        let code = input.trim().to_ascii_uppercase();

        if code.len() != ACCESS_CODE_LEN {
            return Err(DomainError::InvalidAccessCode(format!(
                "expected {} characters, got {}",
                ACCESS_CODE_LEN,
                code.len()
            )));
        }
        if !code.bytes().all(|b| ACCESS_CODE_ALPHABET.contains(&b)) {
            return Err(DomainError::InvalidAccessCode(
                "only letters and digits are allowed".to_string(),
            ));
        }

        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccessCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> Self {
        code.0
    }
}

impl FromStr for AccessCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Staff Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    pub department: String,
    pub access_code: AccessCode,
    pub created_at: i64, // epoch ms
}

/// Editable profile fields of a staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffProfile {
    pub name: String,
    pub email: String,
    pub department: String,
}

impl StaffProfile {
    /// Trim every field and reject blanks
    pub fn normalized(self) -> Result<Self> {
        let profile = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department.trim().to_string(),
        };

        for (field, value) in [
            ("name", &profile.name),
            ("email", &profile.email),
            ("department", &profile.department),
        ] {
            if value.is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "{} is required",
                    field
                )));
            }
        }
        if !profile.email.contains('@') {
            return Err(DomainError::ValidationError(format!(
                "email '{}' is not a valid address",
                profile.email
            )));
        }

        Ok(profile)
    }
}

impl StaffMember {
    /// Create a staff member (ID, timestamp and code are injected)
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        profile: StaffProfile,
        access_code: AccessCode,
    ) -> Self {
        Self {
            id: id.into(),
            name: profile.name,
            email: profile.email,
            department: profile.department,
            access_code,
            created_at,
        }
    }
}
