use serde::{Deserialize, Serialize};

/// A locally cached, already authenticated identity.
///
/// Accounts are keyed by email: two accounts with the same email are the same
/// identity, and the newer one replaces the older.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique key of the account.
    pub email: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Bearer token attached to requests made as this account.
    pub token: String,

    /// Avatar URL, if the account has one.
    #[serde(rename = "profilePic", default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
}

impl Account {
    /// Creates an account without a profile picture.
    pub fn new(email: impl Into<String>, name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            token: token.into(),
            profile_pic: None,
        }
    }

    /// Sets the profile picture.
    pub fn with_profile_pic(mut self, profile_pic: impl Into<String>) -> Self {
        self.profile_pic = Some(profile_pic.into());
        self
    }
}
