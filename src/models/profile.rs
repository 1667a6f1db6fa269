use serde::{Deserialize, Serialize};

/// User-facing projection of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfile {
    pub email: String,
    pub full_name: String,
}

impl CreateProfile {
    pub fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("Full name is required".into());
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("A valid email is required".into());
        }
        Ok(())
    }
}
