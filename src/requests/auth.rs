use serde::Deserialize;

use super::{ValidationError, required};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let email = required("email", &self.email)?;
        if !email.contains('@') {
            return Err(ValidationError::Invalid {
                field: "email",
                reason: "missing @".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ValidationError::Missing("password"));
        }
        Ok(())
    }
}
