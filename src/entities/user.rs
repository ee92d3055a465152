// 👤 User Entity - owns places, authors reviews

use super::base::Base;
use super::fields::{self, Payload};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: Base,

    /// Login identity, fixed at creation
    #[serde(default)]
    pub email: String,

    /// Stored as supplied; never rendered in API responses
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,
}

impl User {
    pub fn new(email: String, password: String) -> Self {
        User {
            base: Base::new(),
            email,
            password,
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    /// Requires `email` then `password`; names are optional.
    pub fn from_payload(payload: &Payload) -> Result<Self> {
        let email = fields::required_string(payload, "email")?;
        let password = fields::required_string(payload, "password")?;

        let mut user = User::new(email, password);
        if let Some(first) = fields::optional_string(payload, "first_name")? {
            user.first_name = first;
        }
        if let Some(last) = fields::optional_string(payload, "last_name")? {
            user.last_name = last;
        }
        Ok(user)
    }

    /// Mutable: `password`, `first_name`, `last_name`. `email` is immutable.
    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            match key.as_str() {
                "password" => self.password = fields::string(key, value)?,
                "first_name" => self.first_name = fields::string(key, value)?,
                "last_name" => self.last_name = fields::string(key, value)?,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_requires_email_before_password() {
        let none = json!({});
        let err = User::from_payload(none.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Missing email");

        let email_only = json!({"email": "susan@example.com"});
        let err = User::from_payload(email_only.as_object().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "Missing password");
    }

    #[test]
    fn test_user_optional_names() {
        let payload = json!({
            "email": "susan@example.com",
            "password": "pwd",
            "first_name": "Susan"
        });
        let user = User::from_payload(payload.as_object().unwrap()).unwrap();

        assert_eq!(user.first_name, "Susan");
        assert_eq!(user.last_name, "");
    }

    #[test]
    fn test_user_email_is_immutable() {
        let mut user = User::new("a@example.com".to_string(), "pwd".to_string());
        let payload = json!({"email": "b@example.com", "last_name": "Finney"});

        user.apply_update(payload.as_object().unwrap()).unwrap();

        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.last_name, "Finney");
    }
}
