// 🏙️ City Entity - belongs to exactly one State

use super::base::Base;
use super::fields::{self, Payload};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: Base,

    /// Owning State (foreign key, fixed at creation)
    #[serde(default)]
    pub state_id: String,

    #[serde(default)]
    pub name: String,
}

impl City {
    pub fn new(state_id: String, name: String) -> Self {
        City {
            base: Base::new(),
            state_id,
            name,
        }
    }

    /// Build from a creation payload. The owning state comes from the
    /// caller, never from the payload.
    pub fn from_payload(state_id: &str, payload: &Payload) -> Result<Self> {
        let name = fields::required_string(payload, "name")?;
        Ok(City::new(state_id.to_string(), name))
    }

    /// Mutable: `name`. `state_id` is immutable.
    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            if key == "name" {
                self.name = fields::string(key, value)?;
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
    fn test_city_owner_comes_from_caller() {
        let payload = json!({"name": "Portland", "state_id": "spoofed"});
        let city = City::from_payload("state-1", payload.as_object().unwrap()).unwrap();

        assert_eq!(city.state_id, "state-1");
        assert_eq!(city.name, "Portland");
    }

    #[test]
    fn test_city_update_keeps_state() {
        let mut city = City::new("state-1".to_string(), "Portland".to_string());
        let payload = json!({"name": "Salem", "state_id": "state-2"});

        city.apply_update(payload.as_object().unwrap()).unwrap();

        assert_eq!(city.name, "Salem");
        assert_eq!(city.state_id, "state-1");
    }
}
