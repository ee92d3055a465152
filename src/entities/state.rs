// 🗺️ State Entity - top of the location hierarchy (State → City → Place)

use super::base::Base;
use super::fields::{self, Payload};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub name: String,
}

impl State {
    pub fn new(name: String) -> Self {
        State {
            base: Base::new(),
            name,
        }
    }

    /// Build from a creation payload. Requires `name`.
    pub fn from_payload(payload: &Payload) -> Result<Self> {
        Ok(State::new(fields::required_string(payload, "name")?))
    }

    /// Apply an update payload. Mutable: `name`.
    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            if key == "name" {
                self.name = fields::string(key, value)?;
            }
        }
        Ok(())
    }
}
