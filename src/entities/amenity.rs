// 🛁 Amenity Entity - referenced by places through `amenities_id`

use super::base::Base;
use super::fields::{self, Payload};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: Base,

    #[serde(default)]
    pub name: String,
}

impl Amenity {
    pub fn new(name: String) -> Self {
        Amenity {
            base: Base::new(),
            name,
        }
    }

    pub fn from_payload(payload: &Payload) -> Result<Self> {
        Ok(Amenity::new(fields::required_string(payload, "name")?))
    }

    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            if key == "name" {
                self.name = fields::string(key, value)?;
            }
        }
        Ok(())
    }
}
