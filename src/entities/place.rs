// 🏠 Place Entity - a rentable listing
//
// Belongs to one City and one User (owner); references any number of
// Amenities by id. Amenity ids are kept unique and in insertion order.

use super::base::Base;
use super::fields::{self, Payload};
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: Base,

    // ========================================================================
    // REFERENCES (fixed at creation)
    // ========================================================================
    #[serde(default)]
    pub city_id: String,

    #[serde(default)]
    pub user_id: String,

    // ========================================================================
    // VALUES
    // ========================================================================
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub number_rooms: u32,

    #[serde(default)]
    pub number_bathrooms: u32,

    #[serde(default)]
    pub max_guest: u32,

    #[serde(default)]
    pub price_by_night: u32,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    /// Linked Amenity ids
    #[serde(default)]
    pub amenities_id: Vec<String>,
}

impl Place {
    pub fn new(city_id: String, user_id: String, name: String) -> Self {
        Place {
            base: Base::new(),
            city_id,
            user_id,
            name,
            description: String::new(),
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: 0.0,
            longitude: 0.0,
            amenities_id: Vec::new(),
        }
    }

    /// Requires `user_id` and `name`; any mutable attribute may be given too.
    pub fn from_payload(city_id: &str, payload: &Payload) -> Result<Self> {
        let user_id = fields::required_string(payload, "user_id")?;
        let name = fields::required_string(payload, "name")?;

        let mut place = Place::new(city_id.to_string(), user_id, name);
        place.apply_update(payload)?;
        Ok(place)
    }

    /// Mutable: everything except `city_id` and `user_id`.
    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        for (key, value) in payload {
            match key.as_str() {
                "name" => self.name = fields::string(key, value)?,
                "description" => self.description = fields::string(key, value)?,
                "number_rooms" => self.number_rooms = fields::count(key, value)?,
                "number_bathrooms" => self.number_bathrooms = fields::count(key, value)?,
                "max_guest" => self.max_guest = fields::count(key, value)?,
                "price_by_night" => self.price_by_night = fields::count(key, value)?,
                "latitude" => self.latitude = fields::float(key, value)?,
                "longitude" => self.longitude = fields::float(key, value)?,
                "amenities_id" => self.amenities_id = fields::id_list(key, value)?,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn has_amenity(&self, amenity_id: &str) -> bool {
        self.amenities_id.iter().any(|id| id == amenity_id)
    }

    /// True when every requested amenity is linked (superset test).
    /// An empty request is trivially satisfied.
    pub fn has_all_amenities<S: AsRef<str>>(&self, amenity_ids: &[S]) -> bool {
        amenity_ids.iter().all(|id| self.has_amenity(id.as_ref()))
    }

    /// Link an amenity. Returns false if it was already linked.
    pub fn link_amenity(&mut self, amenity_id: &str) -> bool {
        if self.has_amenity(amenity_id) {
            return false;
        }
        self.amenities_id.push(amenity_id.to_string());
        true
    }

    /// Unlink an amenity. Returns false if it was not linked.
    pub fn unlink_amenity(&mut self, amenity_id: &str) -> bool {
        let before = self.amenities_id.len();
        self.amenities_id.retain(|id| id != amenity_id);
        self.amenities_id.len() != before
    }
}
