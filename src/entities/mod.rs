// Entity Models
//
// Six kinds share one identity scheme (see base.rs):
// - Stable identity (UUID) that NEVER changes
// - created_at / updated_at timestamps
// - Flat foreign keys by id, no cascading
//
// `Entity` is the closed tagged union over the six kinds. Its serde form is
// the persisted record: a flat map with a `__class__` discriminator.

pub mod amenity;
pub mod base;
pub mod city;
pub mod fields;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::Amenity;
pub use base::Base;
pub use city::City;
pub use fields::Payload;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// KIND
// ============================================================================

/// Discriminator over the recognized entity kinds (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    State,
    City,
    Amenity,
    User,
    Place,
    Review,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Amenity,
        Kind::City,
        Kind::Place,
        Kind::Review,
        Kind::State,
        Kind::User,
    ];

    /// Name used as the `__class__` discriminator
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::State => "State",
            Kind::City => "City",
            Kind::Amenity => "Amenity",
            Kind::User => "User",
            Kind::Place => "Place",
            Kind::Review => "Review",
        }
    }

    /// Plural collection name (used by stats and routes)
    pub fn collection(&self) -> &'static str {
        match self {
            Kind::State => "states",
            Kind::City => "cities",
            Kind::Amenity => "amenities",
            Kind::User => "users",
            Kind::Place => "places",
            Kind::Review => "reviews",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

// ============================================================================
// FOREIGN KEYS
// ============================================================================

/// Id-valued attributes that point at a parent entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKey {
    StateId,
    CityId,
    PlaceId,
    UserId,
}

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    State(State),
    City(City),
    Amenity(Amenity),
    User(User),
    Place(Place),
    Review(Review),
}

impl Entity {
    pub fn kind(&self) -> Kind {
        match self {
            Entity::State(_) => Kind::State,
            Entity::City(_) => Kind::City,
            Entity::Amenity(_) => Kind::Amenity,
            Entity::User(_) => Kind::User,
            Entity::Place(_) => Kind::Place,
            Entity::Review(_) => Kind::Review,
        }
    }

    pub fn base(&self) -> &Base {
        match self {
            Entity::State(e) => &e.base,
            Entity::City(e) => &e.base,
            Entity::Amenity(e) => &e.base,
            Entity::User(e) => &e.base,
            Entity::Place(e) => &e.base,
            Entity::Review(e) => &e.base,
        }
    }

    fn base_mut(&mut self) -> &mut Base {
        match self {
            Entity::State(e) => &mut e.base,
            Entity::City(e) => &mut e.base,
            Entity::Amenity(e) => &mut e.base,
            Entity::User(e) => &mut e.base,
            Entity::Place(e) => &mut e.base,
            Entity::Review(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.base().created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.base().updated_at
    }

    /// Refresh `updated_at` (done by the registry on every save)
    pub fn touch(&mut self) {
        self.base_mut().touch();
    }

    /// Value of a foreign-key attribute, if this kind carries it
    pub fn foreign_key(&self, key: ForeignKey) -> Option<&str> {
        match (self, key) {
            (Entity::City(c), ForeignKey::StateId) => Some(c.state_id.as_str()),
            (Entity::Place(p), ForeignKey::CityId) => Some(p.city_id.as_str()),
            (Entity::Place(p), ForeignKey::UserId) => Some(p.user_id.as_str()),
            (Entity::Review(r), ForeignKey::PlaceId) => Some(r.place_id.as_str()),
            (Entity::Review(r), ForeignKey::UserId) => Some(r.user_id.as_str()),
            _ => None,
        }
    }

    /// Apply an update payload through the kind's allow-list.
    /// `id`, `created_at`, `updated_at` and creation-time references are
    /// never touched; unknown keys are ignored.
    pub fn apply_update(&mut self, payload: &Payload) -> Result<()> {
        match self {
            Entity::State(e) => e.apply_update(payload),
            Entity::City(e) => e.apply_update(payload),
            Entity::Amenity(e) => e.apply_update(payload),
            Entity::User(e) => e.apply_update(payload),
            Entity::Place(e) => e.apply_update(payload),
            Entity::Review(e) => e.apply_update(payload),
        }
    }

    pub fn as_place(&self) -> Option<&Place> {
        match self {
            Entity::Place(p) => Some(p),
            _ => None,
        }
    }

    /// Persisted record form (includes every field)
    pub fn to_record(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Client-facing form: the record minus secrets
    pub fn to_public_json(&self) -> Result<serde_json::Value> {
        let mut value = self.to_record()?;
        if let (Entity::User(_), Some(map)) = (self, value.as_object_mut()) {
            map.remove("password");
        }
        Ok(value)
    }
}

impl From<State> for Entity {
    fn from(e: State) -> Self {
        Entity::State(e)
    }
}

impl From<City> for Entity {
    fn from(e: City) -> Self {
        Entity::City(e)
    }
}

impl From<Amenity> for Entity {
    fn from(e: Amenity) -> Self {
        Entity::Amenity(e)
    }
}

impl From<User> for Entity {
    fn from(e: User) -> Self {
        Entity::User(e)
    }
}

impl From<Place> for Entity {
    fn from(e: Place) -> Self {
        Entity::Place(e)
    }
}

impl From<Review> for Entity {
    fn from(e: Review) -> Self {
        Entity::Review(e)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(kind.as_str().parse::<Kind>().unwrap(), kind);
        }

        assert!(matches!("BaseModel".parse::<Kind>(), Err(Error::UnknownKind(_))));
        assert!("state".parse::<Kind>().is_err());
    }

    #[test]
    fn test_record_is_flat_with_discriminator() {
        let city: Entity = City::new("state-1".to_string(), "Portland".to_string()).into();
        let record = city.to_record().unwrap();

        assert_eq!(record["__class__"], "City");
        assert_eq!(record["id"], json!(city.id()));
        assert_eq!(record["state_id"], "state-1");
        assert_eq!(record["name"], "Portland");
        assert!(record["created_at"].is_string());
        assert!(record["updated_at"].is_string());
        assert!(record.get("base").is_none());
    }

    #[test]
    fn test_record_reconstructs_kind() {
        let place: Entity = Place::new(
            "city-1".to_string(),
            "user-1".to_string(),
            "Loft".to_string(),
        )
        .into();

        let record = place.to_record().unwrap();
        let back: Entity = serde_json::from_value(record).unwrap();

        assert_eq!(back.kind(), Kind::Place);
        assert_eq!(back, place);
    }

    #[test]
    fn test_record_fills_missing_attributes() {
        let record = json!({
            "__class__": "Place",
            "id": "p-1",
            "created_at": "2017-03-25T02:17:06",
            "updated_at": "2017-03-25T02:17:06.000001",
            "name": "Loft"
        });

        let entity: Entity = serde_json::from_value(record).unwrap();
        let place = entity.as_place().unwrap();

        assert_eq!(place.name, "Loft");
        assert!(place.amenities_id.is_empty());
        assert!(entity.updated_at() > entity.created_at());
    }

    #[test]
    fn test_foreign_keys() {
        let review: Entity = Review::new(
            "place-1".to_string(),
            "user-1".to_string(),
            "Nice".to_string(),
        )
        .into();

        assert_eq!(review.foreign_key(ForeignKey::PlaceId), Some("place-1"));
        assert_eq!(review.foreign_key(ForeignKey::UserId), Some("user-1"));
        assert_eq!(review.foreign_key(ForeignKey::CityId), None);
    }

    #[test]
    fn test_public_json_hides_password() {
        let user: Entity = User::new("a@example.com".to_string(), "secret".to_string()).into();

        let public = user.to_public_json().unwrap();
        assert!(public.get("password").is_none());
        assert_eq!(public["email"], "a@example.com");

        let record = user.to_record().unwrap();
        assert_eq!(record["password"], "secret");
    }
}
