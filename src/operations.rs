// 🧾 Operations - the contract the transport layer calls into
//
// Validated creation, allow-listed updates, parent checks and amenity
// links, all as registry methods returning typed errors. Every successful
// mutation goes through `save`/`delete`, so the store is flushed before the
// caller sees the result.

use crate::entities::{Amenity, City, Entity, Kind, Payload, Place, Review, State, User};
use crate::registry::ObjectRegistry;
use crate::{Error, Result};
use std::collections::BTreeMap;

impl ObjectRegistry {
    /// Like `lookup`, but absence is a `NotFound` error
    pub fn fetch(&self, kind: Kind, id: &str) -> Result<&Entity> {
        self.lookup(kind, id).ok_or_else(|| Error::not_found(kind, id))
    }

    fn require(&self, kind: Kind, id: &str) -> Result<()> {
        self.fetch(kind, id).map(|_| ())
    }

    // ========================================================================
    // CREATE
    // ========================================================================

    /// Create a top-level entity (State, Amenity, User).
    ///
    /// Nested kinds need their parent and go through the dedicated methods.
    pub fn create(&mut self, kind: Kind, payload: &Payload) -> Result<Entity> {
        let entity: Entity = match kind {
            Kind::State => State::from_payload(payload)?.into(),
            Kind::Amenity => Amenity::from_payload(payload)?.into(),
            Kind::User => User::from_payload(payload)?.into(),
            Kind::City | Kind::Place | Kind::Review => {
                return Err(Error::MalformedInput(format!(
                    "{} must be created under its parent",
                    kind
                )))
            }
        };
        self.save(entity)
    }

    /// Create a City under an existing State.
    pub fn create_city(&mut self, state_id: &str, payload: &Payload) -> Result<Entity> {
        let city = City::from_payload(state_id, payload)?;
        self.require(Kind::State, state_id)?;
        self.save(city.into())
    }

    /// Create a Place in an existing City, owned by an existing User.
    ///
    /// Checks run in order: city, `user_id` present, user exists, `name`.
    pub fn create_place(&mut self, city_id: &str, payload: &Payload) -> Result<Entity> {
        self.require(Kind::City, city_id)?;

        let user_id = crate::entities::fields::required_string(payload, "user_id")?;
        self.require(Kind::User, &user_id)?;

        let place = Place::from_payload(city_id, payload)?;
        self.save(place.into())
    }

    /// Create a Review on an existing Place by an existing User.
    pub fn create_review(&mut self, place_id: &str, payload: &Payload) -> Result<Entity> {
        let review = Review::from_payload(place_id, payload)?;
        self.require(Kind::Place, place_id)?;
        self.require(Kind::User, &review.user_id)?;
        self.save(review.into())
    }

    // ========================================================================
    // UPDATE / DELETE
    // ========================================================================

    /// Apply an update payload through the kind's allow-list and save.
    ///
    /// The stored entity is left untouched if any field is rejected.
    pub fn update(&mut self, kind: Kind, id: &str, payload: &Payload) -> Result<Entity> {
        let mut entity = self.fetch(kind, id)?.clone();
        entity.apply_update(payload)?;
        self.save(entity)
    }

    /// Delete by kind and id. No cascading to dependents.
    pub fn remove(&mut self, kind: Kind, id: &str) -> Result<Entity> {
        let entity = self.fetch(kind, id)?.clone();
        self.delete(&entity)?;
        Ok(entity)
    }

    // ========================================================================
    // PLACE ↔ AMENITY
    // ========================================================================

    /// Link an amenity to a place. The flag is false when it was already
    /// linked (nothing is written in that case).
    pub fn link_amenity(&mut self, place_id: &str, amenity_id: &str) -> Result<(Entity, bool)> {
        let mut place = self.place(place_id)?;
        let amenity = self.fetch(Kind::Amenity, amenity_id)?.clone();

        if !place.link_amenity(amenity_id) {
            return Ok((amenity, false));
        }
        self.save(place.into())?;
        Ok((amenity, true))
    }

    /// Unlink an amenity from a place. NotFound if either is missing or the
    /// amenity was not linked.
    pub fn unlink_amenity(&mut self, place_id: &str, amenity_id: &str) -> Result<Entity> {
        let mut place = self.place(place_id)?;
        let amenity = self.fetch(Kind::Amenity, amenity_id)?.clone();

        if !place.unlink_amenity(amenity_id) {
            return Err(Error::not_found(Kind::Amenity, amenity_id));
        }
        self.save(place.into())?;
        Ok(amenity)
    }

    fn place(&self, place_id: &str) -> Result<Place> {
        match self.fetch(Kind::Place, place_id)? {
            Entity::Place(place) => Ok(place.clone()),
            _ => Err(Error::not_found(Kind::Place, place_id)),
        }
    }

    // ========================================================================
    // STATS
    // ========================================================================

    /// Count per collection name (`states`, `cities`, ...)
    pub fn stats(&self) -> BTreeMap<&'static str, usize> {
        Kind::ALL
            .into_iter()
            .map(|kind| (kind.collection(), self.count(Some(kind))))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
