// 🧭 Relationship Resolver - derived views computed on read
//
// Walks the registry through foreign-key attributes:
// - State → Cities, City → Places, Place → Reviews (children_of)
// - Place ↔ Amenities (amenities_of)
// - place search across State → City → Place + amenity superset
//
// Nothing is cached; a dangling reference just contributes nothing.

use crate::entities::{Entity, ForeignKey, Kind};
use crate::registry::ObjectRegistry;
use serde::Deserialize;
use std::collections::HashSet;

// ============================================================================
// SEARCH FILTER
// ============================================================================

/// Body of a place search. Missing lists mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub states: Vec<String>,

    #[serde(default)]
    pub cities: Vec<String>,

    #[serde(default)]
    pub amenities: Vec<String>,
}

// ============================================================================
// RESOLVER
// ============================================================================

pub struct Resolver<'a> {
    registry: &'a ObjectRegistry,
}

/// Stable output order: oldest first, id as tie-breaker
fn ordered(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    entities
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ObjectRegistry) -> Self {
        Resolver { registry }
    }

    /// Entities of `child_kind` whose `foreign_key` equals `parent_id`.
    ///
    /// `None` when the parent itself does not exist.
    pub fn children_of(
        &self,
        parent_kind: Kind,
        parent_id: &str,
        child_kind: Kind,
        foreign_key: ForeignKey,
    ) -> Option<Vec<Entity>> {
        self.registry.lookup(parent_kind, parent_id)?;

        let children = self
            .registry
            .iter(Some(child_kind))
            .filter(|child| child.foreign_key(foreign_key) == Some(parent_id))
            .cloned()
            .collect();

        Some(ordered(children))
    }

    pub fn cities_of_state(&self, state_id: &str) -> Option<Vec<Entity>> {
        self.children_of(Kind::State, state_id, Kind::City, ForeignKey::StateId)
    }

    pub fn places_of_city(&self, city_id: &str) -> Option<Vec<Entity>> {
        self.children_of(Kind::City, city_id, Kind::Place, ForeignKey::CityId)
    }

    pub fn reviews_of_place(&self, place_id: &str) -> Option<Vec<Entity>> {
        self.children_of(Kind::Place, place_id, Kind::Review, ForeignKey::PlaceId)
    }

    /// Amenities linked to a place, in link order. Ids that no longer
    /// resolve are skipped. `None` when the place does not exist.
    pub fn amenities_of(&self, place_id: &str) -> Option<Vec<Entity>> {
        let place = self.registry.lookup(Kind::Place, place_id)?.as_place()?;

        Some(
            place
                .amenities_id
                .iter()
                .filter_map(|id| self.registry.lookup(Kind::Amenity, id))
                .cloned()
                .collect(),
        )
    }

    /// Composite place search:
    /// 1. states expand to their cities, unioned with the requested cities
    /// 2. an empty union means every place, otherwise places in the union
    /// 3. requested amenities must all be linked to the place
    pub fn search_places(&self, filter: &SearchFilter) -> Vec<Entity> {
        let mut city_ids: HashSet<&str> = filter.cities.iter().map(String::as_str).collect();

        for state_id in &filter.states {
            // Unknown states contribute no cities
            if self.registry.lookup(Kind::State, state_id).is_none() {
                continue;
            }
            city_ids.extend(
                self.registry
                    .iter(Some(Kind::City))
                    .filter(|city| city.foreign_key(ForeignKey::StateId) == Some(state_id.as_str()))
                    .map(Entity::id),
            );
        }

        let places = self
            .registry
            .iter(Some(Kind::Place))
            .filter_map(|e| e.as_place().map(|p| (e, p)))
            .filter(|(_, place)| city_ids.is_empty() || city_ids.contains(place.city_id.as_str()))
            .filter(|(_, place)| place.has_all_amenities(&filter.amenities))
            .map(|(e, _)| e.clone())
            .collect();

        ordered(places)
    }
}

// ============================================================================
// TESTS
// ============================================================================
