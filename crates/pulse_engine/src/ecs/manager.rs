//! Per-scene entity storage and query indexing

use std::collections::HashMap;

use super::{Entity, Query, QueryResults, SystemId};

/// Maintains a scene's entity set and its incrementally updated query index.
///
/// For every registered system the manager keeps the subset of entities
/// holding all of that system's required component types, each mapped to its
/// matched component instances in query order. The index is keyed by
/// [`SystemId`], so equal-but-distinct queries never share an entry.
///
/// Index entries are synchronized only by [`add_entity`](Self::add_entity),
/// [`remove_entity`](Self::remove_entity) and the explicit
/// [`refresh_entity`](Self::refresh_entity): adding or removing components on
/// an entity that is already present does *not* re-evaluate its rows, and a
/// stale row keeps handing out the component instances captured when it was
/// built. Callers that mutate component sets mid-scene re-add or refresh the
/// entity to resynchronize.
pub struct EntityManager {
    all: Vec<Entity>,
    queries: Vec<(SystemId, Query)>,
    by_query: HashMap<SystemId, QueryResults>,
}

impl EntityManager {
    /// Create a manager indexing the given system queries.
    pub fn new(queries: Vec<(SystemId, Query)>) -> Self {
        let by_query = queries
            .iter()
            .map(|(id, _)| (*id, QueryResults::default()))
            .collect();
        Self {
            all: Vec::new(),
            queries,
            by_query,
        }
    }

    /// Insert an entity and synchronize every query index entry for it.
    ///
    /// Re-adding a present entity is allowed and acts as a refresh.
    pub fn add_entity(&mut self, entity: &Entity) {
        if !self.contains(entity) {
            self.all.push(entity.clone());
        }
        self.refresh_entity(entity);
    }

    /// Remove an entity from the full set and from every query index.
    ///
    /// Removing an absent entity is a no-op.
    pub fn remove_entity(&mut self, entity: &Entity) {
        self.all.retain(|e| e != entity);
        for results in self.by_query.values_mut() {
            results.remove(entity);
        }
    }

    /// Re-evaluate every query against `entity`, inserting rows where it now
    /// matches and dropping rows where it no longer does.
    pub fn refresh_entity(&mut self, entity: &Entity) {
        for (id, query) in &self.queries {
            let results = match self.by_query.get_mut(id) {
                Some(results) => results,
                None => continue,
            };
            match query.matches(entity) {
                Some(components) => results.insert(entity.clone(), components),
                None => {
                    results.remove(entity);
                }
            }
        }
    }

    /// The indexed result set for a system, if the system was registered when
    /// this manager was built.
    pub fn results(&self, id: SystemId) -> Option<&QueryResults> {
        self.by_query.get(&id)
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.all
    }

    /// Whether the manager holds `entity`.
    pub fn contains(&self, entity: &Entity) -> bool {
        self.all.iter().any(|e| e == entity)
    }

    /// Number of entities in the full set.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Whether the full set is empty.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
