//! System queries and their indexed results

use std::any::TypeId;

use super::{Component, ComponentCell, Entity, EntityId};

/// An ordered, fixed tuple of component types a system requires.
///
/// Built once at system construction and never mutated afterwards. The order
/// of the types is the order in which matched component instances are handed
/// to the system.
///
/// ```
/// use pulse_engine::prelude::*;
///
/// let query = Query::new()
///     .with::<BodyComponent>()
///     .with::<TransformComponent>();
/// assert_eq!(query.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    types: Vec<TypeId>,
}

impl Query {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required component type.
    #[must_use]
    pub fn with<C: Component>(mut self) -> Self {
        self.types.push(TypeId::of::<C>());
        self
    }

    /// The required component types, in declaration order.
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    /// Number of required component types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the query requires no components (matches every entity).
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Match the query against an entity.
    ///
    /// Returns the entity's component instances in query order when the
    /// entity holds every required type, `None` otherwise.
    pub fn matches(&self, entity: &Entity) -> Option<Vec<ComponentCell>> {
        let mut components = Vec::with_capacity(self.types.len());
        for &type_id in &self.types {
            components.push(entity.component_by_type(type_id)?);
        }
        Some(components)
    }
}

/// The indexed result set for one system's query.
///
/// An insertion-ordered map from matching entity to its component instances
/// in query order. Rows hold cells captured when the entity was indexed;
/// re-inserting an entity replaces its row in place.
#[derive(Debug, Default)]
pub struct QueryResults {
    rows: Vec<(Entity, Vec<ComponentCell>)>,
}

impl QueryResults {
    /// Iterate rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Entity, &[ComponentCell])> {
        self.rows
            .iter()
            .map(|(entity, components)| (entity, components.as_slice()))
    }

    /// The components indexed for `entity`, if it matched.
    pub fn get(&self, entity: &Entity) -> Option<&[ComponentCell]> {
        self.row_index(entity.id())
            .map(|index| self.rows[index].1.as_slice())
    }

    /// Whether `entity` is present in this result set.
    pub fn contains(&self, entity: &Entity) -> bool {
        self.row_index(entity.id()).is_some()
    }

    /// Number of matching entities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no entity matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn insert(&mut self, entity: Entity, components: Vec<ComponentCell>) {
        match self.row_index(entity.id()) {
            Some(index) => self.rows[index] = (entity, components),
            None => self.rows.push((entity, components)),
        }
    }

    pub(crate) fn remove(&mut self, entity: &Entity) -> bool {
        match self.row_index(entity.id()) {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }

    fn row_index(&self, id: EntityId) -> Option<usize> {
        self.rows.iter().position(|(entity, _)| entity.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    impl Component for A {}
    struct B;
    impl Component for B {}

    #[test]
    fn matches_returns_components_in_query_order() {
        let entity = Entity::new("e");
        entity.add_component(B);
        entity.add_component(A);

        let query = Query::new().with::<A>().with::<B>();
        let components = query.matches(&entity).unwrap();
        assert!(components[0].is::<A>());
        assert!(components[1].is::<B>());
    }

    #[test]
    fn partial_entities_do_not_match() {
        let entity = Entity::new("e");
        entity.add_component(A);

        let query = Query::new().with::<A>().with::<B>();
        assert!(query.matches(&entity).is_none());
    }

    #[test]
    fn empty_query_matches_everything() {
        let entity = Entity::new("e");
        let components = Query::new().matches(&entity).unwrap();
        assert!(components.is_empty());
    }

    #[test]
    fn reinsert_keeps_row_position() {
        let mut results = QueryResults::default();
        let first = Entity::new("first");
        let second = Entity::new("second");
        first.add_component(A);
        second.add_component(A);

        let query = Query::new().with::<A>();
        results.insert(first.clone(), query.matches(&first).unwrap());
        results.insert(second.clone(), query.matches(&second).unwrap());
        results.insert(first.clone(), query.matches(&first).unwrap());

        let order: Vec<EntityId> = results.iter().map(|(e, _)| e.id()).collect();
        assert_eq!(order, vec![first.id(), second.id()]);
    }
}
