//! Component trait and instance cells

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use super::Entity;

/// A tagged unit of state attachable to an entity.
///
/// Identity is the concrete Rust type: an entity holds at most one instance
/// per component type. The lifecycle hooks are invoked by [`Entity`] when the
/// component is attached or detached — both default to no-ops.
pub trait Component: Any {
    /// Called after the component is attached to `entity`.
    fn on_add(&mut self, _entity: &Entity) {}

    /// Called after the component is detached from `entity`, including when
    /// the entity is destroyed or the component is replaced by a new instance
    /// of the same type.
    fn on_remove(&mut self, _entity: &Entity) {}
}

impl dyn Component {
    /// Borrow the component as a concrete type, if it is one.
    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }

    /// Mutably borrow the component as a concrete type, if it is one.
    pub fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
        let any: &mut dyn Any = self;
        any.downcast_mut()
    }
}

/// Shared handle to one component instance.
///
/// Cells are cloned into every query index row that matches the owning
/// entity, so a row always refers to the exact instance captured when the
/// entity was indexed — even if the entity has since dropped or replaced the
/// component. Systems mutate component state through these cells.
#[derive(Clone)]
pub struct ComponentCell {
    type_id: TypeId,
    cell: Rc<RefCell<dyn Component>>,
}

impl ComponentCell {
    /// Wrap a component instance in a shareable cell.
    pub fn new<C: Component>(component: C) -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            cell: Rc::new(RefCell::new(component)),
        }
    }

    /// The component's type tag.
    pub fn component_type(&self) -> TypeId {
        self.type_id
    }

    /// Whether the cell holds a `C`.
    pub fn is<C: Component>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    /// Borrow the instance as a `C`.
    ///
    /// Returns `None` when the cell holds a different component type.
    pub fn borrow<C: Component>(&self) -> Option<Ref<'_, C>> {
        Ref::filter_map(self.cell.borrow(), |c| c.downcast_ref::<C>()).ok()
    }

    /// Mutably borrow the instance as a `C`.
    ///
    /// Returns `None` when the cell holds a different component type.
    pub fn borrow_mut<C: Component>(&self) -> Option<RefMut<'_, C>> {
        RefMut::filter_map(self.cell.borrow_mut(), |c| c.downcast_mut::<C>()).ok()
    }

    /// Borrow the instance behind the trait, for lifecycle dispatch.
    pub(crate) fn borrow_dyn_mut(&self) -> RefMut<'_, dyn Component> {
        self.cell.borrow_mut()
    }
}

impl std::fmt::Debug for ComponentCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCell")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(u32);
    impl Component for Health {}

    struct Armor;
    impl Component for Armor {}

    #[test]
    fn typed_borrow_roundtrip() {
        let cell = ComponentCell::new(Health(10));
        assert!(cell.is::<Health>());
        assert!(!cell.is::<Armor>());

        cell.borrow_mut::<Health>().unwrap().0 = 42;
        assert_eq!(cell.borrow::<Health>().unwrap().0, 42);
    }

    #[test]
    fn mismatched_borrow_is_none() {
        let cell = ComponentCell::new(Health(10));
        assert!(cell.borrow::<Armor>().is_none());
        assert!(cell.borrow_mut::<Armor>().is_none());
    }

    #[test]
    fn clones_share_the_instance() {
        let cell = ComponentCell::new(Health(1));
        let alias = cell.clone();
        alias.borrow_mut::<Health>().unwrap().0 = 9;
        assert_eq!(cell.borrow::<Health>().unwrap().0, 9);
    }
}
