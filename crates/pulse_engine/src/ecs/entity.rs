//! Entity handles and records

use std::any::TypeId;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::events::Channel;

use super::{Component, ComponentCell};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Get the raw id value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Entity-scoped event channels.
///
/// Both channels carry the name of the scene the entity was inserted into or
/// removed from.
#[derive(Clone, Default)]
pub struct EntityEvents {
    /// Fired after the entity is inserted into a scene.
    pub added: Channel<String>,
    /// Fired after the entity is removed from a scene.
    pub removed: Channel<String>,
}

impl EntityEvents {
    /// Remove every registration on every channel.
    pub fn clear_all(&self) {
        self.added.clear();
        self.removed.clear();
    }
}

struct EntityRecord {
    name: String,
    components: Vec<ComponentCell>,
    scene: Option<String>,
    events: EntityEvents,
    destroyed: bool,
}

/// A typed, named container of components.
///
/// `Entity` is a cheap cloneable handle; clones share the same record.
/// Identity (equality, hashing) is the [`EntityId`] assigned at creation.
/// Entities are created through [`Engine::create_entity`] and inserted into
/// scenes, which set and clear the scene back-reference.
///
/// The component list is insertion-ordered and holds at most one instance per
/// component type: adding a type the entity already holds replaces the old
/// instance in place (firing its `on_remove` hook).
///
/// [`Engine::create_entity`]: crate::Engine::create_entity
#[derive(Clone)]
pub struct Entity {
    id: EntityId,
    record: Rc<RefCell<EntityRecord>>,
}

impl Entity {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed)),
            record: Rc::new(RefCell::new(EntityRecord {
                name: name.into(),
                components: Vec::new(),
                scene: None,
                events: EntityEvents::default(),
                destroyed: false,
            })),
        }
    }

    /// Get the entity id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the entity name
    pub fn name(&self) -> String {
        self.record.borrow().name.clone()
    }

    /// Name of the scene currently holding this entity, if any.
    pub fn scene(&self) -> Option<String> {
        self.record.borrow().scene.clone()
    }

    pub(crate) fn set_scene(&self, scene: Option<String>) {
        self.record.borrow_mut().scene = scene;
    }

    /// The entity's event channels (shared with every clone of the handle).
    pub fn events(&self) -> EntityEvents {
        self.record.borrow().events.clone()
    }

    /// Attach a component, replacing any existing instance of the same type.
    ///
    /// Returns the cell holding the new instance. The old instance, if any,
    /// receives `on_remove` before the new one receives `on_add`.
    pub fn add_component<C: Component>(&self, component: C) -> ComponentCell {
        let cell = ComponentCell::new(component);
        let replaced = {
            let mut record = self.record.borrow_mut();
            match record
                .components
                .iter()
                .position(|c| c.component_type() == cell.component_type())
            {
                Some(index) => {
                    Some(std::mem::replace(&mut record.components[index], cell.clone()))
                }
                None => {
                    record.components.push(cell.clone());
                    None
                }
            }
        };

        if let Some(old) = replaced {
            old.borrow_dyn_mut().on_remove(self);
        }
        cell.borrow_dyn_mut().on_add(self);
        cell
    }

    /// Detach the component of type `C`, firing its `on_remove` hook.
    ///
    /// Detaching an absent component is a no-op returning `false`.
    pub fn remove_component<C: Component>(&self) -> bool {
        let removed = {
            let mut record = self.record.borrow_mut();
            record
                .components
                .iter()
                .position(|c| c.is::<C>())
                .map(|index| record.components.remove(index))
        };

        match removed {
            Some(cell) => {
                cell.borrow_dyn_mut().on_remove(self);
                true
            }
            None => false,
        }
    }

    /// Get the component of type `C`, or `None` if the entity does not hold one.
    pub fn get_component<C: Component>(&self) -> Option<ComponentCell> {
        self.component_by_type(TypeId::of::<C>())
    }

    /// Get a component by type tag.
    pub fn component_by_type(&self, type_id: TypeId) -> Option<ComponentCell> {
        self.record
            .borrow()
            .components
            .iter()
            .find(|c| c.component_type() == type_id)
            .cloned()
    }

    /// Whether the entity holds a component of type `C`.
    pub fn has<C: Component>(&self) -> bool {
        self.component_by_type(TypeId::of::<C>()).is_some()
    }

    /// All attached components, in insertion order.
    pub fn components(&self) -> Vec<ComponentCell> {
        self.record.borrow().components.clone()
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.record.borrow().destroyed
    }

    /// Release entity state: detach every component (firing `on_remove`),
    /// clear the scene back-reference and drop all event listeners.
    pub fn destroy(&self) {
        let cells: Vec<ComponentCell> = {
            let mut record = self.record.borrow_mut();
            record.scene = None;
            record.destroyed = true;
            record.components.drain(..).collect()
        };
        for cell in cells {
            cell.borrow_dyn_mut().on_remove(self);
        }
        self.events().clear_all();
    }

    /// Downgrade to a handle that does not keep the entity alive.
    pub fn downgrade(&self) -> WeakEntity {
        WeakEntity {
            id: self.id,
            record: Rc::downgrade(&self.record),
        }
    }

    pub(crate) fn emit_added(&self, scene: &str) {
        self.events().added.emit(&scene.to_string());
    }

    pub(crate) fn emit_removed(&self, scene: &str) {
        self.events().removed.emit(&scene.to_string());
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.record.borrow().name)
            .finish()
    }
}

/// Non-owning entity handle.
///
/// Components that need a back-reference to their entity hold one of these so
/// the entity/component graph stays acyclic.
#[derive(Clone)]
pub struct WeakEntity {
    id: EntityId,
    record: Weak<RefCell<EntityRecord>>,
}

impl WeakEntity {
    /// The id of the entity this handle referred to.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Recover a strong handle, if the entity is still alive.
    pub fn upgrade(&self) -> Option<Entity> {
        self.record.upgrade().map(|record| Entity {
            id: self.id,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tag(&'static str);
    impl Component for Tag {}

    #[derive(Default)]
    struct Tracker {
        added: Rc<RefCell<u32>>,
        removed: Rc<RefCell<u32>>,
    }
    impl Component for Tracker {
        fn on_add(&mut self, _entity: &Entity) {
            *self.added.borrow_mut() += 1;
        }
        fn on_remove(&mut self, _entity: &Entity) {
            *self.removed.borrow_mut() += 1;
        }
    }

    struct Other;
    impl Component for Other {}

    #[test]
    fn at_most_one_instance_per_type() {
        let entity = Entity::new("player");
        entity.add_component(Tag("first"));
        entity.add_component(Other);
        entity.add_component(Tag("second"));

        let components = entity.components();
        assert_eq!(components.len(), 2);
        // Replacement keeps the original position.
        assert!(components[0].is::<Tag>());
        assert!(components[1].is::<Other>());

        let cell = entity.get_component::<Tag>().unwrap();
        assert_eq!(cell.borrow::<Tag>().unwrap().0, "second");
    }

    #[test]
    fn lifecycle_hooks_fire_on_add_remove_and_replace() {
        let added = Rc::new(RefCell::new(0));
        let removed = Rc::new(RefCell::new(0));
        let tracker = || Tracker {
            added: Rc::clone(&added),
            removed: Rc::clone(&removed),
        };

        let entity = Entity::new("npc");
        entity.add_component(tracker());
        assert_eq!((*added.borrow(), *removed.borrow()), (1, 0));

        entity.add_component(tracker());
        assert_eq!((*added.borrow(), *removed.borrow()), (2, 1));

        assert!(entity.remove_component::<Tracker>());
        assert_eq!((*added.borrow(), *removed.borrow()), (2, 2));
        assert!(!entity.remove_component::<Tracker>());
    }

    #[test]
    fn destroy_releases_components_and_listeners() {
        let removed = Rc::new(RefCell::new(0));
        let entity = Entity::new("doomed");
        entity.add_component(Tracker {
            added: Rc::new(RefCell::new(0)),
            removed: Rc::clone(&removed),
        });
        entity.events().added.on(|_| {});

        entity.destroy();

        assert!(entity.is_destroyed());
        assert!(entity.components().is_empty());
        assert!(entity.scene().is_none());
        assert_eq!(*removed.borrow(), 1);
        assert!(entity.events().added.is_empty());
    }

    #[test]
    fn weak_handles_do_not_keep_entities_alive() {
        let entity = Entity::new("ghost");
        let weak = entity.downgrade();
        assert!(weak.upgrade().is_some());

        drop(entity);
        assert!(weak.upgrade().is_none());
    }
}
