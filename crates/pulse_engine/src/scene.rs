//! Scene lifecycle and per-system dispatch
//!
//! A scene is an isolated simulation context: it owns its entity set (via an
//! [`EntityManager`]) while sharing the engine's system pipeline. Each of the
//! three lifecycle calls emits a pre/main/post event triple and dispatches
//! every snapshot system with the pre-indexed entity set for its query.

use crate::ecs::{Entity, EntityManager, Phases, SystemHandle, UpdateEvent};
use crate::events::Channel;

/// Scene-scoped event channels.
pub struct SceneEvents<R> {
    /// Fired when the scene becomes the engine's current scene.
    pub start: Channel<()>,
    /// Fired when the scene stops being the engine's current scene.
    pub end: Channel<()>,
    /// Fired before per-system update dispatch.
    pub preupdate: Channel<UpdateEvent>,
    /// Fired at the start of the update phase.
    pub update: Channel<UpdateEvent>,
    /// Fired after per-system update dispatch.
    pub postupdate: Channel<UpdateEvent>,
    /// Fired before per-system fixed-update dispatch.
    pub prefixedupdate: Channel<UpdateEvent>,
    /// Fired at the start of the fixed-update phase.
    pub fixedupdate: Channel<UpdateEvent>,
    /// Fired after per-system fixed-update dispatch.
    pub postfixedupdate: Channel<UpdateEvent>,
    /// Fired before per-system draw dispatch.
    pub predraw: Channel<R>,
    /// Fired at the start of the draw phase.
    pub draw: Channel<R>,
    /// Fired after per-system draw dispatch.
    pub postdraw: Channel<R>,
    /// Fired after an entity is added to the scene.
    pub entityadd: Channel<Entity>,
    /// Fired after an entity is removed from the scene.
    pub entityremove: Channel<Entity>,
}

impl<R> Default for SceneEvents<R> {
    fn default() -> Self {
        Self {
            start: Channel::new(),
            end: Channel::new(),
            preupdate: Channel::new(),
            update: Channel::new(),
            postupdate: Channel::new(),
            prefixedupdate: Channel::new(),
            fixedupdate: Channel::new(),
            postfixedupdate: Channel::new(),
            predraw: Channel::new(),
            draw: Channel::new(),
            postdraw: Channel::new(),
            entityadd: Channel::new(),
            entityremove: Channel::new(),
        }
    }
}

impl<R> SceneEvents<R> {
    /// Remove every registration on every channel.
    pub fn clear_all(&self) {
        self.start.clear();
        self.end.clear();
        self.preupdate.clear();
        self.update.clear();
        self.postupdate.clear();
        self.prefixedupdate.clear();
        self.fixedupdate.clear();
        self.postfixedupdate.clear();
        self.predraw.clear();
        self.draw.clear();
        self.postdraw.clear();
        self.entityadd.clear();
        self.entityremove.clear();
    }
}

/// An isolated simulation context sharing the engine's system pipeline.
///
/// The system list is a snapshot taken when the scene is built: systems added
/// to the engine afterwards are not dispatched by this scene. While
/// [`paused`](Self::paused), every lifecycle call skips all emission and
/// dispatch.
pub struct Scene<R = ()> {
    name: String,
    /// When set, `update`/`fixed_update`/`draw` are no-ops.
    pub paused: bool,
    elapsed_time: f64,
    systems: Vec<SystemHandle<R>>,
    entities: EntityManager,
    /// Scene-scoped event channels.
    pub events: SceneEvents<R>,
}

impl<R: 'static> Scene<R> {
    pub(crate) fn new(name: impl Into<String>, systems: Vec<SystemHandle<R>>) -> Self {
        let queries = systems
            .iter()
            .map(|handle| (handle.id, handle.query.clone()))
            .collect();
        Self {
            name: name.into(),
            paused: false,
            elapsed_time: 0.0,
            systems,
            entities: EntityManager::new(queries),
            events: SceneEvents::default(),
        }
    }

    /// The scene's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated time accumulated by the update phase.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// The scene's entity storage and query index.
    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Mutable access to the scene's entity storage, for manual index
    /// refreshes after mid-scene component changes.
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// The system snapshot this scene dispatches.
    pub fn systems(&self) -> &[SystemHandle<R>] {
        &self.systems
    }

    /// Insert an entity into the scene.
    ///
    /// Sets the entity's scene back-reference, indexes it for every system
    /// query, then emits the entity-scoped `added` and the scene-scoped
    /// `entityadd` events.
    pub fn add_entity(&mut self, entity: &Entity) {
        entity.set_scene(Some(self.name.clone()));
        self.entities.add_entity(entity);
        entity.emit_added(&self.name);
        self.events.entityadd.emit(entity);
    }

    /// Remove an entity from the scene.
    ///
    /// Clears the scene back-reference, destroys the entity when `destroy` is
    /// set, de-indexes it, then emits the scene-scoped `entityremove` and the
    /// entity-scoped `removed` events. Removing an absent entity is a no-op
    /// apart from those emissions.
    pub fn remove_entity(&mut self, entity: &Entity, destroy: bool) {
        entity.set_scene(None);
        if destroy {
            entity.destroy();
        }
        self.entities.remove_entity(entity);
        self.events.entityremove.emit(entity);
        entity.emit_removed(&self.name);
    }

    /// Variable-step update: event triple plus per-system dispatch in
    /// registration order.
    pub fn update(&mut self, ev: &UpdateEvent) {
        if self.paused {
            return;
        }

        self.events.preupdate.emit(ev);
        self.events.update.emit(ev);
        self.elapsed_time += ev.dt;

        for handle in &self.systems {
            if handle.phases.contains(Phases::UPDATE) {
                if let Some(results) = self.entities.results(handle.id) {
                    handle.system.borrow_mut().update(results, ev);
                }
            }
        }

        self.events.postupdate.emit(ev);
    }

    /// Fixed-step update: event triple plus per-system dispatch in
    /// registration order.
    pub fn fixed_update(&mut self, ev: &UpdateEvent) {
        if self.paused {
            return;
        }

        self.events.prefixedupdate.emit(ev);
        self.events.fixedupdate.emit(ev);

        for handle in &self.systems {
            if handle.phases.contains(Phases::FIXED_UPDATE) {
                if let Some(results) = self.entities.results(handle.id) {
                    handle.system.borrow_mut().fixed_update(results, ev);
                }
            }
        }

        self.events.postfixedupdate.emit(ev);
    }

    /// Draw: event triple plus per-system dispatch in registration order.
    /// The renderer is threaded through untouched.
    pub fn draw(&mut self, renderer: &mut R) {
        if self.paused {
            return;
        }

        self.events.predraw.emit(renderer);
        self.events.draw.emit(renderer);

        for handle in &self.systems {
            if handle.phases.contains(Phases::DRAW) {
                if let Some(results) = self.entities.results(handle.id) {
                    handle.system.borrow_mut().draw(results, renderer);
                }
            }
        }

        self.events.postdraw.emit(renderer);
    }
}
