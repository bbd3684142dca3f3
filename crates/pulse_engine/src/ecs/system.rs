//! System trait and registration handles

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use bitflags::bitflags;

use super::{Query, QueryResults};

/// Unique identifier for registered systems.
///
/// Assigned by the engine at registration and used as the key for the
/// per-system entity index, so two systems with equal queries are always
/// indexed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub u64);

bitflags! {
    /// The lifecycle phases a system participates in.
    ///
    /// The scene only invokes a callback whose flag is set; the corresponding
    /// trait methods default to no-ops, so a system declares its phases once
    /// and implements only those.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Phases: u8 {
        /// Per-frame variable-step update.
        const UPDATE = 1 << 0;
        /// Fixed-step simulation update.
        const FIXED_UPDATE = 1 << 1;
        /// Per-frame draw.
        const DRAW = 1 << 2;
    }
}

/// Timing payload for update and fixed-update dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateEvent {
    /// Elapsed time for this step, in the time units supplied to the engine
    /// (milliseconds under the default 60 fps fixed step).
    pub dt: f64,
}

/// A dispatch target over a fixed component query.
///
/// Systems are stateless with respect to entity storage: each callback
/// receives the pre-indexed [`QueryResults`] for this system's query and
/// mutates component state through the cells it finds there. `R` is the
/// opaque renderer type threaded through [`draw`](Self::draw) untouched.
pub trait System<R = ()>: Any {
    /// The component types this system requires, in the order its callbacks
    /// expect them.
    fn query(&self) -> &Query;

    /// The phases this system participates in.
    fn phases(&self) -> Phases;

    /// Called once when the system is registered with an engine.
    fn attach(&mut self, _id: SystemId) {}

    /// Variable-step update over the matched entities.
    fn update(&mut self, _entities: &QueryResults, _ev: &UpdateEvent) {}

    /// Fixed-step update over the matched entities.
    fn fixed_update(&mut self, _entities: &QueryResults, _ev: &UpdateEvent) {}

    /// Draw pass over the matched entities.
    fn draw(&mut self, _entities: &QueryResults, _renderer: &mut R) {}
}

/// Shared ownership of a registered system.
pub type SharedSystem<R> = Rc<RefCell<dyn System<R>>>;

/// Wrap a system for shared registration.
pub fn shared<R, S>(system: S) -> SharedSystem<R>
where
    R: 'static,
    S: System<R> + 'static,
{
    Rc::new(RefCell::new(system))
}

/// A registered system with its engine-assigned identity.
///
/// The query and phase set are snapshotted at registration; the index and the
/// scene dispatch loop consult the snapshot, never the live system.
pub struct SystemHandle<R> {
    /// Registration identity, index key for this system's entity set.
    pub id: SystemId,
    /// Snapshot of the system's query at registration.
    pub query: Query,
    /// Snapshot of the system's phase set at registration.
    pub phases: Phases,
    /// The system itself.
    pub system: SharedSystem<R>,
}

impl<R> Clone for SystemHandle<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            query: self.query.clone(),
            phases: self.phases,
            system: Rc::clone(&self.system),
        }
    }
}

impl<R: 'static> SystemHandle<R> {
    /// Whether the registered system's concrete type is `S`.
    pub fn is<S: System<R>>(&self) -> bool {
        let system = self.system.borrow();
        let any: &dyn Any = &*system;
        any.is::<S>()
    }

    /// Borrow the system as its concrete type.
    pub fn borrow<S: System<R>>(&self) -> Option<Ref<'_, S>> {
        Ref::filter_map(self.system.borrow(), |system| {
            let any: &dyn Any = system;
            any.downcast_ref::<S>()
        })
        .ok()
    }

    /// Mutably borrow the system as its concrete type.
    pub fn borrow_mut<S: System<R>>(&self) -> Option<RefMut<'_, S>> {
        RefMut::filter_map(self.system.borrow_mut(), |system| {
            let any: &mut dyn Any = system;
            any.downcast_mut::<S>()
        })
        .ok()
    }
}

impl<R> std::fmt::Debug for SystemHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemHandle")
            .field("id", &self.id)
            .field("query", &self.query)
            .field("phases", &self.phases)
            .finish_non_exhaustive()
    }
}
