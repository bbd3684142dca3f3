//! Core engine implementation
//!
//! The engine owns the system pipeline, the scene registry and the
//! fixed-timestep accumulator. A host loop supplies monotonic timestamps to
//! [`Engine::update`] and a renderer to [`Engine::draw`]; the engine turns
//! variable frame time into zero or more fixed simulation steps and forwards
//! everything else to the current scene.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::config::EngineSettings;
use crate::ecs::{
    shared, Entity, SharedSystem, System, SystemHandle, SystemId, UpdateEvent,
};
use crate::events::{Channel, ListenerHandle};
use crate::scene::Scene;
use crate::systems::VerletSystem;

/// Shared ownership of a scene.
///
/// The engine borrows the cell mutably while delegating a phase to the
/// scene, so the handle is for use between phases (lifecycle listeners,
/// host code) — not from inside a scene phase listener.
pub type SharedScene<R> = Rc<RefCell<Scene<R>>>;

/// Payload of the engine's `scenechange` event.
pub struct SceneChange<R> {
    /// Registered name of the scene that became current.
    pub name: String,
    /// The newly constructed scene.
    pub scene: SharedScene<R>,
}

/// Engine-scoped event channels.
pub struct EngineEvents<R> {
    /// Fired once per [`Engine::update`] call with the frame delta.
    pub update: Channel<UpdateEvent>,
    /// Fired once per fixed step with exactly the fixed delta.
    pub fixedupdate: Channel<UpdateEvent>,
    /// Fired once per [`Engine::draw`] call.
    pub draw: Channel<R>,
    /// Fired after a scene swap completes.
    pub scenechange: Channel<SceneChange<R>>,
}

impl<R> Default for EngineEvents<R> {
    fn default() -> Self {
        Self {
            update: Channel::new(),
            fixedupdate: Channel::new(),
            draw: Channel::new(),
            scenechange: Channel::new(),
        }
    }
}

impl<R> EngineEvents<R> {
    /// Remove every registration on every channel.
    pub fn clear_all(&self) {
        self.update.clear();
        self.fixedupdate.clear();
        self.draw.clear();
        self.scenechange.clear();
    }
}

struct WaitState {
    remaining: Cell<f64>,
    done: Cell<bool>,
    cancelled: Cell<bool>,
}

/// Completion handle for a [`Timer::wait`] suspension.
///
/// The wait resolves from within a future [`Engine::update`] call, on the
/// simulation thread; a paused engine freezes it. Dropping the handle does
/// not cancel the wait — call [`cancel`](Self::cancel).
pub struct TimerHandle {
    state: Rc<WaitState>,
}

impl TimerHandle {
    /// Whether the requested duration has elapsed in simulation time.
    pub fn done(&self) -> bool {
        self.state.done.get()
    }

    /// Simulation time left before the wait resolves.
    pub fn remaining(&self) -> f64 {
        self.state.remaining.get()
    }

    /// Deregister the wait; it will never resolve.
    pub fn cancel(&self) {
        self.state.cancelled.set(true);
    }

    /// Whether the wait was cancelled.
    pub fn cancelled(&self) -> bool {
        self.state.cancelled.get()
    }
}

/// Suspensions tied to the simulation's own update cadence.
///
/// Durations count down by the raw deltas observed by [`Engine::update`], so
/// they are measured in the same units as the timestamps the host supplies —
/// not by any wall-clock timer.
#[derive(Default)]
pub struct Timer {
    waits: Vec<Rc<WaitState>>,
}

impl Timer {
    /// Register a wait resolving once cumulative update deltas reach
    /// `duration`.
    pub fn wait(&mut self, duration: f64) -> TimerHandle {
        let state = Rc::new(WaitState {
            remaining: Cell::new(duration),
            done: Cell::new(false),
            cancelled: Cell::new(false),
        });
        self.waits.push(Rc::clone(&state));
        TimerHandle { state }
    }

    /// Number of waits still pending.
    pub fn pending(&self) -> usize {
        self.waits.len()
    }

    pub(crate) fn advance(&mut self, dt: f64) {
        self.waits.retain(|state| {
            if state.cancelled.get() {
                return false;
            }
            state.remaining.set(state.remaining.get() - dt);
            if state.remaining.get() <= 0.0 {
                state.done.set(true);
                false
            } else {
                true
            }
        });
    }
}

/// Engine construction options.
pub struct EngineArgs<R = ()> {
    /// Fixed simulation rate in steps per 1000 time units (default 60).
    pub fixed_update_fps: f64,
    /// Systems to register at construction; `None` registers the default
    /// physics pipeline (a [`VerletSystem`] with default parameters).
    pub systems: Option<Vec<SharedSystem<R>>>,
}

impl<R> Default for EngineArgs<R> {
    fn default() -> Self {
        Self {
            fixed_update_fps: 60.0,
            systems: None,
        }
    }
}

impl<R: 'static> EngineArgs<R> {
    /// Build construction options from file-loadable settings.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            fixed_update_fps: settings.fixed_update_fps,
            systems: Some(vec![shared(VerletSystem::from_settings(&settings.physics))]),
        }
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A scene name was not found in the scene registry.
    #[error("scene \"{0}\" not found")]
    SceneNotFound(String),
}

type SceneBuilder<R> = Box<dyn Fn(&mut Scene<R>)>;
type EntityHook = Rc<RefCell<Box<dyn FnMut(&Entity)>>>;

/// The fixed-timestep driver.
///
/// Owns the system list shared (by snapshot) into every scene, the scene
/// registry, the current scene and the fixed-step accumulator. Everything is
/// single-threaded and synchronous: all system callbacks, event emissions and
/// entity mutations triggered by one `update`/`draw` call complete before the
/// call returns.
pub struct Engine<R = ()> {
    systems: Vec<SystemHandle<R>>,
    scenes: HashMap<String, SceneBuilder<R>>,
    current_scene: Option<SharedScene<R>>,

    /// Engine-scoped event channels.
    pub events: EngineEvents<R>,
    /// Simulation-time suspensions.
    pub timer: Timer,

    fixed_update_fps: f64,
    elapsed_time: f64,
    delta_time: f64,
    fixed_accumulator: f64,
    paused: bool,
    started: bool,

    next_system_id: u64,
    entity_add_hook: EntityHook,
    entity_remove_hook: EntityHook,
    hook_handles: Option<(ListenerHandle, ListenerHandle)>,
}

impl<R: 'static> Default for Engine<R> {
    fn default() -> Self {
        Self::new(EngineArgs::default())
    }
}

impl<R: 'static> Engine<R> {
    /// Create an engine from construction options.
    pub fn new(args: EngineArgs<R>) -> Self {
        let mut engine = Self {
            systems: Vec::new(),
            scenes: HashMap::new(),
            current_scene: None,
            events: EngineEvents::default(),
            timer: Timer::default(),
            fixed_update_fps: args.fixed_update_fps,
            elapsed_time: 0.0,
            delta_time: 0.0,
            fixed_accumulator: 0.0,
            paused: false,
            started: false,
            next_system_id: 0,
            entity_add_hook: Rc::new(RefCell::new(Box::new(|_: &Entity| {}))),
            entity_remove_hook: Rc::new(RefCell::new(Box::new(|_: &Entity| {}))),
            hook_handles: None,
        };

        let systems = args
            .systems
            .unwrap_or_else(|| vec![shared(VerletSystem::default())]);
        for system in systems {
            engine.add_shared_system(system);
        }

        log::info!(
            "engine initialized ({} systems, fixed step at {} fps)",
            engine.systems.len(),
            engine.fixed_update_fps
        );
        engine
    }

    /// Mark the engine started and switch to the named scene.
    pub fn start(&mut self, scene: &str) -> Result<(), EngineError> {
        self.started = true;
        self.goto_scene(scene)
    }

    /// Advance the simulation to `current_time`.
    ///
    /// `current_time` is monotonic, host-supplied, and in the same units as
    /// the deltas observed by listeners (conventionally milliseconds).
    /// Emits `update`, delegates the variable step to the current scene, then
    /// drains the fixed-step accumulator: each whole fixed step emits
    /// `fixedupdate` and delegates with exactly `1000 / fixed_update_fps`.
    /// Paused engines return immediately — no time advances, nothing fires.
    ///
    /// The scene stays mutably borrowed for the whole delegated phase, so
    /// listeners on *scene* phase channels must work through their payload
    /// and the entities they captured, not through a [`SharedScene`] handle.
    /// Engine-channel listeners are not under that restriction.
    pub fn update(&mut self, current_time: f64) {
        if self.paused {
            return;
        }

        self.delta_time = current_time - self.elapsed_time;
        self.elapsed_time = current_time;
        self.fixed_accumulator += self.delta_time;

        let ev = UpdateEvent { dt: self.delta_time };
        self.events.update.emit(&ev);
        self.timer.advance(ev.dt);
        if let Some(scene) = &self.current_scene {
            scene.borrow_mut().update(&ev);
        }

        let fixed_dt = 1000.0 / self.fixed_update_fps;
        while self.fixed_accumulator >= fixed_dt {
            let ev = UpdateEvent { dt: fixed_dt };
            self.events.fixedupdate.emit(&ev);
            if let Some(scene) = &self.current_scene {
                scene.borrow_mut().fixed_update(&ev);
            }
            self.fixed_accumulator -= fixed_dt;
        }
    }

    /// Emit `draw` and forward the renderer to the current scene, untouched.
    pub fn draw(&mut self, renderer: &mut R) {
        if self.paused {
            return;
        }

        self.events.draw.emit(renderer);
        if let Some(scene) = &self.current_scene {
            scene.borrow_mut().draw(renderer);
        }
    }

    /// Freeze time, events, timers and drawing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume a paused engine.
    ///
    /// The next [`update`](Self::update) measures its delta against the last
    /// timestamp seen before the pause.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the engine is paused.
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Whether [`start`](Self::start) has been called.
    pub fn started(&self) -> bool {
        self.started
    }

    /// Last timestamp supplied to [`update`](Self::update).
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Delta measured by the last [`update`](Self::update) call.
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Time currently banked toward the next fixed step.
    pub fn fixed_accumulator(&self) -> f64 {
        self.fixed_accumulator
    }

    /// The fixed simulation rate.
    pub fn fixed_update_fps(&self) -> f64 {
        self.fixed_update_fps
    }

    /// Register a system, assigning its [`SystemId`].
    ///
    /// Scenes built after this call dispatch the system; existing scenes keep
    /// their snapshot.
    pub fn add_system<S: System<R> + 'static>(&mut self, system: S) -> SystemId {
        self.add_shared_system(shared(system))
    }

    /// Register an already-shared system.
    pub fn add_shared_system(&mut self, system: SharedSystem<R>) -> SystemId {
        let id = SystemId(self.next_system_id);
        self.next_system_id += 1;

        let (query, phases) = {
            let mut sys = system.borrow_mut();
            sys.attach(id);
            (sys.query().clone(), sys.phases())
        };
        log::debug!("registered system {id:?} (phases {phases:?})");
        self.systems.push(SystemHandle {
            id,
            query,
            phases,
            system,
        });
        id
    }

    /// Deregister a system. Removing an unknown id is a no-op.
    pub fn remove_system(&mut self, id: SystemId) -> bool {
        let before = self.systems.len();
        self.systems.retain(|handle| handle.id != id);
        let removed = self.systems.len() != before;
        if removed {
            log::debug!("removed system {id:?}");
        }
        removed
    }

    /// The first registered system whose concrete type is `S`.
    pub fn get_system<S: System<R> + 'static>(&self) -> Option<SystemHandle<R>> {
        self.systems.iter().find(|handle| handle.is::<S>()).cloned()
    }

    /// The registered systems, in registration order.
    pub fn systems(&self) -> &[SystemHandle<R>] {
        &self.systems
    }

    /// Register a scene builder under `name`.
    ///
    /// The builder is invoked on a fresh scene every time
    /// [`goto_scene`](Self::goto_scene) selects that name.
    pub fn register_scene(&mut self, name: impl Into<String>, builder: impl Fn(&mut Scene<R>) + 'static) {
        self.scenes.insert(name.into(), Box::new(builder));
    }

    /// Swap to the named scene.
    ///
    /// Fails fast with [`EngineError::SceneNotFound`] before any state
    /// changes. Otherwise the swap is atomic from the caller's perspective:
    /// the engine's entity hooks are detached from the previous scene (which
    /// then receives its `end` event) before they are attached to the new
    /// one, `scenechange` carries the newly constructed scene, and the new
    /// scene's `start` fires last.
    pub fn goto_scene(&mut self, name: &str) -> Result<(), EngineError> {
        let scene = {
            let builder = self
                .scenes
                .get(name)
                .ok_or_else(|| EngineError::SceneNotFound(name.to_string()))?;
            let mut scene = Scene::new(name, self.systems.clone());
            builder(&mut scene);
            scene
        };
        let scene = Rc::new(RefCell::new(scene));

        if let Some(previous) = self.current_scene.take() {
            // Clone the channel out so no scene borrow is live while
            // listeners run; they may reach back into the scene.
            let end = {
                let previous = previous.borrow();
                if let Some((add, remove)) = self.hook_handles.take() {
                    previous.events.entityadd.off(add);
                    previous.events.entityremove.off(remove);
                }
                previous.events.end.clone()
            };
            end.emit(&());
        }

        self.current_scene = Some(Rc::clone(&scene));
        let start = {
            let current = scene.borrow();
            let hook = Rc::clone(&self.entity_add_hook);
            let add = current
                .events
                .entityadd
                .on(move |entity| (&mut *hook.borrow_mut())(entity));
            let hook = Rc::clone(&self.entity_remove_hook);
            let remove = current
                .events
                .entityremove
                .on(move |entity| (&mut *hook.borrow_mut())(entity));
            self.hook_handles = Some((add, remove));
            current.events.start.clone()
        };

        self.events.scenechange.emit(&SceneChange {
            name: name.to_string(),
            scene: Rc::clone(&scene),
        });
        start.emit(&());

        log::info!("scene changed to \"{name}\"");
        Ok(())
    }

    /// The current scene, if a swap has happened.
    pub fn current_scene(&self) -> Option<SharedScene<R>> {
        self.current_scene.clone()
    }

    /// Entity factory.
    pub fn create_entity(&self, name: impl Into<String>) -> Entity {
        Entity::new(name)
    }

    /// Replace the hook observing entity additions on the current scene.
    ///
    /// The hook follows the engine across scene swaps; the default is a
    /// no-op.
    pub fn set_entity_add_hook(&mut self, hook: impl FnMut(&Entity) + 'static) {
        *self.entity_add_hook.borrow_mut() = Box::new(hook);
    }

    /// Replace the hook observing entity removals on the current scene.
    pub fn set_entity_remove_hook(&mut self, hook: impl FnMut(&Entity) + 'static) {
        *self.entity_remove_hook.borrow_mut() = Box::new(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_resolves_on_cumulative_dt() {
        let mut timer = Timer::default();
        let handle = timer.wait(30.0);

        timer.advance(16.0);
        assert!(!handle.done());
        assert_eq!(handle.remaining(), 14.0);

        timer.advance(16.0);
        assert!(handle.done());
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn cancelled_wait_never_resolves() {
        let mut timer = Timer::default();
        let handle = timer.wait(10.0);
        handle.cancel();

        timer.advance(100.0);
        assert!(!handle.done());
        assert!(handle.cancelled());
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn goto_unregistered_scene_fails_fast() {
        let mut engine: Engine = Engine::default();
        let err = engine.goto_scene("nowhere").unwrap_err();
        assert!(matches!(err, EngineError::SceneNotFound(name) if name == "nowhere"));
        assert!(engine.current_scene().is_none());
    }

    #[test]
    fn get_system_matches_by_concrete_type() {
        let engine: Engine = Engine::default();
        assert!(engine.get_system::<VerletSystem>().is_some());
    }

    #[test]
    fn remove_system_is_idempotent() {
        let mut engine: Engine = Engine::default();
        let id = engine
            .get_system::<VerletSystem>()
            .map(|handle| handle.id)
            .unwrap();
        assert!(engine.remove_system(id));
        assert!(!engine.remove_system(id));
        assert!(engine.systems().is_empty());
    }
}
