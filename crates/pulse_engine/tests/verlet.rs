//! Verlet integrator traces: friction retention, gravity scaling, clamping
//! and the snapshot-then-add invariant.

use approx::assert_relative_eq;
use pulse_engine::prelude::*;

const DT: f64 = 16.6667;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn body_transform_query() -> Query {
    Query::new().with::<BodyComponent>().with::<TransformComponent>()
}

/// Build a one-entity manager indexed for a standalone integrator.
fn indexed(entity: &Entity) -> pulse_engine::ecs::EntityManager {
    let mut manager = pulse_engine::ecs::EntityManager::new(vec![(
        SystemId(0),
        body_transform_query(),
    )]);
    manager.add_entity(entity);
    manager
}

fn step(system: &mut VerletSystem, manager: &pulse_engine::ecs::EntityManager, dt: f64) {
    let system: &mut dyn System = system;
    system.fixed_update(
        manager.results(SystemId(0)).expect("index present"),
        &UpdateEvent { dt },
    );
}

#[test]
fn gravity_trace_clamps_to_max_velocity() {
    init_logs();
    let engine: Engine = Engine::new(EngineArgs::default());
    let entity = engine.create_entity("ball");
    entity.add_component(BodyComponent::new().with_friction(Vec2::new(1.0, 1.0)));
    entity.add_component(TransformComponent::new());
    let manager = indexed(&entity);
    let mut system = VerletSystem::default();

    step(&mut system, &manager, DT);

    let cell = entity.get_component::<TransformComponent>().unwrap();
    let transform = cell.borrow::<TransformComponent>().unwrap();

    // Raw gravity velocity is 0.01 * dt^2 * 1e6 ~= 2.78 million, clamped to
    // the default max of 100 on the y axis.
    assert_relative_eq!(transform.position.x, 0.0);
    assert_relative_eq!(transform.position.y, 100.0);
    assert_relative_eq!(transform.prev.position.x, 0.0);
    assert_relative_eq!(transform.prev.position.y, 0.0);
}

#[test]
fn friction_fully_discards_prior_motion_when_zero() {
    init_logs();
    let engine: Engine = Engine::new(EngineArgs::default());
    let entity = engine.create_entity("ball");
    entity.add_component(BodyComponent::new().with_friction(Vec2::zeros()));
    entity.add_component(TransformComponent::new());
    let manager = indexed(&entity);
    let mut system = VerletSystem::default();

    // Fake a prior displacement of (5, 5).
    {
        let cell = entity.get_component::<TransformComponent>().unwrap();
        let mut transform = cell.borrow_mut::<TransformComponent>().unwrap();
        transform.position = Vec2::new(5.0, 5.0);
        transform.prev.position = Vec2::zeros();
    }

    step(&mut system, &manager, DT);

    let cell = entity.get_component::<TransformComponent>().unwrap();
    let transform = cell.borrow::<TransformComponent>().unwrap();

    // Only the gravity term survives: x keeps its position, y gains the
    // clamped gravity contribution.
    assert_relative_eq!(transform.position.x, 5.0);
    assert_relative_eq!(transform.position.y, 105.0);
}

#[test]
fn full_friction_retains_the_previous_displacement() {
    init_logs();
    let engine: Engine = Engine::new(EngineArgs::default());
    let entity = engine.create_entity("ball");
    entity.add_component(
        BodyComponent::new()
            .with_friction(Vec2::new(1.0, 1.0))
            .with_gravity(false),
    );
    entity.add_component(TransformComponent::new());
    let manager = indexed(&entity);
    let mut system = VerletSystem::default();

    {
        let cell = entity.get_component::<TransformComponent>().unwrap();
        let mut transform = cell.borrow_mut::<TransformComponent>().unwrap();
        transform.position = Vec2::new(3.0, -2.0);
        transform.prev.position = Vec2::zeros();
    }

    step(&mut system, &manager, DT);

    let cell = entity.get_component::<TransformComponent>().unwrap();
    let transform = cell.borrow::<TransformComponent>().unwrap();
    assert_relative_eq!(transform.position.x, 6.0);
    assert_relative_eq!(transform.position.y, -4.0);
    assert_relative_eq!(transform.prev.position.x, 3.0);
    assert_relative_eq!(transform.prev.position.y, -2.0);
}

#[test]
fn static_bodies_are_exempt_from_gravity() {
    init_logs();
    let engine: Engine = Engine::new(EngineArgs::default());
    let entity = engine.create_entity("wall");
    entity.add_component(BodyComponent::new().with_static(true));
    entity.add_component(TransformComponent::at(Vec2::new(7.0, 7.0)));
    let manager = indexed(&entity);
    let mut system = VerletSystem::default();

    step(&mut system, &manager, DT);

    let cell = entity.get_component::<TransformComponent>().unwrap();
    let transform = cell.borrow::<TransformComponent>().unwrap();
    assert_relative_eq!(transform.position.x, 7.0);
    assert_relative_eq!(transform.position.y, 7.0);
}

#[test]
fn zero_max_velocity_component_disables_clamping_on_that_axis() {
    init_logs();
    let engine: Engine = Engine::new(EngineArgs::default());
    let entity = engine.create_entity("ball");
    entity.add_component(BodyComponent::new());
    entity.add_component(TransformComponent::new());
    let manager = indexed(&entity);
    let mut system = VerletSystem::new(Vec2::new(0.0, 0.01), Vec2::new(100.0, 0.0));

    step(&mut system, &manager, DT);

    let cell = entity.get_component::<TransformComponent>().unwrap();
    let transform = cell.borrow::<TransformComponent>().unwrap();
    let raw_gravity = 0.01 * DT * DT * 1_000_000.0;
    assert_relative_eq!(transform.position.y, raw_gravity);
}

#[test]
fn snapshot_then_add_keeps_the_displacement_readable() {
    init_logs();
    let engine: Engine = Engine::new(EngineArgs::default());
    let entity = engine.create_entity("ball");
    entity.add_component(BodyComponent::new().with_friction(Vec2::new(1.0, 1.0)));
    entity.add_component(TransformComponent::new());
    let manager = indexed(&entity);
    let mut system = VerletSystem::default();

    step(&mut system, &manager, DT);
    {
        let cell = entity.get_component::<TransformComponent>().unwrap();
        let transform = cell.borrow::<TransformComponent>().unwrap();
        // position - prev.position is exactly the velocity just applied.
        assert_relative_eq!(transform.position.y - transform.prev.position.y, 100.0);
    }

    step(&mut system, &manager, DT);
    let cell = entity.get_component::<TransformComponent>().unwrap();
    let transform = cell.borrow::<TransformComponent>().unwrap();
    // Retained 100 plus the clamped gravity term, clamped to 100 again.
    assert_relative_eq!(transform.prev.position.y, 100.0);
    assert_relative_eq!(transform.position.y, 200.0);
}

#[test]
fn body_velocity_accessor_matches_the_integrator() {
    init_logs();
    let mut engine: Engine = Engine::new(EngineArgs::default());
    let ball = engine.create_entity("ball");
    ball.add_component(BodyComponent::new().with_friction(Vec2::new(1.0, 1.0)));
    ball.add_component(TransformComponent::new());

    let tracked = ball.clone();
    engine.register_scene("level", move |scene| {
        scene.add_entity(&tracked);
    });
    engine.start("level").unwrap();

    // One fixed step at the default 60 fps.
    engine.update(17.0);

    let body_cell = ball.get_component::<BodyComponent>().unwrap();
    let body = body_cell.borrow::<BodyComponent>().unwrap();
    assert_relative_eq!(body.velocity().y, 100.0);

    let transform_cell = ball.get_component::<TransformComponent>().unwrap();
    let transform = transform_cell.borrow::<TransformComponent>().unwrap();
    assert_relative_eq!(transform.position.y, 100.0);
}
