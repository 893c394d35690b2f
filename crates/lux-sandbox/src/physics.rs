//! Rigid-body physics on rapier2d, synced with the hecs world.
//!
//! Entities opt in by carrying [`BodyKind`] and [`Shape`]; [`PhysicsWorld::attach`]
//! builds their body and collider and tags them with [`Body`]. Gameplay code
//! works in world pixels; rapier works in meters, converted with
//! [`PIXELS_PER_METER`].

use std::collections::HashSet;

use glam::Vec2;
use hecs::{Entity, World};
use rapier2d::prelude::*;

use lux_engine::paint::Color;
use lux_engine::render::{RenderBackend, RenderingServer};

use crate::components::{Position, Rotation, Spin, Velocity};

pub const PIXELS_PER_METER: f32 = 32.0;

/// Standard gravity in m/s², y-up.
pub const EARTH_GRAVITY: Vec2 = Vec2::new(0.0, -9.8);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    /// Moved only by its velocity; pushes dynamic bodies, ignores forces.
    Kinematic,
    Static,
}

/// Collider geometry in world pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Box { half_extents: Vec2 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub density: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { friction: 0.6, density: 1.0, restitution: 0.0 }
    }
}

/// Marks the collider as a sensor: it reports touches but never collides.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sensor;

/// Rapier body owned by this entity. Inserted by [`PhysicsWorld::attach`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Body {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TouchEvent {
    Begin { sensor: Entity, visitor: Entity },
    End { sensor: Entity, visitor: Entity },
}

/// Debug draw colors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DebugColors {
    pub dynamic: Color,
    pub kinematic: Color,
    pub fixed: Color,
    pub sensor: Color,
    pub center: Color,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            dynamic: Color::from_hex(0xe6b34d),
            kinematic: Color::from_hex(0x4d99e6),
            fixed: Color::from_hex(0x80e680),
            sensor: Color::from_hex(0xe64d4d).with_alpha(0.8),
            center: Color::WHITE,
        }
    }
}

pub struct PhysicsWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,

    // cleared after every step, so a force acts for exactly one step
    pending_forces: Vec<(RigidBodyHandle, Vector<Real>)>,
    // (sensor, visitor) collider pairs overlapping after the last step
    touching: HashSet<(ColliderHandle, ColliderHandle)>,
    events: Vec<TouchEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(EARTH_GRAVITY)
    }
}

impl PhysicsWorld {
    /// `gravity` in m/s².
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vector![gravity.x, gravity.y],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            pending_forces: Vec::new(),
            touching: HashSet::new(),
            events: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
        for (_, body) in self.bodies.iter_mut() {
            body.wake_up(true);
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Creates bodies for entities that carry [`BodyKind`] and [`Shape`] but no
    /// [`Body`] yet. Returns how many were attached.
    ///
    /// Initial pose comes from `Position`/`Rotation`; dynamic and kinematic
    /// bodies also take `Velocity`/`Spin` as their starting motion.
    pub fn attach(&mut self, world: &mut World) -> usize {
        let mut fresh = Vec::new();
        for (entity, (kind, shape, material, pos, rot, vel, spin, sensor)) in world
            .query::<(
                &BodyKind,
                &Shape,
                Option<&Material>,
                Option<&Position>,
                Option<&Rotation>,
                Option<&Velocity>,
                Option<&Spin>,
                Option<&Sensor>,
            )>()
            .without::<&Body>()
            .iter()
        {
            let position = pos.map_or(Vec2::ZERO, |p| p.0) / PIXELS_PER_METER;
            let linvel = vel.map_or(Vec2::ZERO, |v| v.0) / PIXELS_PER_METER;
            let builder = match kind {
                BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
                BodyKind::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
                BodyKind::Static => RigidBodyBuilder::fixed(),
            };
            let mut builder = builder
                .translation(vector![position.x, position.y])
                .rotation(rot.map_or(0.0, |r| r.0))
                .user_data(entity_bits(entity));
            if *kind != BodyKind::Static {
                builder = builder
                    .linvel(vector![linvel.x, linvel.y])
                    .angvel(spin.map_or(0.0, |s| s.0));
            }
            let body = self.bodies.insert(builder.build());

            let material = material.copied().unwrap_or_default();
            let collider = collider_builder(*shape)
                .friction(material.friction)
                .density(material.density)
                .restitution(material.restitution)
                .sensor(sensor.is_some())
                .user_data(entity_bits(entity))
                .build();
            let collider = self
                .colliders
                .insert_with_parent(collider, body, &mut self.bodies);

            fresh.push((entity, Body { body, collider }));
        }

        let count = fresh.len();
        for (entity, body) in fresh {
            if let Err(e) = world.insert_one(entity, body) {
                log::warn!("entity {entity:?} vanished while attaching its body: {e}");
            }
        }
        if count > 0 {
            log::debug!("attached {count} bodies, {} total", self.bodies.len());
        }
        count
    }

    /// Removes the body and collider owned by `entity`, if any.
    pub fn remove(&mut self, world: &World, entity: Entity) {
        let Ok(body) = world.get::<&Body>(entity).map(|b| *b) else { return };
        self.touching
            .retain(|&(sensor, visitor)| sensor != body.collider && visitor != body.collider);
        self.pending_forces.retain(|(h, _)| *h != body.body);
        self.bodies.remove(
            body.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Applies `force` (newtons) at the centre of mass during the next step.
    ///
    /// Returns `false` when `entity` has no body.
    pub fn apply_force(&mut self, world: &World, entity: Entity, force: Vec2) -> bool {
        let Ok(body) = world.get::<&Body>(entity).map(|b| *b) else { return false };
        log::debug!("applying force ({}, {}) to {entity:?}", force.x, force.y);
        self.pending_forces.push((body.body, vector![force.x, force.y]));
        true
    }

    /// Advances the simulation by `dt` seconds and records sensor touches.
    pub fn step(&mut self, dt: f32) {
        for (handle, force) in &self.pending_forces {
            if let Some(body) = self.bodies.get_mut(*handle) {
                body.add_force(*force, true);
            }
        }

        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );

        for (handle, _) in self.pending_forces.drain(..) {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.reset_forces(false);
            }
        }

        self.collect_touches();
    }

    /// Touch events recorded since the last drain, in the order they occurred.
    pub fn drain_events(&mut self) -> impl Iterator<Item = TouchEvent> + '_ {
        self.events.drain(..)
    }

    /// Writes body poses back into `Position`/`Rotation`, and linear velocity
    /// into `Velocity` where present.
    pub fn sync_to_world(&self, world: &mut World) {
        for (_, (body, pos, rot, vel)) in world.query_mut::<(
            &Body,
            &mut Position,
            Option<&mut Rotation>,
            Option<&mut Velocity>,
        )>() {
            let Some(rb) = self.bodies.get(body.body) else { continue };
            let t = rb.translation();
            pos.0 = Vec2::new(t.x, t.y) * PIXELS_PER_METER;
            if let Some(rot) = rot {
                rot.0 = rb.rotation().angle();
            }
            if let Some(vel) = vel {
                let v = rb.linvel();
                vel.0 = Vec2::new(v.x, v.y) * PIXELS_PER_METER;
            }
        }
    }

    /// Outlines every collider through the server's line primitives and marks
    /// each body centre with a point.
    pub fn debug_draw<B: RenderBackend>(
        &self,
        world: &World,
        server: &mut RenderingServer<B>,
        colors: &DebugColors,
    ) {
        for (_, (body, shape, kind, sensor)) in world
            .query::<(&Body, &Shape, &BodyKind, Option<&Sensor>)>()
            .iter()
        {
            let Some(rb) = self.bodies.get(body.body) else { continue };
            let t = rb.translation();
            let center = Vec2::new(t.x, t.y) * PIXELS_PER_METER;
            let angle = rb.rotation().angle();

            let color = match (sensor, kind) {
                (Some(_), _) => colors.sensor,
                (None, BodyKind::Dynamic) => colors.dynamic,
                (None, BodyKind::Kinematic) => colors.kinematic,
                (None, BodyKind::Static) => colors.fixed,
            };

            match *shape {
                Shape::Circle { radius } => {
                    server.draw_circle(center, radius, color);
                    // spoke shows the rotation
                    server.draw_line(center, center + Vec2::from_angle(angle) * radius, color);
                }
                Shape::Box { half_extents: h } => {
                    server.draw_quad(
                        Vec2::new(-h.x, -h.y),
                        Vec2::new(h.x, -h.y),
                        Vec2::new(h.x, h.y),
                        Vec2::new(-h.x, h.y),
                        center,
                        angle,
                        color,
                        false,
                    );
                }
            }
            server.draw_point(center, colors.center, 3.0);
        }
    }

    fn collect_touches(&mut self) {
        let mut now = HashSet::new();
        for (a, b, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let is_sensor = |h| self.colliders.get(h).is_some_and(|c| c.is_sensor());
            if is_sensor(a) {
                now.insert((a, b));
            }
            if is_sensor(b) {
                now.insert((b, a));
            }
        }

        for &(sensor, visitor) in now.difference(&self.touching) {
            if let Some((sensor, visitor)) = self.pair_entities(sensor, visitor) {
                self.events.push(TouchEvent::Begin { sensor, visitor });
            }
        }
        for &(sensor, visitor) in self.touching.difference(&now) {
            if let Some((sensor, visitor)) = self.pair_entities(sensor, visitor) {
                self.events.push(TouchEvent::End { sensor, visitor });
            }
        }
        self.touching = now;
    }

    fn pair_entities(&self, sensor: ColliderHandle, visitor: ColliderHandle) -> Option<(Entity, Entity)> {
        let entity = |h| self.colliders.get(h).and_then(|c| Entity::from_bits(c.user_data as u64));
        Some((entity(sensor)?, entity(visitor)?))
    }
}

fn collider_builder(shape: Shape) -> ColliderBuilder {
    match shape {
        Shape::Circle { radius } => ColliderBuilder::ball(radius.max(0.0) / PIXELS_PER_METER),
        Shape::Box { half_extents } => {
            let h = half_extents.max(Vec2::ZERO) / PIXELS_PER_METER;
            ColliderBuilder::cuboid(h.x, h.y)
        }
    }
}

fn entity_bits(entity: Entity) -> u128 {
    entity.to_bits().get() as u128
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_engine::render::{HeadlessBackend, RenderConfig};

    const DT: f32 = 1.0 / 60.0;

    fn ball(world: &mut World, kind: BodyKind, at: Vec2) -> Entity {
        world.spawn((Position(at), Rotation(0.0), kind, Shape::Circle { radius: 16.0 }))
    }

    #[test]
    fn attach_is_idempotent() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::default();
        let e = ball(&mut world, BodyKind::Dynamic, Vec2::ZERO);

        assert_eq!(physics.attach(&mut world), 1);
        assert_eq!(physics.attach(&mut world), 0);
        assert!(world.get::<&Body>(e).is_ok());
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn falling_body_syncs_position_in_pixels() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::default();
        let falling = ball(&mut world, BodyKind::Dynamic, Vec2::new(64.0, 320.0));
        let ground = ball(&mut world, BodyKind::Static, Vec2::new(-200.0, 0.0));
        physics.attach(&mut world);

        for _ in 0..30 {
            physics.step(DT);
        }
        physics.sync_to_world(&mut world);

        let p = world.get::<&Position>(falling).unwrap().0;
        // half a second of free fall: 0.5 * 9.8 * 0.25 m, about 39 px
        assert!((p.x - 64.0).abs() < 1e-3);
        assert!(p.y < 320.0 - 30.0 && p.y > 320.0 - 50.0, "y = {}", p.y);
        assert_eq!(world.get::<&Position>(ground).unwrap().0, Vec2::new(-200.0, 0.0));
    }

    #[test]
    fn kinematic_body_follows_its_velocity() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::default();
        let e = world.spawn((
            Position(Vec2::ZERO),
            Rotation(0.0),
            Velocity(Vec2::new(64.0, 0.0)),
            Spin(1.0),
            BodyKind::Kinematic,
            Shape::Box { half_extents: Vec2::splat(8.0) },
        ));
        physics.attach(&mut world);

        for _ in 0..60 {
            physics.step(DT);
        }
        physics.sync_to_world(&mut world);

        // gravity does not act on kinematic bodies
        let p = world.get::<&Position>(e).unwrap().0;
        assert!((p - Vec2::new(64.0, 0.0)).length() < 0.5, "{p}");
        assert!((world.get::<&Rotation>(e).unwrap().0 - 1.0).abs() < 1e-2);
        assert!((world.get::<&Velocity>(e).unwrap().0.x - 64.0).abs() < 1e-3);
    }

    #[test]
    fn force_acts_for_a_single_step() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let e = world.spawn((
            Position(Vec2::ZERO),
            Velocity(Vec2::ZERO),
            BodyKind::Dynamic,
            Shape::Box { half_extents: Vec2::splat(16.0) },
        ));
        physics.attach(&mut world);

        assert!(physics.apply_force(&world, e, Vec2::new(100.0, 0.0)));
        physics.step(DT);
        physics.sync_to_world(&mut world);
        let v1 = world.get::<&Velocity>(e).unwrap().0;
        assert!(v1.x > 0.0);

        physics.step(DT);
        physics.sync_to_world(&mut world);
        let v2 = world.get::<&Velocity>(e).unwrap().0;
        assert!((v2 - v1).length() < 1e-3);

        let stranger = world.spawn((Position(Vec2::ZERO),));
        assert!(!physics.apply_force(&world, stranger, Vec2::X));
    }

    #[test]
    fn sensor_reports_begin_and_end() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::default();
        let sensor = world.spawn((
            Position(Vec2::ZERO),
            BodyKind::Static,
            Shape::Circle { radius: 64.0 },
            Sensor,
        ));
        let visitor = ball(&mut world, BodyKind::Dynamic, Vec2::new(0.0, 200.0));
        physics.attach(&mut world);

        let mut events = Vec::new();
        for _ in 0..240 {
            physics.step(DT);
            events.extend(physics.drain_events());
        }

        assert_eq!(
            events,
            vec![
                TouchEvent::Begin { sensor, visitor },
                TouchEvent::End { sensor, visitor },
            ]
        );
        // sensors never block: the ball fell straight through
        physics.sync_to_world(&mut world);
        assert!(world.get::<&Position>(visitor).unwrap().0.y < -64.0);
    }

    #[test]
    fn removed_body_stops_simulating() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::default();
        let e = ball(&mut world, BodyKind::Dynamic, Vec2::new(0.0, 100.0));
        physics.attach(&mut world);

        physics.remove(&world, e);
        assert_eq!(physics.body_count(), 0);
        physics.step(DT);
        physics.sync_to_world(&mut world);
        assert_eq!(world.get::<&Position>(e).unwrap().0, Vec2::new(0.0, 100.0));
    }

    #[test]
    fn debug_draw_outlines_each_collider() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::default();
        ball(&mut world, BodyKind::Dynamic, Vec2::ZERO);
        world.spawn((
            Position(Vec2::new(100.0, 0.0)),
            BodyKind::Static,
            Shape::Box { half_extents: Vec2::new(50.0, 10.0) },
        ));
        physics.attach(&mut world);

        let config = RenderConfig::default();
        let mut server = RenderingServer::new(HeadlessBackend::new(&config)).unwrap();
        server.begin_frame();
        physics.debug_draw(&world, &mut server, &DebugColors::default());
        server.end_frame();

        // circle chords + spoke, four box edges, one centre point per body
        let expected = config.circle_segments + 1 + 4 + 2;
        assert_eq!(server.stats().quads, expected);
        assert_eq!(server.stats().draw_calls, 1);
    }
}
