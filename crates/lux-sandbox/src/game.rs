use std::path::PathBuf;

use anyhow::Result;
use glam::{Vec2, Vec3};
use hecs::World;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use winit::event::WindowEvent;

use lux_engine::core::{App, AppControl, FrameCtx, StartCtx};
use lux_engine::input::{InputState, Key, MouseButton};
use lux_engine::paint::Color;
use lux_engine::render::{RenderConfig, RenderingServer, TextureRef, WgpuBackend};
use lux_engine::time::FixedStep;

use crate::components::{Position, Sprite};
use crate::physics::{
    BodyKind, DebugColors, EARTH_GRAVITY, Material, PhysicsWorld, Sensor, Shape, TouchEvent,
};
use crate::systems;
use crate::textures;

/// Half-size of the walled box sprites bounce inside.
const ARENA: Vec2 = Vec2::new(600.0, 340.0);
const WALL_THICKNESS: f32 = 20.0;
const SENSOR_RADIUS: f32 = 48.0;
const PAN_SPEED: f32 = 400.0;
const ZOOM_PER_LINE: f32 = 1.1;
/// Upward force in newtons applied to every sprite by one kick.
const KICK: f32 = 600.0;

const BOUNCY: Material = Material { friction: 0.2, density: 1.0, restitution: 0.9 };

pub struct Options {
    pub sprites: usize,
    pub seed: u64,
    /// PNG used instead of the generated checkerboard.
    pub image: Option<PathBuf>,
}

pub struct Sandbox {
    options: Options,
    server: Option<RenderingServer<WgpuBackend>>,
    world: World,
    physics: PhysicsWorld,
    debug_physics: bool,
    // sprites currently overlapping the centre sensor
    in_sensor: usize,
    rng: SmallRng,
    textures: Vec<TextureRef>,
    // world-space point where the current right-drag began
    drag_start: Option<Vec2>,
}

impl Sandbox {
    pub fn new(options: Options) -> Self {
        let rng = SmallRng::seed_from_u64(options.seed);
        Self {
            options,
            server: None,
            world: World::new(),
            physics: PhysicsWorld::new(Vec2::ZERO),
            debug_physics: false,
            in_sensor: 0,
            rng,
            textures: Vec::new(),
            drag_start: None,
        }
    }

    fn spawn_random(&mut self, count: usize) {
        let Some(server) = self.server.as_mut() else { return };
        if self.textures.is_empty() {
            return;
        }

        for _ in 0..count {
            let index = self.rng.gen_range(0..self.textures.len());
            let texture = self.textures[index];
            let side: f32 = self.rng.gen_range(16.0..48.0);
            // the first texture is square, the rest are discs
            let shape = if index == 0 {
                Shape::Box { half_extents: Vec2::splat(side * 0.5) }
            } else {
                Shape::Circle { radius: side * 0.5 }
            };
            let pos = Vec2::new(
                self.rng.gen_range(-ARENA.x..ARENA.x),
                self.rng.gen_range(-ARENA.y..ARENA.y),
            );
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(40.0..220.0);
            let spin = self.rng.gen_range(-2.0..2.0);

            systems::spawn_sprite(
                &mut self.world,
                server,
                Sprite { size: Vec2::splat(side), texture },
                shape,
                BOUNCY,
                pos,
                Vec2::from_angle(angle) * speed,
                spin,
            );
        }
        log::info!("{} sprites", self.sprite_count());
    }

    fn despawn_some(&mut self, count: usize) {
        let Some(server) = self.server.as_mut() else { return };
        let doomed: Vec<_> = self
            .world
            .query::<&Sprite>()
            .iter()
            .map(|(e, _)| e)
            .take(count)
            .collect();
        for entity in doomed {
            if let Err(e) = systems::despawn(&mut self.world, server, &mut self.physics, entity) {
                log::warn!("despawn failed: {e:#}");
            }
        }
        log::info!("{} sprites", self.sprite_count());
    }

    fn sprite_count(&self) -> usize {
        self.world.query::<&Sprite>().iter().count()
    }

    /// Static walls around the arena and a sensor at the origin.
    fn spawn_level(&mut self) {
        let half = WALL_THICKNESS * 0.5;
        let walls = [
            (Vec2::new(0.0, ARENA.y + half), Vec2::new(ARENA.x + WALL_THICKNESS, half)),
            (Vec2::new(0.0, -ARENA.y - half), Vec2::new(ARENA.x + WALL_THICKNESS, half)),
            (Vec2::new(ARENA.x + half, 0.0), Vec2::new(half, ARENA.y)),
            (Vec2::new(-ARENA.x - half, 0.0), Vec2::new(half, ARENA.y)),
        ];
        for (center, half_extents) in walls {
            self.world.spawn((
                Position(center),
                BodyKind::Static,
                Shape::Box { half_extents },
                BOUNCY,
            ));
        }
        self.world.spawn((
            Position(Vec2::ZERO),
            BodyKind::Static,
            Shape::Circle { radius: SENSOR_RADIUS },
            Sensor,
        ));
    }

    fn kick(&mut self) {
        let sprites: Vec<_> = self.world.query::<&Sprite>().iter().map(|(e, _)| e).collect();
        for entity in sprites {
            self.physics.apply_force(&self.world, entity, Vec2::new(0.0, KICK));
        }
    }

    fn toggle_gravity(&mut self) {
        let gravity = if self.physics.gravity() == Vec2::ZERO { EARTH_GRAVITY } else { Vec2::ZERO };
        log::info!("gravity {gravity}");
        self.physics.set_gravity(gravity);
    }

    fn handle_frame_input(&mut self, ctx: &FrameCtx<'_, '_>) {
        let Some(server) = self.server.as_mut() else { return };

        let wheel = ctx.input_frame.wheel.y;
        if wheel != 0.0 {
            server.set_camera_zoom(server.camera_zoom() * ZOOM_PER_LINE.powf(wheel));
        }

        let pointer = ctx.input.pointer.map(|p| server.camera().screen_to_world(p));
        if ctx.input_frame.button_pressed(MouseButton::Right) {
            self.drag_start = pointer;
        }
        if ctx.input_frame.button_released(MouseButton::Right) {
            self.drag_start = None;
        }

        if ctx.input_frame.key_pressed(Key::Space) {
            self.spawn_random(100);
        }
        if ctx.input_frame.key_pressed(Key::Backspace) {
            self.despawn_some(100);
        }
        if ctx.input_frame.key_pressed(Key::G) {
            self.toggle_gravity();
        }
        if ctx.input_frame.key_pressed(Key::F) {
            self.kick();
        }
        if ctx.input_frame.key_pressed(Key::P) {
            self.debug_physics = !self.debug_physics;
        }
    }
}

impl App for Sandbox {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> Result<()> {
        let info = ctx.gpu.adapter_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let mut backend = WgpuBackend::new(&ctx.render_ctx(), &RenderConfig::default())?;

        let base = match &self.options.image {
            Some(path) => textures::load(path)?,
            None => textures::checkerboard(64, 8, [230, 230, 230, 255], [60, 60, 70, 255]),
        };
        let images = [
            base,
            textures::disc(64, [240, 90, 70]),
            textures::disc(64, [80, 170, 240]),
        ];
        for img in &images {
            let tex = backend.create_texture_rgba8(img.width(), img.height(), img.as_raw())?;
            self.textures.push(tex);
        }

        self.server = Some(RenderingServer::new(backend)?);
        self.spawn_level();
        self.spawn_random(self.options.sprites);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::Resized(size) = event {
            log::debug!("resized to {}x{}", size.width, size.height);
        }
        AppControl::Continue
    }

    fn on_fixed_update(&mut self, step: FixedStep, input: &InputState) {
        self.physics.attach(&mut self.world);
        self.physics.step(step.dt);
        for event in self.physics.drain_events() {
            match event {
                TouchEvent::Begin { .. } => self.in_sensor += 1,
                TouchEvent::End { .. } => self.in_sensor = self.in_sensor.saturating_sub(1),
            }
            log::trace!("{event:?}, {} inside the sensor", self.in_sensor);
        }
        self.physics.sync_to_world(&mut self.world);

        let Some(server) = self.server.as_mut() else { return };
        let pan = Vec2::new(
            input.axis(&[Key::A, Key::ArrowLeft], &[Key::D, Key::ArrowRight]),
            input.axis(&[Key::S, Key::ArrowDown], &[Key::W, Key::ArrowUp]),
        );
        if pan != Vec2::ZERO {
            // constant on-screen speed at any zoom
            let delta = pan.normalize() * PAN_SPEED * step.dt / server.camera_zoom();
            server.set_camera_position(server.camera_position() + delta.extend(0.0));
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }
        if ctx.input_frame.key_pressed(Key::Digit0) {
            if let Some(server) = self.server.as_mut() {
                server.set_camera_position(Vec3::ZERO);
                server.set_camera_zoom(1.0);
            }
        }
        self.handle_frame_input(ctx);

        let Some(server) = self.server.as_mut() else {
            return AppControl::Continue;
        };
        server.set_camera_resolution(ctx.viewport());
        server.begin_frame();

        // debug overlay, batched ahead of the sprites
        let frame = Color::from_hex(0x4a4a58).with_alpha(0.6);
        server.draw_rect(Vec2::ZERO, 0.0, ARENA * 2.0, frame, false);
        server.draw_line(Vec2::new(-20.0, 0.0), Vec2::new(20.0, 0.0), Color::RED);
        server.draw_line(Vec2::new(0.0, -20.0), Vec2::new(0.0, 20.0), Color::GREEN);
        let sensor_color = if self.in_sensor > 0 { 0xff7040 } else { 0xf0c040 };
        server.draw_circle(Vec2::ZERO, SENSOR_RADIUS, Color::from_hex(sensor_color));
        server.draw_point(Vec2::new(ARENA.x, ARENA.y), Color::WHITE, 6.0);
        if self.debug_physics {
            self.physics.debug_draw(&self.world, server, &DebugColors::default());
        }

        let dragging = ctx.input.button_down(MouseButton::Right);
        if let (true, Some(start), Some(p)) = (dragging, self.drag_start, ctx.input.pointer) {
            let end = server.camera().screen_to_world(p);
            server.draw_line_thick(start, end, Color::from_hex(0x66ff99), 2.0);
            server.draw_circle_segments(end, 6.0, Color::from_hex(0x66ff99), 12);
        }

        systems::sync_visuals(&self.world, server);
        server.draw_all_visuals();
        server.end_frame();

        let clear = server.config().clear_color;
        let control = ctx.render(|rctx, target| {
            server.backend_mut().encode(rctx, target, Some(clear));
        });

        let stats = server.stats();
        if ctx.time.frame_index % 600 == 0 {
            let (min, max) = server.camera().visible_world_rect();
            log::debug!(
                "frame {}: {} draw calls ({} encoded), {} quads, {} dropped, view {min}..{max}",
                ctx.time.frame_index,
                stats.draw_calls,
                server.backend().draw_count(),
                stats.quads,
                stats.dropped_quads
            );
        }
        control
    }
}
