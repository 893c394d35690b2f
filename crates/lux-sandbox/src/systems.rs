use glam::Vec2;
use hecs::{Entity, World};
use lux_engine::render::{RenderBackend, RenderingServer};

use crate::components::{Position, Rotation, Scale, Spin, Sprite, Velocity, VisualHandle};
use crate::physics::{BodyKind, Material, PhysicsWorld, Shape};

/// Spawns a dynamic sprite and registers its visual.
///
/// The body itself is created by the next [`PhysicsWorld::attach`].
#[allow(clippy::too_many_arguments)]
pub fn spawn_sprite<B: RenderBackend>(
    world: &mut World,
    server: &mut RenderingServer<B>,
    sprite: Sprite,
    shape: Shape,
    material: Material,
    position: Vec2,
    velocity: Vec2,
    spin: f32,
) -> Entity {
    let handle = server.new_visual();
    world.spawn((
        Position(position),
        Rotation(0.0),
        Scale(Vec2::ONE),
        Velocity(velocity),
        Spin(spin),
        sprite,
        VisualHandle(handle),
        BodyKind::Dynamic,
        shape,
        material,
    ))
}

/// Despawns `entity`, releasing its body and visual first.
pub fn despawn<B: RenderBackend>(
    world: &mut World,
    server: &mut RenderingServer<B>,
    physics: &mut PhysicsWorld,
    entity: Entity,
) -> anyhow::Result<()> {
    physics.remove(world, entity);
    if let Ok(handle) = world.get::<&VisualHandle>(entity).map(|h| h.0) {
        server.delete_visual(handle)?;
    }
    world.despawn(entity)?;
    Ok(())
}

/// Copies each sprite's transform, size and texture into its visual.
pub fn sync_visuals<B: RenderBackend>(world: &World, server: &mut RenderingServer<B>) {
    for (entity, (handle, sprite, pos, rot, scale)) in world
        .query::<(&VisualHandle, &Sprite, &Position, Option<&Rotation>, Option<&Scale>)>()
        .iter()
    {
        let Ok(visual) = server.get_visual(handle.0) else {
            log::warn!("entity {entity:?} holds stale visual {}", handle.0);
            continue;
        };
        let rotation = rot.map_or(0.0, |r| r.0);
        let scale = scale.map_or(Vec2::ONE, |s| s.0);

        visual.set_transform(pos.0, rotation, scale);
        visual.size = sprite.size;
        visual.texture = sprite.texture;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_engine::render::{HeadlessBackend, RenderConfig, TextureRef};

    fn setup() -> (World, RenderingServer<HeadlessBackend>, TextureRef) {
        let mut backend = HeadlessBackend::new(&RenderConfig::default());
        let tex = backend.create_texture(16, 16).unwrap();
        let server = RenderingServer::new(backend).unwrap();
        (World::new(), server, tex)
    }

    fn spawn_box(
        world: &mut World,
        server: &mut RenderingServer<HeadlessBackend>,
        tex: TextureRef,
        at: Vec2,
    ) -> Entity {
        let sprite = Sprite { size: Vec2::splat(16.0), texture: tex };
        let shape = Shape::Box { half_extents: Vec2::splat(8.0) };
        spawn_sprite(world, server, sprite, shape, Material::default(), at, Vec2::ZERO, 0.0)
    }

    #[test]
    fn spawn_sync_draw_despawn() {
        let (mut world, mut server, tex) = setup();
        let mut physics = PhysicsWorld::default();
        let e = spawn_box(&mut world, &mut server, tex, Vec2::new(10.0, 0.0));
        assert_eq!(server.visuals().len(), 1);
        assert_eq!(physics.attach(&mut world), 1);

        sync_visuals(&world, &mut server);
        let handle = world.get::<&VisualHandle>(e).unwrap().0;
        let visual = *server.visual(handle).unwrap();
        assert_eq!(visual.texture, tex);
        assert_eq!(visual.corners()[0], Vec2::new(2.0, -8.0));

        server.begin_frame();
        server.draw_all_visuals();
        assert_eq!(server.stats().quads, 1);

        despawn(&mut world, &mut server, &mut physics, e).unwrap();
        assert!(server.visuals().is_empty());
        assert_eq!(physics.body_count(), 0);
        assert!(!world.contains(e));
    }

    #[test]
    fn physics_motion_reaches_the_visual() {
        let (mut world, mut server, tex) = setup();
        let mut physics = PhysicsWorld::default();
        let e = spawn_box(&mut world, &mut server, tex, Vec2::new(0.0, 100.0));
        physics.attach(&mut world);

        for _ in 0..10 {
            physics.step(1.0 / 60.0);
        }
        physics.sync_to_world(&mut world);
        sync_visuals(&world, &mut server);

        let handle = world.get::<&VisualHandle>(e).unwrap().0;
        let y = server.visual(handle).unwrap().corners()[0].y;
        let pos = world.get::<&Position>(e).unwrap().0;
        assert!(pos.y < 100.0);
        assert!((y - (pos.y - 8.0)).abs() < 1e-3);
        assert!(world.get::<&Velocity>(e).unwrap().0.y < 0.0);
    }
}
