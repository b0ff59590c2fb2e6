// src/ecs/world.rs
use std::borrow::Cow;

use image::{Rgba, RgbaImage};
use legion::storage::Component;
use legion::{Entity, EntityStore, IntoQuery, World};

use super::collision::{intersects, tile_contacts, TileContact};
use super::components::{Collider, Shape};
use super::Handle;
use crate::engine::camera::Camera;
use crate::game::tilemap::Tilemap;

/// Which registered colliders a query should consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionFilter {
    All,
    /// Solid colliders only.
    Bodies,
    /// Overlap-only colliders only.
    Areas,
}

impl CollisionFilter {
    fn accepts(self, collider: &Collider) -> bool {
        match self {
            CollisionFilter::All => true,
            CollisionFilter::Bodies => !collider.is_area,
            CollisionFilter::Areas => collider.is_area,
        }
    }
}

/// Owns every live collider, plus the bodies and projectiles they belong to.
///
/// Colliders stay registered until they are removed explicitly, either with
/// [`PhysicsWorld::remove`] or through their owner's teardown.
#[derive(Default)]
pub struct PhysicsWorld {
    world: World,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a standalone collider.
    pub fn add_collider(&mut self, collider: Collider) -> Handle {
        self.world.push((collider,))
    }

    /// Removes the entity behind `handle` together with all its components.
    /// Returns false if it was already gone.
    pub fn remove(&mut self, handle: Handle) -> bool {
        self.world.remove(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.world.contains(handle)
    }

    /// Registers `collider` on a new entity that also carries `owner`, and
    /// points the collider's parent at that entity.
    pub fn add_owned_collider<T: Component>(&mut self, collider: Collider, owner: T) -> Handle {
        let handle = self.world.push((collider, owner));
        if let Some(collider) = self.collider_mut(handle) {
            collider.parent = Some(handle);
        }
        handle
    }

    pub fn component<T: Component>(&self, handle: Handle) -> Option<&T> {
        self.world.entry_ref(handle).ok()?.into_component::<T>().ok()
    }

    pub fn component_mut<T: Component>(&mut self, handle: Handle) -> Option<&mut T> {
        self.world.entry(handle)?.into_component_mut::<T>().ok()
    }

    pub fn collider(&self, handle: Handle) -> Option<&Collider> {
        self.component::<Collider>(handle)
    }

    pub fn collider_mut(&mut self, handle: Handle) -> Option<&mut Collider> {
        self.component_mut::<Collider>(handle)
    }

    /// Handles of every entity carrying a `T`, in storage order.
    pub fn handles_with<T: Component>(&self) -> Vec<Handle> {
        <(Entity, &T)>::query()
            .iter(&self.world)
            .map(|(entity, _)| *entity)
            .collect()
    }

    pub fn count<T: Component>(&self) -> usize {
        <&T>::query().iter(&self.world).count()
    }

    pub fn collider_count(&self) -> usize {
        self.count::<Collider>()
    }

    /// Handles of every registered collider.
    pub fn colliders(&self) -> Vec<Handle> {
        self.handles_with::<Collider>()
    }

    /// Colliders overlapping `probe`, skipping `exclude`. Pure query: no
    /// flags are touched.
    pub fn overlapping(
        &self,
        probe: &Collider,
        exclude: Option<Handle>,
        filter: CollisionFilter,
    ) -> Vec<(Handle, Collider)> {
        <(Entity, &Collider)>::query()
            .iter(&self.world)
            .filter(|(entity, _)| Some(**entity) != exclude)
            .filter(|(_, other)| filter.accepts(other) && intersects(probe, other))
            .map(|(entity, other)| (*entity, other.clone()))
            .collect()
    }

    fn query_collisions(&mut self, handle: Handle, filter: CollisionFilter) -> Vec<Handle> {
        let Some(probe) = self.collider(handle).cloned() else {
            return Vec::new();
        };
        let hits: Vec<Handle> = self
            .overlapping(&probe, Some(handle), filter)
            .into_iter()
            .map(|(entity, _)| entity)
            .collect();
        if !hits.is_empty() {
            if let Some(collider) = self.collider_mut(handle) {
                collider.is_colliding = true;
            }
        }
        hits
    }

    /// Every collider overlapping `handle`'s collider, itself excluded.
    pub fn get_collisions(&mut self, handle: Handle) -> Vec<Handle> {
        self.query_collisions(handle, CollisionFilter::All)
    }

    /// Overlapping solid colliders.
    pub fn get_body_collisions(&mut self, handle: Handle) -> Vec<Handle> {
        self.query_collisions(handle, CollisionFilter::Bodies)
    }

    /// Overlapping area colliders.
    pub fn get_area_collisions(&mut self, handle: Handle) -> Vec<Handle> {
        self.query_collisions(handle, CollisionFilter::Areas)
    }

    /// Blocking tiles overlapping `handle`'s collider.
    pub fn get_tile_collisions(&mut self, handle: Handle, tilemap: &Tilemap) -> Vec<TileContact> {
        let Some(collider) = self.collider_mut(handle) else {
            return Vec::new();
        };
        tile_contacts(collider, tilemap)
    }

    /// Tests every pair of colliders and refreshes their `is_colliding` flags.
    /// Only the debug overlay reads the result.
    pub fn collide_all(&mut self) {
        let snapshot: Vec<(Handle, Collider)> = <(Entity, &Collider)>::query()
            .iter(&self.world)
            .map(|(entity, collider)| (*entity, collider.clone()))
            .collect();

        let mut colliding = Vec::new();
        for (i, (handle, a)) in snapshot.iter().enumerate() {
            let hit = snapshot
                .iter()
                .enumerate()
                .any(|(j, (_, b))| i != j && intersects(a, b));
            if hit {
                colliding.push(*handle);
            }
        }

        for handle in colliding {
            if let Some(collider) = self.collider_mut(handle) {
                collider.is_colliding = true;
            }
        }
    }

    /// Queues an overlay image for every visible collider: full colour when
    /// colliding, grayscale otherwise. Resets all `is_colliding` flags.
    pub fn draw_colliders(&mut self, camera: &mut Camera<'_>) {
        for collider in <&mut Collider>::query().iter_mut(&mut self.world) {
            if collider.is_visible {
                let color = if collider.is_colliding {
                    collider.color
                } else {
                    grayscale(collider.color)
                };
                let (min, _) = collider.bounds();
                let image = shape_image(&collider.shape, color);
                camera.add_to_overlay(Cow::Owned(image), min.x, min.y);
            }
            collider.is_colliding = false;
        }
    }
}

fn grayscale(color: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8;
    Rgba([luma, luma, luma, a])
}

fn shape_image(shape: &Shape, color: Rgba<u8>) -> RgbaImage {
    match *shape {
        Shape::Rect { size } => {
            let width = size.x.ceil().max(1.0) as u32;
            let height = size.y.ceil().max(1.0) as u32;
            RgbaImage::from_pixel(width, height, color)
        }
        Shape::Circle { radius } => {
            let diameter = (radius * 2.0).ceil().max(1.0) as u32;
            RgbaImage::from_fn(diameter, diameter, |x, y| {
                let dx = x as f32 + 0.5 - radius;
                let dy = y as f32 + 0.5 - radius;
                if dx * dx + dy * dy <= radius * radius {
                    color
                } else {
                    Rgba([0, 0, 0, 0])
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::math::vec2;
    use crate::game::tilemap::TileSet;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Collider {
        Collider::rect(vec2(x, y), vec2(w, h))
    }

    #[test]
    fn registry_add_and_remove() {
        let mut world = PhysicsWorld::new();
        let a = world.add_collider(rect(0.0, 0.0, 4.0, 4.0));
        let b = world.add_collider(rect(8.0, 0.0, 4.0, 4.0));
        assert_eq!(world.collider_count(), 2);

        assert!(world.remove(a));
        assert!(!world.remove(a));
        assert_eq!(world.collider_count(), 1);
        assert!(world.collider(a).is_none());
        assert!(world.collider(b).is_some());
    }

    #[test]
    fn queries_split_bodies_and_areas() {
        let mut world = PhysicsWorld::new();
        let probe = world.add_collider(rect(0.0, 0.0, 10.0, 10.0));
        let wall = world.add_collider(rect(5.0, 0.0, 10.0, 10.0));
        let zone = world.add_collider(Collider::circle(vec2(5.0, 5.0), 2.0).area());
        let _far = world.add_collider(rect(100.0, 100.0, 1.0, 1.0));

        let all = world.get_collisions(probe);
        assert_eq!(all.len(), 2);
        assert!(all.contains(&wall) && all.contains(&zone));

        assert_eq!(world.get_body_collisions(probe), vec![wall]);
        assert_eq!(world.get_area_collisions(probe), vec![zone]);
        assert!(world.collider(probe).map_or(false, |c| c.is_colliding));
    }

    #[test]
    fn tile_collisions_are_not_registered() {
        let mut tilemap = Tilemap::new(TileSet::generated(16), 8, 16);
        tilemap.set_tile(crate::engine::math::tile_pos(1, 0), TileSet::GENERATED_WALL).unwrap();

        let mut world = PhysicsWorld::new();
        let probe = world.add_collider(rect(10.0, 2.0, 10.0, 10.0));
        let contacts = world.get_tile_collisions(probe, &tilemap);

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].tile, crate::engine::math::tile_pos(1, 0));
        assert_eq!(contacts[0].collider.position, vec2(16.0, 0.0));
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn collide_all_flags_overlapping_pairs_and_draw_resets() {
        let mut world = PhysicsWorld::new();
        let red = Rgba([255, 0, 0, 255]);
        let a = world.add_collider(rect(0.0, 0.0, 10.0, 10.0).visible(red));
        let b = world.add_collider(rect(5.0, 5.0, 10.0, 10.0));
        let c = world.add_collider(Collider::circle(vec2(50.0, 50.0), 3.0).visible(red));

        world.collide_all();
        assert!(world.collider(a).unwrap().is_colliding);
        assert!(world.collider(b).unwrap().is_colliding);
        assert!(!world.collider(c).unwrap().is_colliding);

        let mut camera = Camera::new(vec2(0.0, 0.0), (64, 64));
        world.draw_colliders(&mut camera);
        assert_eq!(camera.queued(), 2);
        assert!(!world.collider(a).unwrap().is_colliding);

        let mut frame = RgbaImage::new(64, 64);
        camera.flush(&mut frame);
        // colliding rect keeps its colour, idle circle is drawn gray
        assert_eq!(*frame.get_pixel(1, 1), red);
        assert_eq!(*frame.get_pixel(50, 50), grayscale(red));
    }
}
