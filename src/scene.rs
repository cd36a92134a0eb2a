//! Sphere-collider scene implementing the raycast boundary.
//!
//! A demo/test harness, not a physics engine: objects are spheres carrying a
//! classification mask and a descriptor, and `cast_ray` reports the nearest
//! intersection within range.

use crate::descriptor::SharedDescriptor;
use crate::geometry::Vec3;
use crate::perception::{RayHit, Raycast};

/// One detectable sphere
pub struct SceneObject {
    pub center: Vec3,
    pub radius: f32,
    /// Classification bits matched against the ray's target mask
    pub mask: u32,
    pub descriptor: SharedDescriptor,
}

impl SceneObject {
    pub fn new(center: Vec3, radius: f32, mask: u32, descriptor: SharedDescriptor) -> Self {
        Self {
            center,
            radius,
            mask,
            descriptor,
        }
    }
}

/// Fixed set of sphere colliders
#[derive(Default)]
pub struct StaticScene {
    objects: Vec<SceneObject>,
}

impl StaticScene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self { objects }
    }

    pub fn push(&mut self, object: SceneObject) {
        self.objects.push(object);
    }
}

/// Distance along the ray to the first intersection with the sphere, if any
fn ray_sphere_distance(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center.sub(origin);
    let projection = to_center.dot(direction);
    let closest_sq = to_center.dot(to_center) - projection * projection;
    let radius_sq = radius * radius;

    if closest_sq > radius_sq {
        return None;
    }

    let half_chord = (radius_sq - closest_sq).sqrt();
    let near = projection - half_chord;
    let far = projection + half_chord;

    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        // Origin inside the sphere
        Some(0.0)
    } else {
        None
    }
}

impl Raycast for StaticScene {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<RayHit> {
        let direction = direction.normalized();
        let mut nearest: Option<(f32, &SceneObject)> = None;

        for object in &self.objects {
            if object.mask & mask == 0 {
                continue;
            }
            let distance = match ray_sphere_distance(origin, direction, object.center, object.radius)
            {
                Some(d) if d <= max_distance => d,
                _ => continue,
            };
            match nearest {
                Some((best, _)) if best <= distance => {}
                _ => nearest = Some((distance, object)),
            }
        }

        nearest.map(|(distance, object)| RayHit {
            distance,
            descriptor: Some(object.descriptor.clone()),
        })
    }
}
