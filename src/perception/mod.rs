//! Ray-sampled field of view with a decaying visibility registry.
//!
//! [`PerceptionField::tick`] runs a decay pass over the registry, then samples
//! a grid of rays across the configured view cone through the external
//! [`Raycast`] collaborator. A hit carrying a descriptor either inserts a
//! fresh registry entry or refreshes the entry's last-seen time, so an object
//! stays "known" for the memory window after it leaves the literal line of
//! sight.

use crate::descriptor::SharedDescriptor;
use crate::geometry::{cone_direction, Pose, Vec3};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};


/// Practical minimum grid resolution (also keeps the step divisors positive)
pub const MIN_RESOLUTION: u32 = 5;

/// Result of a single ray cast
pub struct RayHit {
    /// Distance from the ray origin to the hit surface
    pub distance: f32,
    /// Descriptor carried by the hit surface, if any
    pub descriptor: Option<SharedDescriptor>,
}

/// External raycast collaborator boundary.
///
/// Implementations return the nearest hit within `max_distance` whose
/// classification intersects `mask`, synchronously and without error.
pub trait Raycast: Send + Sync {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32)
        -> Option<RayHit>;
}

/// One remembered entity in the visibility registry
#[derive(Clone)]
pub struct DetectedObject {
    /// Non-owning reference to the entity's descriptor
    pub descriptor: SharedDescriptor,
    /// Monotonic timestamp of the most recent detection
    pub last_seen: Instant,
}

/// Insertion-ordered registry of currently remembered entities.
///
/// Mutated only by [`PerceptionField::tick`]; readers take a snapshot.
#[derive(Default)]
pub struct VisibilityRegistry {
    entries: Vec<(String, DetectedObject)>,
}

impl VisibilityRegistry {
    fn decay(&mut self, now: Instant, window: Duration) {
        self.entries
            .retain(|(_, obj)| now.saturating_duration_since(obj.last_seen) <= window);
    }

    fn record(&mut self, id: &str, descriptor: &SharedDescriptor, now: Instant) {
        match self.entries.iter_mut().find(|(key, _)| key == id) {
            Some((_, obj)) => obj.last_seen = now,
            None => self.entries.push((
                id.to_string(),
                DetectedObject {
                    descriptor: descriptor.clone(),
                    last_seen: now,
                },
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the current entries in insertion order
    pub fn snapshot(&self) -> Vec<DetectedObject> {
        self.entries.iter().map(|(_, obj)| obj.clone()).collect()
    }
}

/// Registry handle shared with read-only consumers (context composer, overlay)
pub type SharedRegistry = Arc<Mutex<VisibilityRegistry>>;

/// View cone parameters
#[derive(Debug, Clone)]
pub struct FieldSettings {
    /// Full horizontal cone width in degrees (clamped to 0–180)
    pub horizontal_fov_deg: f32,
    /// Full vertical cone width in degrees (clamped to 0–180)
    pub vertical_fov_deg: f32,
    /// Ray grid columns (clamped to at least [`MIN_RESOLUTION`])
    pub resolution_width: u32,
    /// Ray grid rows (clamped to at least [`MIN_RESOLUTION`])
    pub resolution_height: u32,
    /// Ray length
    pub view_radius: f32,
    /// Target classification mask
    pub target_mask: u32,
    /// How long an entity stays remembered after its last detection
    pub memory_window: Duration,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            horizontal_fov_deg: 180.0,
            vertical_fov_deg: 180.0,
            resolution_width: 640,
            resolution_height: 360,
            view_radius: 10.0,
            target_mask: u32::MAX,
            memory_window: Duration::from_secs(20),
        }
    }
}

impl FieldSettings {
    /// Clamp degenerate values before sampling begins
    fn sanitized(mut self) -> Self {
        self.horizontal_fov_deg = self.horizontal_fov_deg.clamp(0.0, 180.0);
        self.vertical_fov_deg = self.vertical_fov_deg.clamp(0.0, 180.0);
        self.resolution_width = self.resolution_width.max(MIN_RESOLUTION);
        self.resolution_height = self.resolution_height.max(MIN_RESOLUTION);
        self
    }
}

/// Samples the view cone and maintains the decaying visibility registry
pub struct PerceptionField {
    settings: FieldSettings,
    raycaster: Arc<dyn Raycast>,
    registry: SharedRegistry,
}

impl PerceptionField {
    pub fn new(settings: FieldSettings, raycaster: Arc<dyn Raycast>) -> Self {
        Self {
            settings: settings.sanitized(),
            raycaster,
            registry: Arc::new(Mutex::new(VisibilityRegistry::default())),
        }
    }

    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    /// Shared read-only handle for context composition and diagnostics
    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    /// One perception step: decay pass, then the sampling pass.
    pub fn tick(&self, pose: Pose, now: Instant) {
        let mut registry = self.registry.lock().unwrap();
        registry.decay(now, self.settings.memory_window);

        let s = &self.settings;
        let h_step = s.horizontal_fov_deg / (s.resolution_width - 1) as f32;
        let v_step = s.vertical_fov_deg / (s.resolution_height - 1) as f32;

        for y in 0..s.resolution_height {
            for x in 0..s.resolution_width {
                let angle_h = -s.horizontal_fov_deg / 2.0 + h_step * x as f32;
                let angle_v = -s.vertical_fov_deg / 2.0 + v_step * y as f32;

                let direction = cone_direction(pose.orientation, angle_v, angle_h);
                let hit = match self.raycaster.cast_ray(
                    pose.position,
                    direction,
                    s.view_radius,
                    s.target_mask,
                ) {
                    Some(hit) => hit,
                    None => continue,
                };

                // A hit surface without a descriptor is not detectable
                let descriptor = match hit.descriptor {
                    Some(d) => d,
                    None => continue,
                };

                let id = descriptor.read().unwrap().id().to_string();
                registry.record(&id, &descriptor, now);
            }
        }
    }
}

/// Level of per-object detail in a rendered registry summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// `render_short` per object — bounded payload for dialogue context
    Short,
    /// `render_full` per object — diagnostics
    Full,
}

/// Human-readable summary of a registry snapshot.
///
/// Empty registry renders as `No objects are visible.`; otherwise a counted
/// header followed by one `- <description>` line per remembered object.
pub fn describe_registry(snapshot: &[DetectedObject], detail: Detail) -> String {
    if snapshot.is_empty() {
        return "No objects are visible.".to_string();
    }

    let mut out = format!("The following objects ({}) are visible:\n", snapshot.len());
    for obj in snapshot {
        let descriptor = obj.descriptor.read().unwrap();
        let line = match detail {
            Detail::Short => descriptor.render_short(),
            Detail::Full => descriptor.render_full(),
        };
        out.push_str(&format!("- {}\n", line));
    }
    out
}
