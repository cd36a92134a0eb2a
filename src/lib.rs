// Vector math and viewer orientation
pub mod geometry;

// Detectable object metadata and text rendering
pub mod descriptor;

// Ray-sampled field of view with decaying visibility registry
pub mod perception;

// Agent-to-agent speech broadcast
pub mod speech;

// Dialogue backend session client
pub mod session;

// Agent wiring: perception loop + session loop
pub mod agent;

// Read-only diagnostic overlay over the visibility registry
pub mod overlay;

// Sphere-collider demo scene implementing the raycast boundary
pub mod scene;

// TOML configuration
pub mod config;
