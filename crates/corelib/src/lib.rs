//! Core types: math re-exports, Transform, normal matrix helpers.

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, vec2, vec3};

pub mod transform;
