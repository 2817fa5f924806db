pub mod angle;
pub mod keypoint;

pub use angle::{angle, distance, knee_angle, trunk_tilt_vertical, trunk_to_thigh};
pub use keypoint::{Frame, Landmark, LandmarkKind, Side};
