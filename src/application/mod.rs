pub mod camera;
pub mod engine;

pub use camera::Camera;
pub use engine::{EdgePolicy, Engine, RuleKind};
