pub mod scene;
pub mod scenes;

pub use scene::Scene;
