pub mod app;
pub mod import;
pub mod render;
pub mod telemetry;

pub use app::run as run_app;
