pub mod config;
pub mod window;

pub use config::FlowConfig;
pub use window::*;
