pub mod task;
pub mod category;
pub mod ids;
pub mod config;

pub use task::*;
pub use category::*;
pub use ids::*;
pub use config::*;
