pub mod config;
pub mod sort_metric;
pub mod task;

pub use config::*;
pub use sort_metric::*;
pub use task::*;
