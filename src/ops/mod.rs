pub mod completion;
pub mod fake_api;
pub mod session;
pub mod sort;
pub mod store_api;
pub mod task_api;
pub mod xp_bar;
pub mod xp_controller;
