//! Task Champion: a Taskwarrior-compatible task list split into modules,
//! with XP bars that fill as tasks are completed.
//!
//! The crate is layered: `model` holds plain data, `ops` the task
//! repository and XP engine, `io` persistence, and `cli` the `tc` front end.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
