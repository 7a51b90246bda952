//! releasectl
//!
//! Builds immutable release directories on a host, activates them by
//! swapping a `current` symlink and verifies the result over HTTP.

pub mod config;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod release;
pub mod storage;
pub mod utils;
