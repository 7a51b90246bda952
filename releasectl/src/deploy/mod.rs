//! Deployment module

pub mod git;
pub mod health;
pub mod pipeline;
pub mod runner;
pub mod stage;
