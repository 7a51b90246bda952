//! Deployment root storage

pub mod layout;
