//! Release lifecycle: naming, allocation and activation

pub mod id;
pub mod pointer;
pub mod store;
