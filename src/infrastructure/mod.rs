//! Infrastructure layer - chain access and caching

pub mod cache;
pub mod chain;
