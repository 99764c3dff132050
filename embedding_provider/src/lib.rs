//! Text embedding providers with a fixed output dimension.

pub mod config;
pub mod embedder;
