//! Shared utilities used across the core

pub mod codec;
pub mod images;
pub mod logging;
