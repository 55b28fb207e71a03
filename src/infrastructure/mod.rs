//! Infrastructure adapters

pub mod database;
