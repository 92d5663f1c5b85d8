//! Storage abstractions for service layer
//!
//! Contains the file-backed JSON map that backs the local key-value substrate.

pub mod json_map_store;
