//! Unit tests for the agent embedder
//!
//! These tests drive the application services against real archives in
//! temporary directories, with in-memory reporters.

mod architecture;
mod embed_service;
mod helpers;
