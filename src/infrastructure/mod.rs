//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Brains and directory persistence
//! - Database: SQLite brain
//! - Adapters: Channel integrations

pub mod config;
pub mod storage;
pub mod database;
pub mod adapters;
