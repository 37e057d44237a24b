//! # Connections Module
//!
//! This module handles persistent connections to external services.

/// Module for PostgreSQL database connection pooling and management.
pub mod db_postgres;
