pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
