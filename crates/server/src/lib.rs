pub mod app;
pub mod auth;
pub mod config;
pub mod doc;
pub mod dtos;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod utils;
