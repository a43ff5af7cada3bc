pub mod api;
pub mod audit;
pub mod config;
pub mod models;
pub mod redirect;
pub mod registry;
pub mod routes;
