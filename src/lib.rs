pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod documents;
pub mod error;
pub mod model;
pub mod models;
pub mod registers;
pub mod routes;
pub mod scheduling;
pub mod store;
pub mod utils;
