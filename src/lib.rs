pub mod auth;
pub mod availability;
pub mod booking;
pub mod db;
pub mod error;
pub mod mail;
pub mod models;
pub mod rating;
pub mod routes;
pub mod state;
pub mod store;
