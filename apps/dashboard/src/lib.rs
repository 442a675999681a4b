pub mod articles;
pub mod audit;
pub mod chess;
pub mod config;
pub mod db;
pub mod digest;
pub mod errors;
pub mod goals;
pub mod mail;
pub mod media;
pub mod models;
pub mod portfolio;
pub mod quantifiers;
pub mod quiz;
pub mod routes;
pub mod state;
pub mod todos;
