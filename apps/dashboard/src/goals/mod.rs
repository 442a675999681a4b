pub mod coverage;
pub mod handlers;
pub mod service;
