pub mod handlers;
pub mod sanitize;
pub mod service;
pub mod slug;
