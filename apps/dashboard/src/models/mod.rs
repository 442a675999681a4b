pub mod article;
pub mod chess_log;
pub mod email_settings;
pub mod goal;
pub mod log;
pub mod media;
pub mod quantifier;
pub mod quiz;
pub mod todo;
