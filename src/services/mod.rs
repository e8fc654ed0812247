pub mod auth;
pub mod engagement;
pub mod quiz;
pub mod upload;
