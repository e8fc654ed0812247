pub mod account;
pub mod engagement;
pub mod homepage;
pub mod profile;
pub mod quiz;
pub mod video;
