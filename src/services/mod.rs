pub mod cache;
pub mod music;
pub mod spotify;
