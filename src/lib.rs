pub mod clock;
pub mod config;
pub mod domain;
pub mod logging;
pub mod ports;
pub mod services;
pub mod spotify_rs;

#[cfg(test)]
pub mod test_utils;
