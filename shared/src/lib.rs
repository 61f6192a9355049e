pub mod auth;
pub mod mail;
pub mod models;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
