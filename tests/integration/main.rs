//! Integration tests

mod client_test;
mod config_test;
