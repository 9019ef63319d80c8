//! Command-line front end for the TLS subscription lifecycle engine

pub mod config;
