//! Library half of the `boardsel` binary: config file loading and merging.

pub mod config;
