//! Integration tests for the lyra facade

mod config_files;
