//! Integration tests for lyra-abr

mod manifest_files;
mod policy_properties;
