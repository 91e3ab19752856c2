//! Integration tests for Coffer

mod cli;
mod datastore;
