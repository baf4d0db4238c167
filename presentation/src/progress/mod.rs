//! Progress reporting for consensus runs

pub mod reporter;
