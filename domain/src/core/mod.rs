//! Core domain types shared by every phase

pub mod error;
pub mod persona;
pub mod string;
