//! Result formatting and live output

pub mod console;
pub mod formatter;
pub mod stream;
