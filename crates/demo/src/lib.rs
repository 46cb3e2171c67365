//! A simulated character for trying out waits.
pub mod character;
