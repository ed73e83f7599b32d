//! Command implementations

pub mod inspect;
pub mod settings;
pub mod simulate;
