#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod bitwise;

pub mod config;
pub mod cpu;

#[allow(clippy::missing_panics_doc)]
#[allow(clippy::cast_possible_truncation)]
pub mod memory;
