#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_lossless)]
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::similar_names)]
#[allow(clippy::unreadable_literal)]
#[allow(clippy::unnecessary_wraps)]
mod a64;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_sign_loss)]
pub mod alu;
pub mod condition;
pub mod decode;

#[allow(clippy::cast_possible_truncation)]
pub mod flags;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::module_name_repetitions)]
pub mod interpreter;
pub mod psr;
pub mod registers;
pub mod state;
pub mod status;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
pub mod vector;
