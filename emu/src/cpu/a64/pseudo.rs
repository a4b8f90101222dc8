//! Simulator pseudo instructions.
//!
//! Group `[28:25] = 0000` is unallocated in the architecture, so a handful
//! of words in it are taken over to talk to the host.

use crate::cpu::decode::unallocated;
use crate::cpu::interpreter::{CalloutKind, Interpreter};
use crate::cpu::status::{ExecResult, Status};

/// Stops the simulation.
pub const HALT: u32 = 0xE000_0000;

/// Hands control to the host.
pub const CALLOUT: u32 = 0x0001_8000;

/// Hands control to the host, which leaves a result in `X0`.
pub const CALLOUT_WITH_RESULT: u32 = 0x0001_8001;

/// Logs the current PC and carries on.
pub const NOTIFY: u32 = 0x0001_4000;

impl Interpreter {
    pub(crate) fn pseudo(&mut self, word: u32) -> ExecResult {
        match word {
            HALT => Ok(Status::Halt),
            CALLOUT => self.request_callout(CalloutKind::Call),
            CALLOUT_WITH_RESULT => self.request_callout(CalloutKind::CallWithResult),
            NOTIFY => {
                tracing::debug!("notify at {:#018X}", self.state.pc);
                Ok(Status::Ready)
            }
            _ => Err(unallocated(word, "pseudo instruction")),
        }
    }
}
