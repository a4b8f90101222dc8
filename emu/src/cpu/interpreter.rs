//! # Interpreter
//!
//! Owns one simulated machine and drives it:
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   PC == return sentinel? ──yes──► Return                  │
//!            │ no                                           │
//!   fetch word at PC, stage next PC = PC + 4                │
//!            │                                              │
//!   decode + execute ──Err──► Error (kind kept)             │
//!            │ Ok(status)                                   │
//!            ├── Ready ──► commit next PC ──────────────────┘
//!            ├── Break ──► commit next PC, hand back Break, stay Ready
//!            ├── Callout ► commit next PC, wait for `resume`
//!            └── Halt ───► stop
//! ```
//!
//! Everything an embedder (debugger bridge, loader, CLI) needs goes through
//! the public methods here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SimConfig;
use crate::cpu::decode;
use crate::cpu::registers::{R31, REG_FP, REG_LR};
use crate::cpu::state::MachineState;
use crate::cpu::status::{ErrorKind, ExecResult, Status};
use crate::memory::{BlockOverlap, Memory, MemoryBlock, MemoryFault};

/// Link register value that marks a return from the outermost frame.
pub const RETURN_PC: u64 = 0xFFFF_FFFF_FFFF_FFEC;

/// Register number of the program counter in the peek/poke interface.
pub const REGNO_PC: usize = 64;
pub const REGNO_NZCV: usize = 65;
pub const REGNO_FPSR: usize = 66;

/// One loadable piece of a program image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub base: u64,
    pub bytes: Vec<u8>,
    pub mem_len: u64,
    pub writable: bool,
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("heap start 0x{heap_start:016X} is not below the stack top 0x{stack_top:016X}")]
    EmptyStack { heap_start: u64, stack_top: u64 },

    #[error("segment at 0x{base:016X} has {file_len} file bytes but only {mem_len} bytes of memory")]
    SegmentTooLarge {
        base: u64,
        file_len: usize,
        mem_len: u64,
    },

    #[error("block at 0x{base:016X} of {len} bytes cannot be allocated")]
    Unaddressable { base: u64, len: u64 },

    #[error(transparent)]
    Overlap(#[from] BlockOverlap),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalloutKind {
    /// Host call without a result.
    Call,

    /// Host call whose result goes to `X0`.
    CallWithResult,

    /// `SVC #imm`.
    Supervisor(u16),
}

/// A pending request for the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callout {
    pub kind: CalloutKind,
    pub instruction: u32,
    pub pc: u64,
}

pub struct Interpreter {
    pub state: MachineState,
    pub memory: Memory,

    config: SimConfig,
    status: Status,
    error: ErrorKind,

    /// Word being executed.
    instruction: u32,

    /// Instructions fetched since `init`.
    retired: u64,
    fault: Option<MemoryFault>,
    callout: Option<Callout>,

    /// Lowest legal stack pointer, set by `init`.
    stack_limit: Option<u64>,

    /// Address and size armed by the last load-exclusive.
    pub(crate) exclusive: Option<(u64, usize)>,
}

impl Interpreter {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            state: MachineState::default(),
            memory: Memory::new(),
            config,
            status: Status::Ready,
            error: ErrorKind::None,
            instruction: 0,
            retired: 0,
            fault: None,
            callout: None,
            stack_limit: None,
            exclusive: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Places every loadable segment into its own memory block.
    ///
    /// # Errors
    ///
    /// Fails on malformed or overlapping segments. Blocks added before the
    /// failing segment stay registered.
    pub fn load(&mut self, segments: &[Segment]) -> Result<(), SetupError> {
        for segment in segments {
            if segment.debug || segment.mem_len == 0 {
                continue;
            }

            if segment.bytes.len() as u64 > segment.mem_len {
                return Err(SetupError::SegmentTooLarge {
                    base: segment.base,
                    file_len: segment.bytes.len(),
                    mem_len: segment.mem_len,
                });
            }

            let len = usize::try_from(segment.mem_len).map_err(|_| SetupError::Unaddressable {
                base: segment.base,
                len: segment.mem_len,
            })?;
            self.memory.add_block(MemoryBlock::new(
                segment.base,
                len,
                segment.writable,
                &segment.bytes,
            ))?;
        }

        Ok(())
    }

    /// Creates the stack and heap block, from `heap_start` (or the default
    /// heap size below the stack top) up to the stack top, and points the
    /// machine at `entry`.
    ///
    /// # Errors
    ///
    /// Fails when the block would be empty or overlaps a loaded segment.
    pub fn init(&mut self, entry: u64, heap_start: Option<u64>) -> Result<(), SetupError> {
        let stack_top = self.config.stack_top;
        let heap_start = heap_start
            .unwrap_or_else(|| stack_top.saturating_sub(self.config.default_heap_size));

        if heap_start >= stack_top {
            return Err(SetupError::EmptyStack {
                heap_start,
                stack_top,
            });
        }

        let len = stack_top - heap_start;
        let block_len = usize::try_from(len).map_err(|_| SetupError::Unaddressable {
            base: heap_start,
            len,
        })?;
        self.memory
            .add_block(MemoryBlock::new(heap_start, block_len, true, &[]))?;

        self.state.set_sp(stack_top);
        self.state.set_x(REG_FP, stack_top);
        self.state.set_x(REG_LR, RETURN_PC);
        self.state.pc = entry;
        self.state.next_pc = entry;

        self.status = Status::Ready;
        self.error = ErrorKind::None;
        self.callout = None;
        self.fault = None;
        self.retired = 0;
        self.stack_limit = Some(heap_start);

        tracing::info!("entry {entry:#018X}, heap {heap_start:#018X}, stack top {stack_top:#018X}");

        Ok(())
    }

    /// Executes one instruction.
    pub fn step(&mut self) -> Status {
        if self.status != Status::Ready {
            return self.status;
        }

        let pc = self.state.pc;
        if pc == RETURN_PC {
            self.status = Status::Return;
            return self.status;
        }

        let word = self.memory.read::<u32>(pc);
        if let Err(kind) = self.check_memory() {
            return self.fail(kind);
        }

        self.instruction = word;
        self.retired += 1;
        self.state.next_pc = pc.wrapping_add(4);
        if self.config.trace {
            tracing::trace!("{pc:#018X}: {word:#010X}");
        }

        let result = decode::execute(self, word).and_then(|status| {
            // Catch executors that touched memory without checking.
            self.check_memory()?;
            Ok(status)
        });

        match result {
            Ok(Status::Ready) => {
                self.state.commit_pc();
                self.check_stack()
            }
            Ok(Status::Break) => {
                self.state.commit_pc();
                match self.check_stack() {
                    Status::Ready => Status::Break,
                    status => status,
                }
            }
            Ok(Status::Callout) => {
                self.state.commit_pc();
                self.status = Status::Callout;
                self.status
            }
            Ok(Status::Error) => self.fail(ErrorKind::ClientError),
            Ok(status) => {
                self.status = status;
                self.status
            }
            Err(kind) => self.fail(kind),
        }
    }

    /// Steps until something other than [`Status::Ready`] comes up, or until
    /// the configured instruction budget is spent. The budget covers every
    /// instruction since `init`, across resumed runs.
    pub fn run(&mut self) -> Status {
        let start = self.retired;

        let status = loop {
            if self
                .config
                .max_instructions
                .is_some_and(|max| self.retired >= max)
            {
                break self.status;
            }

            let status = self.step();
            if status != Status::Ready {
                break status;
            }
        };

        tracing::info!(
            "run stopped: {status} ({}), pc {:#018X}, {} instructions",
            self.error,
            self.state.pc,
            self.retired - start
        );

        status
    }

    /// Instructions fetched since `init`.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub const fn error(&self) -> ErrorKind {
        self.error
    }

    /// Human readable description of the current error.
    #[must_use]
    pub fn error_text(&self) -> String {
        match (self.error, self.fault) {
            (ErrorKind::MemoryException, Some(fault)) => format!("{}: {fault}", self.error),
            (error, _) => error.to_string(),
        }
    }

    /// The last instruction word fetched.
    #[must_use]
    pub const fn instruction(&self) -> u32 {
        self.instruction
    }

    /// The pending request while the status is [`Status::Callout`].
    #[must_use]
    pub const fn callout(&self) -> Option<&Callout> {
        self.callout.as_ref()
    }

    /// Acknowledges a callout so execution can continue. A breakpoint needs
    /// no acknowledgement, the interpreter is `Ready` again right after it.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ClientError`] when there is no pending callout.
    pub fn resume(&mut self) -> Result<(), ErrorKind> {
        match self.status {
            Status::Callout => {
                self.status = Status::Ready;
                self.callout = None;
                Ok(())
            }
            status => {
                tracing::warn!("resume called while {status}");
                Err(ErrorKind::ClientError)
            }
        }
    }

    /// Byte width of register `regno` in the peek/poke interface.
    #[must_use]
    pub const fn register_width(regno: usize) -> Option<usize> {
        match regno {
            0..=REGNO_PC => Some(8),
            REGNO_NZCV | REGNO_FPSR => Some(4),
            _ => None,
        }
    }

    /// Copies register `regno` into `buf` as little-endian bytes and
    /// returns its width.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ClientError`] for an unknown register or a short buffer.
    pub fn read_register(&self, regno: usize, buf: &mut [u8]) -> Result<usize, ErrorKind> {
        let width = self.checked_width(regno, buf.len())?;

        let value = match regno {
            0..=31 => self.state.registers.register_at(regno as u32, R31::Sp),
            32..=63 => self.state.vectors.lane::<u64>(regno as u32 - 32, 0),
            REGNO_PC => self.state.pc,
            REGNO_NZCV => u64::from(self.state.nzcv.bits()),
            _ => u64::from(self.state.fpsr.bits()),
        };
        buf[..width].copy_from_slice(&value.to_le_bytes()[..width]);

        Ok(width)
    }

    /// Sets register `regno` from little-endian `bytes`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ClientError`] for an unknown register or short input.
    pub fn write_register(&mut self, regno: usize, bytes: &[u8]) -> Result<(), ErrorKind> {
        let width = self.checked_width(regno, bytes.len())?;

        let mut raw = [0_u8; 8];
        raw[..width].copy_from_slice(&bytes[..width]);
        let value = u64::from_le_bytes(raw);

        match regno {
            0..=31 => self
                .state
                .registers
                .set_register_at(regno as u32, value, R31::Sp),
            32..=63 => self.state.vectors.set_lane(regno as u32 - 32, 0, value),
            REGNO_PC => {
                self.state.pc = value;
                self.state.next_pc = value;
            }
            REGNO_NZCV => self.state.nzcv = crate::cpu::psr::Nzcv::from_bits(value as u32),
            _ => self.state.fpsr = crate::cpu::psr::Fpsr::from_bits(value as u32),
        }

        Ok(())
    }

    fn checked_width(&self, regno: usize, available: usize) -> Result<usize, ErrorKind> {
        match Self::register_width(regno) {
            Some(width) if width <= available => Ok(width),
            _ => {
                tracing::warn!("bad register access: {regno} with {available} bytes");
                Err(ErrorKind::ClientError)
            }
        }
    }

    /// Debugger read of guest memory.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::MemoryException`] when the range is not in one block.
    pub fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), ErrorKind> {
        self.memory.load_block(address, buf).map_err(|fault| {
            tracing::warn!("{fault}");
            ErrorKind::MemoryException
        })
    }

    /// Debugger write of guest memory, allowed on read-only blocks too.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::MemoryException`] when the range is not in one block.
    pub fn write_memory(&mut self, address: u64, bytes: &[u8]) -> Result<(), ErrorKind> {
        self.memory.store_block(address, bytes).map_err(|fault| {
            tracing::warn!("{fault}");
            ErrorKind::MemoryException
        })
    }

    /// Turns a pending memory fault into an error.
    pub(crate) fn check_memory(&mut self) -> Result<(), ErrorKind> {
        match self.memory.take_fault() {
            Some(fault) => {
                self.fault = Some(fault);
                Err(ErrorKind::MemoryException)
            }
            None => Ok(()),
        }
    }

    /// Records a host request; the interpreter waits in
    /// [`Status::Callout`] until [`resume`](Self::resume).
    pub(crate) fn request_callout(&mut self, kind: CalloutKind) -> ExecResult {
        self.callout = Some(Callout {
            kind,
            instruction: self.instruction,
            pc: self.state.pc,
        });
        Ok(Status::Callout)
    }

    fn check_stack(&mut self) -> Status {
        let sp = self.state.sp();
        if self.stack_limit.is_some_and(|limit| sp < limit) {
            return self.fail(ErrorKind::StackOverflow);
        }
        self.status
    }

    fn fail(&mut self, kind: ErrorKind) -> Status {
        self.status = Status::Error;
        self.error = kind;
        tracing::info!(
            "stopped at {:#018X} ({:#010X}): {}",
            self.state.pc,
            self.instruction,
            self.error_text()
        );
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::REG_SP;
    use pretty_assertions::assert_eq;

    const CODE: u64 = 0x1000;
    const DATA: u64 = 0x07F0_1000;

    fn program(words: &[u32]) -> Interpreter {
        let mut cpu = Interpreter::new(SimConfig::default());
        let bytes = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        cpu.load(&[Segment {
            base: CODE,
            bytes,
            mem_len: 0x1000,
            writable: false,
            debug: false,
        }])
        .unwrap();
        cpu.init(CODE, None).unwrap();
        cpu
    }

    #[test]
    fn movz() {
        let mut cpu = program(&[0xD282_4680]);
        assert_eq!(cpu.step(), Status::Ready);
        assert_eq!(cpu.state.x(0), 0x1234);
        assert_eq!(cpu.state.pc, CODE + 4);
    }

    #[test]
    fn movz_then_add() {
        // MOVZ X0, #0x1234; ADD X1, X0, #5
        let mut cpu = program(&[0xD282_4680, 0x9100_1401]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.state.x(1), 0x1239);
        assert_eq!(cpu.state.pc, CODE + 8);
    }

    #[test]
    fn cbz() {
        // CBZ X1, #8
        let mut cpu = program(&[0xB400_0041]);
        cpu.step();
        assert_eq!(cpu.state.pc, CODE + 8);

        let mut cpu = program(&[0xB400_0041]);
        cpu.state.set_x(1, 7);
        cpu.step();
        assert_eq!(cpu.state.pc, CODE + 4);
    }

    #[test]
    fn store_then_load_word() {
        // STR W2, [X3]; LDR W4, [X3]
        let mut cpu = program(&[0xB900_0062, 0xB940_0064]);
        cpu.state.set_x(2, 0xFFFF_FFFF_DEAD_BEEF);
        cpu.state.set_x(3, DATA);
        assert_eq!(cpu.run_for(2), Status::Ready);
        assert_eq!(cpu.state.x(4), 0xDEAD_BEEF);
        assert_eq!(cpu.memory.read::<u32>(DATA), 0xDEAD_BEEF);
    }

    #[test]
    fn adds_overflow() {
        // ADDS W0, W1, #1
        let mut cpu = program(&[0x3100_0420]);
        cpu.state.set_x(1, 0x7FFF_FFFF);
        cpu.step();
        assert_eq!(cpu.state.x(0), 0x8000_0000);
        let flags = cpu.state.nzcv;
        assert!(flags.overflow_flag());
        assert!(flags.sign_flag());
        assert!(!flags.zero_flag());
        assert!(!flags.carry_flag());
    }

    #[test]
    fn unallocated_bitfield_changes_nothing() {
        // SBFM W0, W1, #0, #7 with N=1
        let mut cpu = program(&[0x1340_1C20]);
        cpu.state.set_x(0, 0xAAAA);
        cpu.state.set_x(1, 0x80);
        let before = cpu.state.clone();

        assert_eq!(cpu.step(), Status::Error);
        assert_eq!(cpu.error(), ErrorKind::UnallocatedInstruction);
        assert_eq!(cpu.state.registers, before.registers);
        assert_eq!(cpu.state.pc, CODE);
        assert_eq!(cpu.error_text(), "unallocated instruction");

        // Stays stopped.
        assert_eq!(cpu.step(), Status::Error);
        assert_eq!(cpu.state.pc, CODE);
    }

    #[test]
    fn ret_to_sentinel_returns() {
        // RET
        let mut cpu = program(&[0xD65F_03C0]);
        assert_eq!(cpu.step(), Status::Ready);
        assert_eq!(cpu.state.pc, RETURN_PC);
        assert_eq!(cpu.step(), Status::Return);
        assert_eq!(cpu.run(), Status::Return);
    }

    #[test]
    fn brk_hands_back_break_and_stays_ready() {
        // BRK #0; MOVZ X0, #0x1234; HALT
        let mut cpu = program(&[0xD420_0000, 0xD282_4680, 0xE000_0000]);
        assert_eq!(cpu.run(), Status::Break);
        assert_eq!(cpu.status(), Status::Ready);
        assert_eq!(cpu.state.pc, CODE + 4);
        assert_eq!(cpu.resume(), Err(ErrorKind::ClientError));
        assert_eq!(cpu.run(), Status::Halt);
        assert_eq!(cpu.state.x(0), 0x1234);
        assert_eq!(cpu.state.pc, CODE + 8);
    }

    #[test]
    fn svc_waits_for_resume() {
        // SVC #0x2A; MOVZ X0, #0x1234
        let mut cpu = program(&[0xD400_0541, 0xD282_4680]);
        assert_eq!(cpu.run(), Status::Callout);
        assert_eq!(
            cpu.callout(),
            Some(&Callout {
                kind: CalloutKind::Supervisor(0x2A),
                instruction: 0xD400_0541,
                pc: CODE,
            })
        );
        assert_eq!(cpu.state.pc, CODE + 4);

        // Not resumed yet.
        assert_eq!(cpu.step(), Status::Callout);
        assert_eq!(cpu.state.x(0), 0);

        cpu.resume().unwrap();
        assert!(cpu.callout().is_none());
        assert_eq!(cpu.step(), Status::Ready);
        assert_eq!(cpu.state.x(0), 0x1234);
        assert_eq!(cpu.resume(), Err(ErrorKind::ClientError));
    }

    #[test]
    fn pseudo_callout_with_result() {
        let mut cpu = program(&[0x0001_8001]);
        assert_eq!(cpu.step(), Status::Callout);
        assert_eq!(
            cpu.callout().map(|c| c.kind),
            Some(CalloutKind::CallWithResult)
        );
        cpu.write_register(0, &42_u64.to_le_bytes()).unwrap();
        cpu.resume().unwrap();
        assert_eq!(cpu.state.x(0), 42);
    }

    #[test]
    fn fetch_outside_memory_is_a_memory_exception() {
        let mut cpu = program(&[0xD61F_0000]); // BR X0
        cpu.state.set_x(0, 0xDEAD_0000);
        assert_eq!(cpu.run(), Status::Error);
        assert_eq!(cpu.error(), ErrorKind::MemoryException);
        assert_eq!(cpu.state.pc, 0xDEAD_0000);
        assert!(cpu.error_text().contains("0x00000000DEAD0000"));
    }

    #[test]
    fn load_from_unmapped_memory_stops_with_zero() {
        // LDR W4, [X3]
        let mut cpu = program(&[0xB940_0064]);
        cpu.state.set_x(3, 0x10);
        cpu.state.set_x(4, 0x55);
        assert_eq!(cpu.step(), Status::Error);
        assert_eq!(cpu.error(), ErrorKind::MemoryException);
        assert_eq!(cpu.state.x(4), 0);
        assert_eq!(cpu.state.pc, CODE);
    }

    #[test]
    fn stack_overflow() {
        // SUB SP, SP, #2, LSL #12
        let mut cpu = Interpreter::new(SimConfig::default());
        cpu.load(&[Segment {
            base: CODE,
            bytes: 0xD140_0BFF_u32.to_le_bytes().to_vec(),
            mem_len: 4,
            writable: false,
            debug: false,
        }])
        .unwrap();
        let top = cpu.config().stack_top;
        cpu.init(CODE, Some(top - 0x1000)).unwrap();

        assert_eq!(cpu.step(), Status::Error);
        assert_eq!(cpu.error(), ErrorKind::StackOverflow);
        assert_eq!(cpu.state.sp(), top - 0x2000);
    }

    #[test]
    fn instruction_budget() {
        // B .
        let mut cpu = program(&[0x1400_0000]);
        cpu.config.max_instructions = Some(100);
        assert_eq!(cpu.run(), Status::Ready);
        assert_eq!(cpu.state.pc, CODE);
        assert_eq!(cpu.retired(), 100);
    }

    #[test]
    fn budget_spans_resumed_runs() {
        // SVC #0; B .-4
        let mut cpu = program(&[0xD400_0001, 0x17FF_FFFF]);
        cpu.config.max_instructions = Some(7);

        let mut callouts = 0;
        while cpu.run() == Status::Callout {
            callouts += 1;
            cpu.resume().unwrap();
        }

        assert_eq!(cpu.status(), Status::Ready);
        assert_eq!(cpu.retired(), 7);
        assert_eq!(callouts, 4);
    }

    #[test]
    fn register_peek_poke() {
        let mut cpu = program(&[]);
        let mut buf = [0_u8; 8];

        cpu.write_register(5, &0x1122_3344_5566_7788_u64.to_le_bytes())
            .unwrap();
        assert_eq!(cpu.read_register(5, &mut buf), Ok(8));
        assert_eq!(u64::from_le_bytes(buf), 0x1122_3344_5566_7788);

        assert_eq!(cpu.read_register(REG_SP as usize, &mut buf), Ok(8));
        assert_eq!(u64::from_le_bytes(buf), cpu.config().stack_top);

        cpu.write_register(32 + 3, &1.5_f64.to_le_bytes()).unwrap();
        assert_eq!(cpu.state.d(3), 1.5);

        cpu.write_register(REGNO_NZCV, &0xF000_0000_u32.to_le_bytes())
            .unwrap();
        assert_eq!(cpu.read_register(REGNO_NZCV, &mut buf), Ok(4));
        assert_eq!(&buf[..4], &0xF000_0000_u32.to_le_bytes());
        assert_eq!(Interpreter::register_width(REGNO_FPSR), Some(4));

        cpu.write_register(REGNO_PC, &0x2000_u64.to_le_bytes()).unwrap();
        assert_eq!(cpu.state.pc, 0x2000);

        assert_eq!(cpu.read_register(67, &mut buf), Err(ErrorKind::ClientError));
        assert_eq!(cpu.read_register(0, &mut buf[..4]), Err(ErrorKind::ClientError));
        assert_eq!(cpu.status(), Status::Ready);
    }

    #[test]
    fn memory_peek_poke() {
        let mut cpu = program(&[0xD282_4680]);
        let mut buf = [0_u8; 4];
        cpu.read_memory(CODE, &mut buf).unwrap();
        assert_eq!(u32::from_le_bytes(buf), 0xD282_4680);

        // Patching read-only code is allowed for the debugger.
        cpu.write_memory(CODE, &0xD420_0000_u32.to_le_bytes()).unwrap();
        assert_eq!(cpu.step(), Status::Break);

        assert_eq!(
            cpu.read_memory(0x10, &mut buf),
            Err(ErrorKind::MemoryException)
        );
    }

    #[test]
    fn setup_errors() {
        let mut cpu = Interpreter::new(SimConfig::default());
        let top = cpu.config().stack_top;
        assert!(matches!(
            cpu.init(0, Some(top)),
            Err(SetupError::EmptyStack { .. })
        ));

        let segment = Segment {
            base: 0x1000,
            bytes: vec![0; 16],
            mem_len: 8,
            writable: true,
            debug: false,
        };
        assert!(matches!(
            cpu.load(&[segment]),
            Err(SetupError::SegmentTooLarge { .. })
        ));

        let debug = Segment {
            base: 0,
            bytes: vec![],
            mem_len: 0x100,
            writable: false,
            debug: true,
        };
        let code = Segment {
            base: 0x1000,
            bytes: vec![1, 2, 3],
            mem_len: 0x100,
            writable: false,
            debug: false,
        };
        cpu.load(&[debug, code.clone()]).unwrap();
        assert_eq!(cpu.memory.blocks().count(), 1);
        assert!(matches!(cpu.load(&[code]), Err(SetupError::Overlap(_))));
    }

    #[test]
    fn init_sets_up_the_frame() {
        let cpu = program(&[]);
        let top = cpu.config().stack_top;
        assert_eq!(cpu.state.sp(), top);
        assert_eq!(cpu.state.x(REG_FP), top);
        assert_eq!(cpu.state.x(REG_LR), RETURN_PC);
        assert_eq!(cpu.state.pc, CODE);
        assert_eq!(cpu.status(), Status::Ready);
        assert!(
            cpu.memory
                .blocks()
                .any(|b| b.base() == top - cpu.config().default_heap_size && b.writable())
        );
    }

    impl Interpreter {
        fn run_for(&mut self, steps: usize) -> Status {
            for _ in 0..steps {
                let status = self.step();
                if status != Status::Ready {
                    return status;
                }
            }
            self.status
        }
    }
}
