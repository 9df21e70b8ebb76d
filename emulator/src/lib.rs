//! An emulator for S-language counter-machine programs.
//!
//! Programs are built from [`Instruction`]s over unbounded natural-number
//! variables. Synthetic instructions can be [`expand`]ed into basic ones,
//! programs can be [`execute`]d at any expansion level, stepped through with a
//! [`DebugSession`], and every run is recorded by a [`StatisticsRecorder`].
//! [`Emulator`] ties these together for a single loaded program.

mod config;
mod debug;
mod emulator;
mod error;
pub mod execution;
pub mod expansion;
mod model;
mod opcodes;
mod program;
pub mod samples;
mod stats;
mod util;

pub use config::{CallInlining, EmulatorConfig};
pub use debug::{DebugReport, DebugSession, DebugState, StepBack};
pub use emulator::Emulator;
pub use error::{EmulatorError, Result};
pub use execution::{execute, parse_inputs, ExecutionContext, ExecutionResult, Interpreter};
pub use expansion::{expand, DerivationForest, Expansion};
pub use model::{Argument, Call, Instruction, Label, Operation, Variable};
pub use num_bigint::BigUint;
pub use opcodes::{InstructionKind, Opcode};
pub use program::{Code, Function, FunctionTable, ListingLine, Program};
pub use stats::{InstructionProfile, RunRecord, StatisticsRecorder};
pub use util::{init_logger, LoggerGuard};
