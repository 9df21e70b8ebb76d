use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;
use serde::Serialize;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter, IntoStaticStr};

/// Whether an instruction is primitive or defined through expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstructionKind {
    Basic,
    Synthetic,
}

impl InstructionKind {
    /// Single-letter marker used by program listings.
    pub const fn marker(&self) -> char {
        match self {
            InstructionKind::Basic => 'B',
            InstructionKind::Synthetic => 'S',
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    Display,
    IntoStaticStr,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    // Basic instructions
    Increase = 0x00,
    Decrease = 0x01,
    JumpNotZero = 0x02,
    Neutral = 0x03,

    // Synthetic instructions
    ZeroVariable = 0x04,
    #[strum(serialize = "GOTO_LABEL")]
    GoTo = 0x05,
    Assignment = 0x06,
    ConstantAssignment = 0x07,
    JumpZero = 0x08,
    JumpEqualConstant = 0x09,
    JumpEqualVariable = 0x0a,
    #[strum(serialize = "QUOTE")]
    FunctionCall = 0x0b,
}

/// Intrinsic expansion levels of every opcode whose level does not depend on
/// its operands. Computed once by lowering a representative instance.
static EXPANSION_LEVELS: Lazy<[Option<usize>; Opcode::COUNT]> = Lazy::new(|| {
    let mut levels = [None; Opcode::COUNT];
    for opcode in Opcode::iter() {
        levels[opcode as usize] = crate::expansion::representative_level(opcode);
    }
    levels
});

impl Opcode {
    pub const fn kind(&self) -> InstructionKind {
        match self {
            Opcode::Increase | Opcode::Decrease | Opcode::JumpNotZero | Opcode::Neutral => {
                InstructionKind::Basic
            }
            _ => InstructionKind::Synthetic,
        }
    }

    pub const fn is_basic(&self) -> bool {
        matches!(self.kind(), InstructionKind::Basic)
    }

    /// Cycles charged when the instruction is executed directly.
    ///
    /// For `FunctionCall` this is the call overhead only; the cycles of the
    /// callee run are charged on top at execution time.
    pub const fn cycles(&self) -> u64 {
        match self {
            Opcode::Increase => 1,
            Opcode::Decrease => 1,
            Opcode::JumpNotZero => 1,
            Opcode::Neutral => 0,
            Opcode::ZeroVariable => 1,
            Opcode::GoTo => 1,
            Opcode::Assignment => 4,
            Opcode::ConstantAssignment => 2,
            Opcode::JumpZero => 2,
            Opcode::JumpEqualConstant => 2,
            Opcode::JumpEqualVariable => 2,
            Opcode::FunctionCall => 5,
        }
    }

    /// Returns the intrinsic expansion level, or `None` for `FunctionCall`,
    /// whose level depends on the callee.
    pub fn expansion_level(&self) -> Option<usize> {
        EXPANSION_LEVELS[*self as usize]
    }
}
