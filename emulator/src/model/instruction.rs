use std::fmt;

use super::{Label, Variable};
use crate::opcodes::{InstructionKind, Opcode};

/// A function invocation `(name, arg1, arg2, ...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub function: String,
    pub args: Vec<Argument>,
}

/// An argument of a [`Call`]: a variable of the caller, or a nested call whose
/// output is passed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
    Variable(Variable),
    Call(Call),
}

impl Call {
    pub fn new(function: impl Into<String>, args: Vec<Argument>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// Visits every variable read by the call, nested calls included.
    pub fn for_each_variable(&self, f: &mut impl FnMut(Variable)) {
        for arg in &self.args {
            match arg {
                Argument::Variable(v) => f(*v),
                Argument::Call(call) => call.for_each_variable(f),
            }
        }
    }

    /// Visits this call and every nested call, outermost first.
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Call)) {
        f(self);
        for arg in &self.args {
            if let Argument::Call(call) = arg {
                call.for_each_call(f);
            }
        }
    }

    fn rename_variables(&self, f: &mut impl FnMut(Variable) -> Variable) -> Self {
        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                Argument::Variable(v) => Argument::Variable(f(*v)),
                Argument::Call(call) => Argument::Call(call.rename_variables(f)),
            })
            .collect();
        Self {
            function: self.function.clone(),
            args,
        }
    }
}

impl From<Variable> for Argument {
    fn from(v: Variable) -> Self {
        Argument::Variable(v)
    }
}

impl From<Call> for Argument {
    fn from(call: Call) -> Self {
        Argument::Call(call)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.function)?;
        for arg in &self.args {
            write!(f, ",{arg}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Variable(v) => write!(f, "{v}"),
            Argument::Call(call) => write!(f, "{call}"),
        }
    }
}

/// The operation performed by an instruction, with its immutable operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Increase(Variable),
    Decrease(Variable),
    JumpNotZero {
        var: Variable,
        target: Label,
    },
    Neutral(Variable),
    ZeroVariable(Variable),
    GoTo(Label),
    Assignment {
        dst: Variable,
        src: Variable,
    },
    ConstantAssignment {
        dst: Variable,
        value: u64,
    },
    JumpZero {
        var: Variable,
        target: Label,
    },
    JumpEqualConstant {
        var: Variable,
        value: u64,
        target: Label,
    },
    JumpEqualVariable {
        var: Variable,
        other: Variable,
        target: Label,
    },
    FunctionCall {
        dst: Variable,
        call: Call,
    },
}

impl Operation {
    pub const fn opcode(&self) -> Opcode {
        match self {
            Operation::Increase(_) => Opcode::Increase,
            Operation::Decrease(_) => Opcode::Decrease,
            Operation::JumpNotZero { .. } => Opcode::JumpNotZero,
            Operation::Neutral(_) => Opcode::Neutral,
            Operation::ZeroVariable(_) => Opcode::ZeroVariable,
            Operation::GoTo(_) => Opcode::GoTo,
            Operation::Assignment { .. } => Opcode::Assignment,
            Operation::ConstantAssignment { .. } => Opcode::ConstantAssignment,
            Operation::JumpZero { .. } => Opcode::JumpZero,
            Operation::JumpEqualConstant { .. } => Opcode::JumpEqualConstant,
            Operation::JumpEqualVariable { .. } => Opcode::JumpEqualVariable,
            Operation::FunctionCall { .. } => Opcode::FunctionCall,
        }
    }

    /// The label this operation may jump to.
    pub const fn target(&self) -> Option<Label> {
        match self {
            Operation::JumpNotZero { target, .. }
            | Operation::JumpZero { target, .. }
            | Operation::JumpEqualConstant { target, .. }
            | Operation::JumpEqualVariable { target, .. } => Some(*target),
            Operation::GoTo(target) => Some(*target),
            _ => None,
        }
    }

    /// The variable the operation is "about", used to anchor a carried label.
    pub fn primary_variable(&self) -> Variable {
        match self {
            Operation::Increase(v)
            | Operation::Decrease(v)
            | Operation::Neutral(v)
            | Operation::ZeroVariable(v) => *v,
            Operation::JumpNotZero { var, .. }
            | Operation::JumpZero { var, .. }
            | Operation::JumpEqualConstant { var, .. }
            | Operation::JumpEqualVariable { var, .. } => *var,
            Operation::Assignment { dst, .. }
            | Operation::ConstantAssignment { dst, .. }
            | Operation::FunctionCall { dst, .. } => *dst,
            Operation::GoTo(_) => Variable::Output,
        }
    }

    /// Visits every variable the operation reads or writes.
    pub fn for_each_variable(&self, mut f: impl FnMut(Variable)) {
        match self {
            Operation::GoTo(_) => {}
            Operation::Assignment { dst, src } => {
                f(*dst);
                f(*src);
            }
            Operation::JumpEqualVariable { var, other, .. } => {
                f(*var);
                f(*other);
            }
            Operation::FunctionCall { dst, call } => {
                f(*dst);
                call.for_each_variable(&mut f);
            }
            other => f(other.primary_variable()),
        }
    }

    /// The outermost call of a `FunctionCall`.
    pub const fn call(&self) -> Option<&Call> {
        match self {
            Operation::FunctionCall { call, .. } => Some(call),
            _ => None,
        }
    }

    /// Rebuilds the operation with every variable and jump target mapped.
    pub fn rename(
        &self,
        mut var: impl FnMut(Variable) -> Variable,
        mut label: impl FnMut(Label) -> Label,
    ) -> Self {
        match self {
            Operation::Increase(v) => Operation::Increase(var(*v)),
            Operation::Decrease(v) => Operation::Decrease(var(*v)),
            Operation::JumpNotZero { var: v, target } => Operation::JumpNotZero {
                var: var(*v),
                target: label(*target),
            },
            Operation::Neutral(v) => Operation::Neutral(var(*v)),
            Operation::ZeroVariable(v) => Operation::ZeroVariable(var(*v)),
            Operation::GoTo(target) => Operation::GoTo(label(*target)),
            Operation::Assignment { dst, src } => Operation::Assignment {
                dst: var(*dst),
                src: var(*src),
            },
            Operation::ConstantAssignment { dst, value } => Operation::ConstantAssignment {
                dst: var(*dst),
                value: *value,
            },
            Operation::JumpZero { var: v, target } => Operation::JumpZero {
                var: var(*v),
                target: label(*target),
            },
            Operation::JumpEqualConstant {
                var: v,
                value,
                target,
            } => Operation::JumpEqualConstant {
                var: var(*v),
                value: *value,
                target: label(*target),
            },
            Operation::JumpEqualVariable {
                var: v,
                other,
                target,
            } => Operation::JumpEqualVariable {
                var: var(*v),
                other: var(*other),
                target: label(*target),
            },
            Operation::FunctionCall { dst, call } => Operation::FunctionCall {
                dst: var(*dst),
                call: call.rename_variables(&mut var),
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Increase(v) => write!(f, "{v} <- {v} + 1"),
            Operation::Decrease(v) => write!(f, "{v} <- {v} - 1"),
            Operation::JumpNotZero { var, target } => write!(f, "IF {var} != 0 GOTO {target}"),
            Operation::Neutral(v) => write!(f, "{v} <- {v}"),
            Operation::ZeroVariable(v) => write!(f, "{v} <- 0"),
            Operation::GoTo(target) => write!(f, "GOTO {target}"),
            Operation::Assignment { dst, src } => write!(f, "{dst} <- {src}"),
            Operation::ConstantAssignment { dst, value } => write!(f, "{dst} <- {value}"),
            Operation::JumpZero { var, target } => write!(f, "IF {var} = 0 GOTO {target}"),
            Operation::JumpEqualConstant { var, value, target } => {
                write!(f, "IF {var} = {value} GOTO {target}")
            }
            Operation::JumpEqualVariable { var, other, target } => {
                write!(f, "IF {var} = {other} GOTO {target}")
            }
            Operation::FunctionCall { dst, call } => write!(f, "{dst} <- {call}"),
        }
    }
}

/// An operation together with the label attached to it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub label: Option<Label>,
    pub operation: Operation,
}

impl Instruction {
    pub const fn new(operation: Operation) -> Self {
        Self {
            label: None,
            operation,
        }
    }

    pub const fn labeled(label: Label, operation: Operation) -> Self {
        Self {
            label: Some(label),
            operation,
        }
    }

    pub fn with_label(mut self, label: Option<Label>) -> Self {
        self.label = label;
        self
    }

    pub const fn opcode(&self) -> Opcode {
        self.operation.opcode()
    }

    pub const fn kind(&self) -> InstructionKind {
        self.opcode().kind()
    }

    pub const fn is_basic(&self) -> bool {
        self.opcode().is_basic()
    }

    /// Cycles charged when executed directly (see [`Opcode::cycles`]).
    pub const fn cost(&self) -> u64 {
        self.opcode().cycles()
    }

    pub fn render(&self) -> String {
        self.operation.to_string()
    }

    pub fn increase(v: Variable) -> Self {
        Self::new(Operation::Increase(v))
    }

    pub fn decrease(v: Variable) -> Self {
        Self::new(Operation::Decrease(v))
    }

    pub fn jump_not_zero(var: Variable, target: Label) -> Self {
        Self::new(Operation::JumpNotZero { var, target })
    }

    pub fn neutral(v: Variable) -> Self {
        Self::new(Operation::Neutral(v))
    }

    pub fn zero_variable(v: Variable) -> Self {
        Self::new(Operation::ZeroVariable(v))
    }

    pub fn goto(target: Label) -> Self {
        Self::new(Operation::GoTo(target))
    }

    pub fn assignment(dst: Variable, src: Variable) -> Self {
        Self::new(Operation::Assignment { dst, src })
    }

    pub fn constant_assignment(dst: Variable, value: u64) -> Self {
        Self::new(Operation::ConstantAssignment { dst, value })
    }

    pub fn jump_zero(var: Variable, target: Label) -> Self {
        Self::new(Operation::JumpZero { var, target })
    }

    pub fn jump_equal_constant(var: Variable, value: u64, target: Label) -> Self {
        Self::new(Operation::JumpEqualConstant { var, value, target })
    }

    pub fn jump_equal_variable(var: Variable, other: Variable, target: Label) -> Self {
        Self::new(Operation::JumpEqualVariable { var, other, target })
    }

    pub fn function_call(dst: Variable, call: Call) -> Self {
        Self::new(Operation::FunctionCall { dst, call })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "{label}: {}", self.operation),
            None => write!(f, "{}", self.operation),
        }
    }
}
