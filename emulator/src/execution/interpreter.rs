use num_bigint::BigUint;
use num_traits::Zero;
use tracing::trace;

use super::{ExecutionContext, ExecutionResult};
use crate::{
    error::Result,
    model::{Argument, Call, Operation, Variable},
    opcodes::Opcode,
    program::Program,
    stats::InstructionProfile,
};

/// Runs a program one instruction at a time.
#[derive(Debug, Clone)]
pub struct Interpreter {
    program: Program,
    context: ExecutionContext,
    cycles: u64,
    profile: InstructionProfile,
}

impl Interpreter {
    pub fn new(program: Program, inputs: &[BigUint]) -> Self {
        let context = ExecutionContext::new(&program, inputs);
        Self {
            program,
            context,
            cycles: 0,
            profile: InstructionProfile::default(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Cycles charged so far. Never decreases, even when the context is
    /// restored to an earlier snapshot.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn profile(&self) -> &InstructionProfile {
        &self.profile
    }

    pub fn is_halted(&self) -> bool {
        self.context.pc() >= self.program.len()
    }

    /// Replaces the variable store and program counter.
    pub(crate) fn restore(&mut self, context: ExecutionContext) {
        self.context = context;
    }

    pub fn run(mut self) -> Result<ExecutionResult> {
        while self.step()?.is_some() {}
        Ok(self.into_result())
    }

    /// Executes the instruction at the program counter. Returns `None` once
    /// the program has terminated.
    pub fn step(&mut self) -> Result<Option<()>> {
        if self.is_halted() {
            return Ok(None);
        }
        let pc = self.context.pc();
        let instruction = &self.program.instructions()[pc];
        trace!(pc, %instruction, "step");
        let cycles = execute_operation(&instruction.operation, &mut self.context, &self.program)?;
        self.cycles += cycles;
        self.profile.record(instruction.opcode(), cycles);
        Ok(Some(()))
    }

    /// Finishes the call instruction at the program counter once its callee
    /// has produced `value` after `callee_cycles`.
    fn complete_call(&mut self, dst: Variable, value: BigUint, callee_cycles: u64) -> Result<()> {
        let cycles = Opcode::FunctionCall.cycles() + callee_cycles;
        self.context.set(dst, value)?;
        self.context.advance();
        self.cycles += cycles;
        self.profile.record(Opcode::FunctionCall, cycles);
        Ok(())
    }

    pub(crate) fn into_result(self) -> ExecutionResult {
        ExecutionResult {
            output: self.context.output(),
            variables: self.context.variables().clone(),
            cycles: self.cycles,
            profile: self.profile,
        }
    }
}

/// Applies `operation` to `context` and returns the cycles it cost.
///
/// Synthetic operations are executed directly with their fixed cost; a call
/// also charges the cycles of every callee run it performs.
fn execute_operation(
    operation: &Operation,
    context: &mut ExecutionContext,
    program: &Program,
) -> Result<u64> {
    let mut cycles = operation.opcode().cycles();
    let code = program.code();
    match operation {
        Operation::Increase(v) => {
            *context.get_mut(*v)? += 1u32;
            context.advance();
        }
        Operation::Decrease(v) => {
            let value = context.get_mut(*v)?;
            if !value.is_zero() {
                *value -= 1u32;
            }
            context.advance();
        }
        Operation::JumpNotZero { var, target } => {
            if context.is_zero(*var)? {
                context.advance();
            } else {
                context.jump(code, *target)?;
            }
        }
        Operation::Neutral(v) => {
            context.get(*v)?;
            context.advance();
        }
        Operation::ZeroVariable(v) => {
            context.get_mut(*v)?.set_zero();
            context.advance();
        }
        Operation::GoTo(target) => context.jump(code, *target)?,
        Operation::Assignment { dst, src } => {
            let value = context.get(*src)?.clone();
            context.set(*dst, value)?;
            context.advance();
        }
        Operation::ConstantAssignment { dst, value } => {
            context.set(*dst, BigUint::from(*value))?;
            context.advance();
        }
        Operation::JumpZero { var, target } => {
            if context.is_zero(*var)? {
                context.jump(code, *target)?;
            } else {
                context.advance();
            }
        }
        Operation::JumpEqualConstant { var, value, target } => {
            if *context.get(*var)? == BigUint::from(*value) {
                context.jump(code, *target)?;
            } else {
                context.advance();
            }
        }
        Operation::JumpEqualVariable { var, other, target } => {
            if context.get(*var)? == context.get(*other)? {
                context.jump(code, *target)?;
            } else {
                context.advance();
            }
        }
        Operation::FunctionCall { dst, call } => {
            let (value, callee_cycles) = run_call(call, context, program)?;
            cycles += callee_cycles;
            context.set(*dst, value)?;
            context.advance();
        }
    }
    Ok(cycles)
}

/// A pending piece of a direct call.
#[derive(Debug)]
enum Frame {
    /// Evaluating the arguments of `call` left to right. `cycles` holds what
    /// nested argument calls have cost so far.
    Arguments {
        call: Call,
        inputs: Vec<BigUint>,
        cycles: u64,
    },
    /// A callee run, with the argument cycles spent before it started.
    /// `awaiting` is the destination of the call it is blocked on, if any.
    Callee {
        interpreter: Interpreter,
        cycles: u64,
        awaiting: Option<Variable>,
    },
}

impl Frame {
    fn arguments(call: Call) -> Self {
        Self::Arguments {
            call,
            inputs: Vec::new(),
            cycles: 0,
        }
    }
}

/// Evaluates the arguments of `call` left to right, nested calls included,
/// then runs the callee on them. Returns the callee output and the cycles of
/// every run performed.
///
/// Calls made by callees are driven from an explicit frame stack, so the
/// depth of recursion is bounded by memory rather than the native stack.
fn run_call(call: &Call, caller: &ExecutionContext, program: &Program) -> Result<(BigUint, u64)> {
    let mut frames = vec![Frame::arguments(call.clone())];
    // Output and cycles of the frame just popped, owed to the one below.
    let mut returned: Option<(BigUint, u64)> = None;

    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Arguments {
                call,
                mut inputs,
                mut cycles,
            } => {
                if let Some((value, spent)) = returned.take() {
                    inputs.push(value);
                    cycles += spent;
                }
                match call.args.get(inputs.len()) {
                    Some(Argument::Variable(v)) => {
                        let value = scope(&frames, caller).get(*v)?.clone();
                        inputs.push(value);
                        frames.push(Frame::Arguments {
                            call,
                            inputs,
                            cycles,
                        });
                    }
                    Some(Argument::Call(nested)) => {
                        let nested = Frame::arguments(nested.clone());
                        frames.push(Frame::Arguments {
                            call,
                            inputs,
                            cycles,
                        });
                        frames.push(nested);
                    }
                    None => {
                        let callee = program.for_function(&call.function)?;
                        frames.push(Frame::Callee {
                            interpreter: Interpreter::new(callee, &inputs),
                            cycles,
                            awaiting: None,
                        });
                    }
                }
            }
            Frame::Callee {
                mut interpreter,
                cycles,
                awaiting,
            } => {
                if let (Some(dst), Some((value, spent))) = (awaiting, returned.take()) {
                    interpreter.complete_call(dst, value, spent)?;
                }
                if interpreter.is_halted() {
                    let result = (interpreter.context.output(), cycles + interpreter.cycles);
                    if frames.is_empty() {
                        return Ok(result);
                    }
                    returned = Some(result);
                    continue;
                }
                let pc = interpreter.context.pc();
                let pending = match &interpreter.program.instructions()[pc].operation {
                    Operation::FunctionCall { dst, call } => Some((*dst, call.clone())),
                    _ => None,
                };
                match pending {
                    Some((dst, call)) => {
                        frames.push(Frame::Callee {
                            interpreter,
                            cycles,
                            awaiting: Some(dst),
                        });
                        frames.push(Frame::arguments(call));
                    }
                    None => {
                        interpreter.step()?;
                        frames.push(Frame::Callee {
                            interpreter,
                            cycles,
                            awaiting: None,
                        });
                    }
                }
            }
        }
    }
    unreachable!("the outermost callee returns its own result")
}

/// The context variable arguments are read from: the innermost running
/// callee, or the caller when none is running yet.
fn scope<'a>(frames: &'a [Frame], caller: &'a ExecutionContext) -> &'a ExecutionContext {
    frames
        .iter()
        .rev()
        .find_map(|frame| match frame {
            Frame::Callee { interpreter, .. } => Some(&interpreter.context),
            Frame::Arguments { .. } => None,
        })
        .unwrap_or(caller)
}
