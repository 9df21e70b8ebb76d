//! Step-wise execution with backward stepping.

use num_bigint::BigUint;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{EmulatorError, Result},
    execution::{parse_inputs, ExecutionContext, Interpreter},
    model::Variable,
    program::Program,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DebugState {
    NotStarted,
    Stepping,
    Finished,
}

/// Outcome of a backward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepBack {
    /// The previous snapshot was restored.
    Restored,
    /// Nothing to undo; the session is unchanged.
    AtFirstStep,
}

/// What a debugger front end shows after each command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugReport {
    pub state: DebugState,
    /// 0-based index of the next instruction; the program length once
    /// finished.
    pub pc: usize,
    pub variables: Vec<(Variable, BigUint)>,
    pub cycles: u64,
}

impl DebugReport {
    pub fn is_finished(&self) -> bool {
        self.state == DebugState::Finished
    }

    pub fn value(&self, var: Variable) -> Option<&BigUint> {
        self.variables
            .iter()
            .find_map(|(v, value)| (*v == var).then_some(value))
    }
}

/// A debugging session over one program and one set of inputs.
///
/// Every forward step pushes a snapshot of the context so it can be undone.
/// The cycle counter only grows: stepping back restores variables and the
/// program counter but keeps the cycles already spent.
#[derive(Debug, Clone)]
pub struct DebugSession {
    program: Program,
    inputs: Vec<BigUint>,
    state: DebugState,
    interpreter: Option<Interpreter>,
    history: Vec<ExecutionContext>,
    completion_taken: bool,
}

impl DebugSession {
    /// Creates a session in `NotStarted`. Fails if the program does not
    /// validate or an input is negative.
    pub fn new(program: Program, inputs: &[i64]) -> Result<Self> {
        program.validate()?;
        let inputs = parse_inputs(inputs)?;
        Ok(Self {
            program,
            inputs,
            state: DebugState::NotStarted,
            interpreter: None,
            history: Vec::new(),
            completion_taken: false,
        })
    }

    pub const fn state(&self) -> DebugState {
        self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn inputs(&self) -> &[BigUint] {
        &self.inputs
    }

    /// Number of forward steps that can currently be undone.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn context(&self) -> Option<&ExecutionContext> {
        self.interpreter.as_ref().map(Interpreter::context)
    }

    pub fn cycles(&self) -> u64 {
        self.interpreter.as_ref().map_or(0, Interpreter::cycles)
    }

    pub fn report(&self) -> DebugReport {
        let (pc, variables) = match self.context() {
            Some(context) => (
                context.pc(),
                context
                    .variables()
                    .iter()
                    .map(|(v, value)| (*v, value.clone()))
                    .collect(),
            ),
            None => (0, Vec::new()),
        };
        DebugReport {
            state: self.state,
            pc,
            variables,
            cycles: self.cycles(),
        }
    }

    pub fn start(&mut self) -> Result<DebugReport> {
        if self.state != DebugState::NotStarted {
            return Err(EmulatorError::SessionAlreadyStarted);
        }
        let interpreter = Interpreter::new(self.program.clone(), &self.inputs);
        self.state = if interpreter.is_halted() {
            DebugState::Finished
        } else {
            DebugState::Stepping
        };
        self.interpreter = Some(interpreter);
        self.history.clear();
        self.completion_taken = false;
        debug!(program = self.program.name(), "debug session started");
        Ok(self.report())
    }

    pub fn step_forward(&mut self) -> Result<DebugReport> {
        let interpreter = self.stepping()?;
        let snapshot = interpreter.context().clone();
        if let Err(err) = interpreter.step() {
            interpreter.restore(snapshot);
            return Err(err);
        }
        let halted = interpreter.is_halted();
        self.history.push(snapshot);
        if halted {
            self.finish();
        }
        Ok(self.report())
    }

    /// Undoes the most recent forward step. Allowed after the program has
    /// finished, which puts the session back into `Stepping`.
    pub fn step_backward(&mut self) -> Result<(StepBack, DebugReport)> {
        let interpreter = self
            .interpreter
            .as_mut()
            .ok_or(EmulatorError::SessionNotStarted)?;
        let Some(snapshot) = self.history.pop() else {
            return Ok((StepBack::AtFirstStep, self.report()));
        };
        interpreter.restore(snapshot);
        self.state = DebugState::Stepping;
        Ok((StepBack::Restored, self.report()))
    }

    /// Runs to termination. A single snapshot is taken, so one backward step
    /// returns to where `resume` was issued.
    pub fn resume(&mut self) -> Result<DebugReport> {
        let interpreter = self.stepping()?;
        let snapshot = interpreter.context().clone();
        loop {
            match interpreter.step() {
                Ok(Some(())) => {}
                Ok(None) => break,
                Err(err) => {
                    interpreter.restore(snapshot);
                    return Err(err);
                }
            }
        }
        self.history.push(snapshot);
        self.finish();
        Ok(self.report())
    }

    /// Discards the run and returns to `NotStarted`.
    pub fn stop(&mut self) -> DebugReport {
        self.interpreter = None;
        self.history.clear();
        self.state = DebugState::NotStarted;
        self.completion_taken = false;
        self.report()
    }

    /// Output and cycles of the run the first time it is observed finished,
    /// `None` otherwise. Stepping back and finishing again does not produce a
    /// second completion.
    pub(crate) fn take_completion(&mut self) -> Option<(BigUint, u64)> {
        if self.state != DebugState::Finished || self.completion_taken {
            return None;
        }
        let interpreter = self.interpreter.as_ref()?;
        self.completion_taken = true;
        Some((interpreter.context().output(), interpreter.cycles()))
    }

    fn stepping(&mut self) -> Result<&mut Interpreter> {
        match self.state {
            DebugState::NotStarted => Err(EmulatorError::SessionNotStarted),
            DebugState::Finished => Err(EmulatorError::SessionFinished),
            DebugState::Stepping => self
                .interpreter
                .as_mut()
                .ok_or(EmulatorError::SessionNotStarted),
        }
    }

    fn finish(&mut self) {
        self.state = DebugState::Finished;
        debug!(cycles = self.cycles(), "debug session finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Instruction, Label, Operation};

    const X1: Variable = Variable::Input(1);
    const Y: Variable = Variable::Output;

    fn copy_loop() -> Program {
        // y <- x1, counting x1 down.
        Program::new(
            "copy",
            vec![
                Instruction::jump_zero(X1, Label::Exit),
                Instruction::labeled(Label::Numbered(1), Operation::Decrease(X1)),
                Instruction::increase(Y),
                Instruction::jump_not_zero(X1, Label::Numbered(1)),
            ],
        )
    }

    #[test]
    fn test_commands_before_start() {
        let mut session = DebugSession::new(copy_loop(), &[2]).unwrap();
        assert_eq!(session.state(), DebugState::NotStarted);
        assert_eq!(session.step_forward(), Err(EmulatorError::SessionNotStarted));
        assert_eq!(session.step_backward(), Err(EmulatorError::SessionNotStarted));
        assert_eq!(session.resume(), Err(EmulatorError::SessionNotStarted));
        session.start().unwrap();
        assert_eq!(session.start(), Err(EmulatorError::SessionAlreadyStarted));
    }

    #[test]
    fn test_step_and_undo() {
        let mut session = DebugSession::new(copy_loop(), &[2]).unwrap();
        let start = session.start().unwrap();
        assert_eq!(start.pc, 0);
        assert_eq!(start.value(X1), Some(&BigUint::from(2u32)));

        let (outcome, _) = session.step_backward().unwrap();
        assert_eq!(outcome, StepBack::AtFirstStep);

        session.step_forward().unwrap();
        let after_two = session.step_forward().unwrap();
        assert_eq!(after_two.pc, 2);
        assert_eq!(after_two.value(X1), Some(&BigUint::from(1u32)));
        assert_eq!(after_two.cycles, 3);

        let (outcome, back) = session.step_backward().unwrap();
        assert_eq!(outcome, StepBack::Restored);
        assert_eq!(back.pc, 1);
        assert_eq!(back.value(X1), Some(&BigUint::from(2u32)));
        // Cycles already spent are not refunded.
        assert_eq!(back.cycles, 3);
    }

    #[test]
    fn test_resume_and_finish() {
        let mut session = DebugSession::new(copy_loop(), &[3]).unwrap();
        session.start().unwrap();
        session.step_forward().unwrap();
        let done = session.resume().unwrap();
        assert!(done.is_finished());
        assert_eq!(done.value(Y), Some(&BigUint::from(3u32)));
        assert_eq!(session.step_forward(), Err(EmulatorError::SessionFinished));
        assert_eq!(session.history_len(), 2);

        assert_eq!(session.take_completion(), Some((BigUint::from(3u32), done.cycles)));
        assert_eq!(session.take_completion(), None);

        let (_, back) = session.step_backward().unwrap();
        assert_eq!(back.state, DebugState::Stepping);
        assert_eq!(back.pc, 1);

        let stopped = session.stop();
        assert_eq!(stopped.state, DebugState::NotStarted);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_empty_program_finishes_on_start() {
        let mut session = DebugSession::new(Program::new("empty", vec![]), &[]).unwrap();
        assert!(session.start().unwrap().is_finished());
        assert_eq!(session.take_completion(), Some((BigUint::from(0u32), 0)));
    }

    #[test]
    fn test_rejects_negative_input() {
        assert_eq!(
            DebugSession::new(copy_loop(), &[-1]).unwrap_err(),
            EmulatorError::InvalidArgument {
                position: 1,
                value: -1
            }
        );
    }
}
