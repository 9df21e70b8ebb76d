use tracing::instrument;

use crate::{
    config::EmulatorConfig,
    debug::{DebugReport, DebugSession, StepBack},
    error::{EmulatorError, Result},
    execution::{self, parse_inputs, ExecutionResult},
    expansion::{self, Expansion},
    program::Program,
    stats::{RunRecord, StatisticsRecorder},
};

/// A loaded program together with its run history and at most one live
/// debug session.
#[derive(Debug)]
pub struct Emulator {
    program: Program,
    config: EmulatorConfig,
    recorder: StatisticsRecorder,
    session: Option<DebugSession>,
}

impl Emulator {
    pub fn new(program: Program) -> Self {
        Self::with_config(program, EmulatorConfig::default())
    }

    pub fn with_config(program: Program, config: EmulatorConfig) -> Self {
        Self {
            program,
            config,
            recorder: StatisticsRecorder::new(),
            session: None,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn max_expansion_level(&self) -> Result<usize> {
        self.program.max_expansion_level(self.config.call_inlining)
    }

    pub fn expand(&self, level: usize) -> Result<Expansion> {
        expansion::expand(&self.program, level, self.config.call_inlining)
    }

    /// Expands to `level`, runs to termination and records the run.
    #[instrument(level = "debug", skip(self), fields(program = self.program.name()))]
    pub fn execute(&mut self, level: usize, inputs: &[i64]) -> Result<ExecutionResult> {
        let parsed = parse_inputs(inputs)?;
        let expanded = self.expand(level)?.program;
        let result = execution::execute(&expanded, inputs)?;
        self.recorder
            .record(level, parsed, result.output.clone(), result.cycles);
        Ok(result)
    }

    /// Starts a fresh debug session on the program expanded to `level`,
    /// replacing any previous one.
    pub fn debug_start(&mut self, level: usize, inputs: &[i64]) -> Result<DebugReport> {
        let expanded = self.expand(level)?.program;
        let mut session = DebugSession::new(expanded, inputs)?;
        let report = session.start()?;
        self.session = Some(session);
        self.record_completion();
        Ok(report)
    }

    pub fn debug_step_forward(&mut self) -> Result<DebugReport> {
        let report = self.session_mut()?.step_forward()?;
        self.record_completion();
        Ok(report)
    }

    pub fn debug_step_backward(&mut self) -> Result<(StepBack, DebugReport)> {
        self.session_mut()?.step_backward()
    }

    pub fn debug_resume(&mut self) -> Result<DebugReport> {
        let report = self.session_mut()?.resume()?;
        self.record_completion();
        Ok(report)
    }

    /// Ends the live session.
    pub fn debug_stop(&mut self) -> Result<DebugReport> {
        let mut session = self.session.take().ok_or(EmulatorError::SessionNotStarted)?;
        Ok(session.stop())
    }

    pub fn debug_session(&self) -> Option<&DebugSession> {
        self.session.as_ref()
    }

    /// Every recorded run, oldest first.
    pub fn history(&self) -> &[RunRecord] {
        self.recorder.history()
    }

    pub fn statistics(&self) -> &StatisticsRecorder {
        &self.recorder
    }

    fn session_mut(&mut self) -> Result<&mut DebugSession> {
        self.session.as_mut().ok_or(EmulatorError::SessionNotStarted)
    }

    /// Records the live session the first time it is seen finished.
    fn record_completion(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some((output, cycles)) = session.take_completion() {
            let level = session.program().level();
            let inputs = session.inputs().to_vec();
            self.recorder.record(level, inputs, output, cycles);
        }
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;

    use super::*;
    use crate::{
        debug::DebugState,
        model::{Instruction, Label, Variable},
    };

    const X1: Variable = Variable::Input(1);
    const Y: Variable = Variable::Output;

    fn twice() -> Program {
        Program::new(
            "twice",
            vec![
                Instruction::increase(X1),
                Instruction::increase(X1),
                Instruction::assignment(Y, X1),
            ],
        )
    }

    #[test]
    fn test_execute_records_runs() {
        let mut emulator = Emulator::new(twice());
        assert_eq!(emulator.max_expansion_level(), Ok(2));
        let result = emulator.execute(0, &[0]).unwrap();
        assert_eq!(result.output, BigUint::from(2u32));
        assert_eq!(result.cycles, 6);

        let expanded = emulator.execute(2, &[0]).unwrap();
        assert_eq!(expanded.output, BigUint::from(2u32));

        let history = emulator.history();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].run(), history[0].level(), history[0].cycles()), (1, 0, 6));
        assert_eq!((history[1].run(), history[1].level()), (2, 2));
    }

    #[test]
    fn test_failed_runs_are_not_recorded() {
        let mut emulator = Emulator::new(Program::new(
            "bad",
            vec![Instruction::goto(Label::Numbered(4))],
        ));
        assert!(matches!(
            emulator.execute(0, &[]),
            Err(EmulatorError::UnknownLabel { .. })
        ));
        let mut emulator = Emulator::new(twice());
        assert!(emulator.execute(0, &[-2]).is_err());
        assert!(emulator.execute(3, &[1]).is_err());
        assert!(emulator.history().is_empty());
    }

    #[test]
    fn test_debug_session_recorded_once() {
        let mut emulator = Emulator::new(twice());
        assert_eq!(
            emulator.debug_step_forward(),
            Err(EmulatorError::SessionNotStarted)
        );
        emulator.debug_start(1, &[5]).unwrap();
        let done = emulator.debug_resume().unwrap();
        assert!(done.is_finished());
        assert_eq!(done.value(Y), Some(&BigUint::from(7u32)));
        assert_eq!(emulator.history().len(), 1);
        assert_eq!(emulator.history()[0].level(), 1);
        assert_eq!(emulator.history()[0].cycles(), done.cycles);

        let (_, back) = emulator.debug_step_backward().unwrap();
        assert_eq!(back.state, DebugState::Stepping);
        emulator.debug_resume().unwrap();
        assert_eq!(emulator.history().len(), 1);

        let stopped = emulator.debug_stop().unwrap();
        assert_eq!(stopped.state, DebugState::NotStarted);
        assert!(emulator.debug_session().is_none());
        assert_eq!(emulator.debug_stop(), Err(EmulatorError::SessionNotStarted));
    }
}
