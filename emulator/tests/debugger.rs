pub mod common;

use common::test_runner::{big, expand_to, run_at_level};
use s_emulator::{
    samples, CallInlining, DebugSession, DebugState, Emulator, EmulatorError, StepBack,
};

#[test]
fn test_forward_then_backward_restores_snapshot() {
    let program = expand_to(&samples::addition(), 3, CallInlining::Full).program;
    let mut session = DebugSession::new(program, &[2, 3]).unwrap();
    session.start().unwrap();
    for _ in 0..7 {
        session.step_forward().unwrap();
    }
    let before = session.report();
    let context = session.context().cloned();

    let after = session.step_forward().unwrap();
    assert!(after.cycles >= before.cycles);

    let (outcome, back) = session.step_backward().unwrap();
    assert_eq!(outcome, StepBack::Restored);
    assert_eq!(back.pc, before.pc);
    assert_eq!(back.variables, before.variables);
    assert_eq!(session.context().cloned(), context);
    assert_eq!(back.cycles, after.cycles);
}

#[test]
fn test_step_back_to_start() {
    let mut session = DebugSession::new(samples::successor(), &[1]).unwrap();
    let start = session.start().unwrap();
    session.step_forward().unwrap();
    session.step_forward().unwrap();
    assert_eq!(session.state(), DebugState::Finished);

    session.step_backward().unwrap();
    let (_, first) = session.step_backward().unwrap();
    assert_eq!(first.variables, start.variables);
    assert_eq!(first.pc, 0);
    let (outcome, again) = session.step_backward().unwrap();
    assert_eq!(outcome, StepBack::AtFirstStep);
    assert_eq!(again, first);
}

#[test]
fn test_resume_matches_execute() {
    for program in samples::catalog() {
        let max = program.max_expansion_level(CallInlining::Full).unwrap();
        let inputs = [3, 1, 2];
        let expected = run_at_level(&program, max, CallInlining::Full, &inputs);

        let mut emulator = Emulator::new(program);
        emulator.debug_start(max, &inputs).unwrap();
        emulator.debug_step_forward().unwrap();
        let done = emulator.debug_resume().unwrap();
        assert_eq!(done.value(s_emulator::Variable::Output), Some(&expected.output));
        assert_eq!(done.cycles, expected.cycles);
        assert_eq!(emulator.history()[0].output(), &expected.output);
    }
}

#[test]
fn test_session_lifecycle_errors() {
    let mut emulator = Emulator::new(samples::constant(2));
    assert_eq!(
        emulator.debug_resume(),
        Err(EmulatorError::SessionNotStarted)
    );
    let start = emulator.debug_start(0, &[]).unwrap();
    assert_eq!(start.state, DebugState::Stepping);
    let done = emulator.debug_step_forward().unwrap();
    assert!(done.is_finished());
    assert_eq!(done.value(s_emulator::Variable::Output), Some(&big(2)));
    assert_eq!(
        emulator.debug_step_forward(),
        Err(EmulatorError::SessionFinished)
    );
    assert_eq!(emulator.debug_resume(), Err(EmulatorError::SessionFinished));
    assert_eq!(emulator.history().len(), 1);

    // A new session replaces the old one and records its own run.
    emulator.debug_start(1, &[]).unwrap();
    emulator.debug_resume().unwrap();
    let history = emulator.history();
    assert_eq!(history.len(), 2);
    assert_eq!((history[1].run(), history[1].level()), (2, 1));
}
