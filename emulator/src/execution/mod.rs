//! Program execution over unbounded natural-number variables.

mod context;
mod interpreter;

use std::collections::BTreeMap;

pub use context::ExecutionContext;
pub use interpreter::Interpreter;
use num_bigint::BigUint;
use tracing::{debug, instrument};

use crate::{
    error::{EmulatorError, Result},
    model::Variable,
    program::Program,
    stats::InstructionProfile,
};

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Final value of `y`.
    pub output: BigUint,
    /// Final values of every variable, in canonical order.
    pub variables: BTreeMap<Variable, BigUint>,
    pub cycles: u64,
    pub profile: InstructionProfile,
}

/// Converts user-supplied inputs into variable values, rejecting negatives.
pub fn parse_inputs(inputs: &[i64]) -> Result<Vec<BigUint>> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            u64::try_from(value)
                .map(BigUint::from)
                .map_err(|_| EmulatorError::InvalidArgument {
                    position: i + 1,
                    value,
                })
        })
        .collect()
}

/// Runs `program` to termination on `inputs`.
#[instrument(level = "debug", skip_all, fields(program = program.name(), level = program.level()))]
pub fn execute(program: &Program, inputs: &[i64]) -> Result<ExecutionResult> {
    program.validate()?;
    let inputs = parse_inputs(inputs)?;
    let result = Interpreter::new(program.clone(), &inputs).run()?;
    debug!(output = %result.output, cycles = result.cycles, "execution finished");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs() {
        assert_eq!(
            parse_inputs(&[0, 4]),
            Ok(vec![BigUint::from(0u32), BigUint::from(4u32)])
        );
        assert_eq!(
            parse_inputs(&[1, -3]),
            Err(EmulatorError::InvalidArgument {
                position: 2,
                value: -3
            })
        );
    }
}
