use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    error::{EmulatorError, Result},
    model::{Label, Variable},
    program::{Code, Program},
};

/// Variable store and program counter of a run.
///
/// Every variable the program references is present from the start; `y` and
/// work variables begin at zero, inputs at their supplied value or zero.
/// A `pc` equal to the program length means the run has terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    variables: BTreeMap<Variable, BigUint>,
    pc: usize,
}

impl ExecutionContext {
    /// Builds the initial context. `inputs[i]` initializes `x{i + 1}`; inputs
    /// beyond the ones the program references are kept but never read.
    pub fn new(program: &Program, inputs: &[BigUint]) -> Self {
        let mut variables: BTreeMap<Variable, BigUint> = program
            .variables()
            .into_iter()
            .map(|v| (v, BigUint::zero()))
            .collect();
        variables.entry(Variable::Output).or_default();
        for (i, value) in inputs.iter().enumerate() {
            variables.insert(Variable::Input(i + 1), value.clone());
        }
        Self { variables, pc: 0 }
    }

    pub const fn pc(&self) -> usize {
        self.pc
    }

    pub fn get(&self, var: Variable) -> Result<&BigUint> {
        self.variables
            .get(&var)
            .ok_or(EmulatorError::UnknownVariable(var))
    }

    pub(crate) fn get_mut(&mut self, var: Variable) -> Result<&mut BigUint> {
        self.variables
            .get_mut(&var)
            .ok_or(EmulatorError::UnknownVariable(var))
    }

    pub fn set(&mut self, var: Variable, value: BigUint) -> Result<()> {
        *self.get_mut(var)? = value;
        Ok(())
    }

    pub fn is_zero(&self, var: Variable) -> Result<bool> {
        self.get(var).map(Zero::is_zero)
    }

    /// The value of `y`.
    pub fn output(&self) -> BigUint {
        self.variables
            .get(&Variable::Output)
            .cloned()
            .unwrap_or_default()
    }

    /// All variables in canonical order: `y`, inputs, then work variables.
    pub fn variables(&self) -> &BTreeMap<Variable, BigUint> {
        &self.variables
    }

    pub(crate) fn advance(&mut self) {
        self.pc += 1;
    }

    pub(crate) fn jump(&mut self, code: &Code, target: Label) -> Result<()> {
        self.pc = code.position(target).ok_or(EmulatorError::UnknownLabel {
            label: target,
            scope: "execution".to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Instruction;

    #[test]
    fn test_initial_context() {
        let program = Program::new(
            "ctx",
            vec![
                Instruction::increase(Variable::Work(3)),
                Instruction::decrease(Variable::Input(2)),
            ],
        );
        let inputs = [BigUint::from(7u32), BigUint::from(5u32), BigUint::from(9u32)];
        let context = ExecutionContext::new(&program, &inputs);
        let names: Vec<_> = context.variables().keys().map(|v| v.to_string()).collect();
        assert_eq!(names, vec!["y", "x1", "x2", "x3", "z3"]);
        assert_eq!(context.get(Variable::Input(2)), Ok(&BigUint::from(5u32)));
        assert_eq!(context.output(), BigUint::zero());
        assert_eq!(
            context.get(Variable::Work(1)),
            Err(EmulatorError::UnknownVariable(Variable::Work(1)))
        );
    }

    #[test]
    fn test_missing_inputs_default_to_zero() {
        let program = Program::new("ctx", vec![Instruction::increase(Variable::Input(2))]);
        let context = ExecutionContext::new(&program, &[]);
        assert_eq!(context.is_zero(Variable::Input(2)), Ok(true));
        assert_eq!(context.pc(), 0);
    }
}
