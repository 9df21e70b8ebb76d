use std::collections::BTreeSet;

use num_bigint::BigUint;
use s_emulator::{
    execute, expand, Call, CallInlining, ExecutionResult, Expansion, Function, Instruction,
    Label, Program, Variable,
};

pub fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

pub fn expand_to(program: &Program, level: usize, policy: CallInlining) -> Expansion {
    expand(program, level, policy)
        .unwrap_or_else(|e| panic!("expanding {} to {level}: {e}", program.name()))
}

/// Expands `program` to `level` and runs it on `inputs`.
pub fn run_at_level(
    program: &Program,
    level: usize,
    policy: CallInlining,
    inputs: &[i64],
) -> ExecutionResult {
    let expansion = expand_to(program, level, policy);
    execute(&expansion.program, inputs)
        .unwrap_or_else(|e| panic!("running {} at level {level}: {e}", program.name()))
}

/// Runs `program` at every level from 0 to its maximum.
pub fn run_all_levels(
    program: &Program,
    policy: CallInlining,
    inputs: &[i64],
) -> Vec<ExecutionResult> {
    let max = program
        .max_expansion_level(policy)
        .expect("level analysis");
    (0..=max)
        .map(|level| run_at_level(program, level, policy, inputs))
        .collect()
}

pub fn rendered(program: &Program) -> Vec<String> {
    program
        .instructions()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Work variables and defined labels of `instructions`, rendered.
pub fn bound_names<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for instruction in instructions {
        instruction.operation.for_each_variable(|var| {
            if var.is_work() {
                names.insert(var.to_string());
            }
        });
        if let Some(label) = instruction.label {
            names.insert(label.to_string());
        }
    }
    names
}

/// `y = x1`, computed by a function that recurses once per unit of `x1`:
/// `Count(x1) = IF x1 = 0 GOTO EXIT; y <- (Succ, (Count, (Pred, x1)))`.
pub fn counting() -> Program {
    let x1 = Variable::Input(1);
    let y = Variable::Output;
    let succ = Function::new(
        "Succ",
        vec![Instruction::assignment(y, x1), Instruction::increase(y)],
    );
    let pred = Function::new(
        "Pred",
        vec![Instruction::assignment(y, x1), Instruction::decrease(y)],
    );
    let count = Function::new(
        "Count",
        vec![
            Instruction::jump_zero(x1, Label::Exit),
            Instruction::function_call(
                y,
                Call::new(
                    "Succ",
                    vec![Call::new("Count", vec![Call::new("Pred", vec![x1.into()]).into()]).into()],
                ),
            ),
        ],
    );
    Program::with_functions(
        "counting",
        vec![Instruction::function_call(y, Call::new("Count", vec![x1.into()]))],
        [succ, pred, count],
    )
}
