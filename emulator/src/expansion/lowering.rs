//! Canonical one-level lowerings of the synthetic instructions.

use std::collections::BTreeMap;

use super::NamingContext;
use crate::{
    error::{EmulatorError, Result},
    model::{Argument, Call, Instruction, Label, Operation, Variable},
    program::FunctionTable,
};

/// Lowers `instruction` by one level.
///
/// Basic instructions lower to themselves. A label attached to `instruction`
/// moves to the first lowered instruction, or to a prepended `Neutral` when
/// that instruction carries a label of its own.
pub(crate) fn lower(
    instruction: &Instruction,
    naming: &mut NamingContext,
    functions: &FunctionTable,
) -> Result<Vec<Instruction>> {
    let mut lowered = match &instruction.operation {
        Operation::Increase(_)
        | Operation::Decrease(_)
        | Operation::JumpNotZero { .. }
        | Operation::Neutral(_) => return Ok(vec![instruction.clone()]),
        Operation::ZeroVariable(v) => zero_variable(*v, naming),
        Operation::GoTo(target) => goto(*target, naming),
        Operation::Assignment { dst, src } => assignment(*dst, *src, naming),
        Operation::ConstantAssignment { dst, value } => constant_assignment(*dst, *value),
        Operation::JumpZero { var, target } => jump_zero(*var, *target, naming),
        Operation::JumpEqualConstant { var, value, target } => {
            jump_equal_constant(*var, *value, *target, naming)
        }
        Operation::JumpEqualVariable { var, other, target } => {
            jump_equal_variable(*var, *other, *target, naming)
        }
        Operation::FunctionCall { dst, call } => inline_call(*dst, call, naming, functions)?,
    };

    if let Some(label) = instruction.label {
        match lowered.first_mut() {
            Some(first) if first.label.is_none() => first.label = Some(label),
            _ => lowered.insert(
                0,
                Instruction::labeled(
                    label,
                    Operation::Neutral(instruction.operation.primary_variable()),
                ),
            ),
        }
    }
    Ok(lowered)
}

/// `L: v <- v - 1; IF v != 0 GOTO L`
fn zero_variable(v: Variable, naming: &mut NamingContext) -> Vec<Instruction> {
    let again = naming.fresh_label();
    vec![
        Instruction::labeled(again, Operation::Decrease(v)),
        Instruction::jump_not_zero(v, again),
    ]
}

/// `z <- z + 1; IF z != 0 GOTO target`
fn goto(target: Label, naming: &mut NamingContext) -> Vec<Instruction> {
    let z = naming.fresh_work();
    vec![Instruction::increase(z), Instruction::jump_not_zero(z, target)]
}

/// Moves `src` into `dst` through a work variable, then moves it back so
/// `src` keeps its value.
fn assignment(dst: Variable, src: Variable, naming: &mut NamingContext) -> Vec<Instruction> {
    if dst == src {
        return vec![Instruction::neutral(dst)];
    }
    let drain = naming.fresh_label();
    let refill = naming.fresh_label();
    let done = naming.fresh_label();
    let z = naming.fresh_work();
    vec![
        Instruction::zero_variable(dst),
        Instruction::jump_not_zero(src, drain),
        Instruction::goto(done),
        Instruction::labeled(drain, Operation::Decrease(src)),
        Instruction::increase(z),
        Instruction::jump_not_zero(src, drain),
        Instruction::labeled(refill, Operation::Decrease(z)),
        Instruction::increase(dst),
        Instruction::increase(src),
        Instruction::jump_not_zero(z, refill),
        Instruction::labeled(done, Operation::Neutral(dst)),
    ]
}

fn constant_assignment(dst: Variable, value: u64) -> Vec<Instruction> {
    std::iter::once(Instruction::zero_variable(dst))
        .chain((0..value).map(|_| Instruction::increase(dst)))
        .collect()
}

/// `IF v != 0 GOTO A; GOTO target; A: v <- v`
fn jump_zero(var: Variable, target: Label, naming: &mut NamingContext) -> Vec<Instruction> {
    let skip = naming.fresh_label();
    vec![
        Instruction::jump_not_zero(var, skip),
        Instruction::goto(target),
        Instruction::labeled(skip, Operation::Neutral(var)),
    ]
}

/// Counts a copy of `var` down `value` times; it equals `value` iff the copy
/// is exactly zero at the end.
fn jump_equal_constant(
    var: Variable,
    value: u64,
    target: Label,
    naming: &mut NamingContext,
) -> Vec<Instruction> {
    let z = naming.fresh_work();
    let skip = naming.fresh_label();
    let mut lowered = vec![Instruction::assignment(z, var)];
    for _ in 0..value {
        lowered.push(Instruction::jump_zero(z, skip));
        lowered.push(Instruction::decrease(z));
    }
    lowered.extend([
        Instruction::jump_not_zero(z, skip),
        Instruction::goto(target),
        Instruction::labeled(skip, Operation::Neutral(var)),
    ]);
    lowered
}

/// Counts copies of both variables down in lockstep.
fn jump_equal_variable(
    var: Variable,
    other: Variable,
    target: Label,
    naming: &mut NamingContext,
) -> Vec<Instruction> {
    let left = naming.fresh_work();
    let right = naming.fresh_work();
    let skip = naming.fresh_label();
    let again = naming.fresh_label();
    let left_done = naming.fresh_label();
    vec![
        Instruction::assignment(left, var),
        Instruction::assignment(right, other),
        Instruction::labeled(
            again,
            Operation::JumpZero {
                var: left,
                target: left_done,
            },
        ),
        Instruction::jump_zero(right, skip),
        Instruction::decrease(left),
        Instruction::decrease(right),
        Instruction::goto(again),
        Instruction::labeled(
            left_done,
            Operation::JumpZero {
                var: right,
                target,
            },
        ),
        Instruction::labeled(skip, Operation::Neutral(var)),
    ]
}

/// Inlines the callee body at the call site.
///
/// Each argument is evaluated into a fresh holder, every other callee-local
/// variable is renamed to a fresh work variable and zeroed, callee labels are
/// renamed, `EXIT` becomes a fresh end label and the callee output is finally
/// assigned to `dst`.
fn inline_call(
    dst: Variable,
    call: &Call,
    naming: &mut NamingContext,
    functions: &FunctionTable,
) -> Result<Vec<Instruction>> {
    let function = functions
        .get(&call.function)
        .ok_or_else(|| EmulatorError::FunctionNotFound(call.function.clone()))?;
    let code = function.code();
    let mut lowered = Vec::new();

    let mut holders = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        let holder = naming.fresh_work();
        lowered.push(match arg {
            Argument::Variable(v) => Instruction::assignment(holder, *v),
            Argument::Call(nested) => Instruction::function_call(holder, nested.clone()),
        });
        holders.push(holder);
    }

    let output = naming.fresh_work();
    let mut variables = BTreeMap::from([(Variable::Output, output)]);
    for var in code.variables() {
        let renamed = match var {
            Variable::Output => continue,
            Variable::Input(i) if i <= holders.len() => holders[i - 1],
            _ => naming.fresh_work(),
        };
        variables.insert(var, renamed);
    }
    for (var, renamed) in &variables {
        let supplied = matches!(var, Variable::Input(i) if *i <= holders.len());
        if !supplied {
            lowered.push(Instruction::zero_variable(*renamed));
        }
    }

    let mut labels: BTreeMap<Label, Label> = code
        .labels()
        .into_iter()
        .map(|label| (label, naming.fresh_label()))
        .collect();
    let end = naming.fresh_label();
    labels.insert(Label::Exit, end);

    let rename_var = |v: Variable| variables.get(&v).copied().unwrap_or(v);
    let rename_label = |l: Label| labels.get(&l).copied().unwrap_or(l);
    lowered.extend(code.instructions().iter().map(|instruction| Instruction {
        label: instruction.label.map(rename_label),
        operation: instruction.operation.rename(rename_var, rename_label),
    }));

    lowered.push(Instruction::labeled(
        end,
        Operation::Assignment { dst, src: output },
    ));
    Ok(lowered)
}

/// Computes the intrinsic level of `opcode` by lowering a representative
/// instance. Returns `None` for `FunctionCall`.
pub(crate) fn representative_level(opcode: crate::opcodes::Opcode) -> Option<usize> {
    use crate::opcodes::Opcode;

    let v = Variable::Input(1);
    let w = Variable::Input(2);
    let target = Label::Numbered(1);
    let operation = match opcode {
        Opcode::Increase => Operation::Increase(v),
        Opcode::Decrease => Operation::Decrease(v),
        Opcode::JumpNotZero => Operation::JumpNotZero { var: v, target },
        Opcode::Neutral => Operation::Neutral(v),
        Opcode::ZeroVariable => Operation::ZeroVariable(v),
        Opcode::GoTo => Operation::GoTo(target),
        Opcode::Assignment => Operation::Assignment { dst: v, src: w },
        Opcode::ConstantAssignment => Operation::ConstantAssignment { dst: v, value: 1 },
        Opcode::JumpZero => Operation::JumpZero { var: v, target },
        Opcode::JumpEqualConstant => Operation::JumpEqualConstant {
            var: v,
            value: 1,
            target,
        },
        Opcode::JumpEqualVariable => Operation::JumpEqualVariable {
            var: v,
            other: w,
            target,
        },
        Opcode::FunctionCall => return None,
    };
    Some(lowered_level(&Instruction::new(operation)))
}

fn lowered_level(instruction: &Instruction) -> usize {
    if instruction.is_basic() {
        return 0;
    }
    let mut naming = NamingContext::new(2, 1);
    let lowered = lower(instruction, &mut naming, &FunctionTable::default())
        .unwrap_or_else(|_| unreachable!("only calls can fail to lower"));
    1 + lowered.iter().map(lowered_level).max().unwrap_or(0)
}
