//! Bundled sample programs.

use crate::{
    model::{Call, Instruction, Label, Operation, Variable},
    program::{Function, Program},
};

const X1: Variable = Variable::Input(1);
const X2: Variable = Variable::Input(2);
const Y: Variable = Variable::Output;
const Z1: Variable = Variable::Work(1);
const L1: Label = Label::Numbered(1);

/// `y = x1 + 1`
pub fn successor() -> Program {
    Program::new(
        "successor",
        vec![Instruction::assignment(Y, X1), Instruction::increase(Y)],
    )
}

/// `y = k`
pub fn constant(k: u64) -> Program {
    Program::new(
        format!("constant{k}"),
        vec![Instruction::constant_assignment(Y, k)],
    )
}

/// `y = 1` if `x1 = x2`, else `y = 0`.
pub fn equality() -> Program {
    Program::new(
        "equality",
        vec![
            Instruction::jump_equal_variable(X1, X2, L1),
            Instruction::goto(Label::Exit),
            Instruction::labeled(L1, Operation::ConstantAssignment { dst: Y, value: 1 }),
        ],
    )
}

/// `y = x1 + x2`
pub fn plus() -> Function {
    Function::new(
        "Plus",
        vec![
            Instruction::assignment(Y, X1),
            Instruction::assignment(Z1, X2),
            Instruction::labeled(
                L1,
                Operation::JumpZero {
                    var: Z1,
                    target: Label::Exit,
                },
            ),
            Instruction::decrease(Z1),
            Instruction::increase(Y),
            Instruction::goto(L1),
        ],
    )
    .with_display_name("x1 + x2")
}

/// `y = max(x1 - x2, 0)`
pub fn minus() -> Function {
    Function::new(
        "Minus",
        vec![
            Instruction::assignment(Y, X1),
            Instruction::assignment(Z1, X2),
            Instruction::labeled(
                L1,
                Operation::JumpZero {
                    var: Z1,
                    target: Label::Exit,
                },
            ),
            Instruction::decrease(Y),
            Instruction::decrease(Z1),
            Instruction::goto(L1),
        ],
    )
    .with_display_name("x1 - x2")
}

/// `y = x1 + x2` through a call to `Plus`.
pub fn addition() -> Program {
    Program::with_functions(
        "addition",
        vec![Instruction::function_call(
            Y,
            Call::new("Plus", vec![X1.into(), X2.into()]),
        )],
        [plus()],
    )
}

/// `y = max(x1 - x2, 0)` through a call to `Minus`.
pub fn subtraction() -> Program {
    Program::with_functions(
        "subtraction",
        vec![Instruction::function_call(
            Y,
            Call::new("Minus", vec![X1.into(), X2.into()]),
        )],
        [minus()],
    )
}

/// `y = max(x1 - x2, 0) + x3` through nested calls.
pub fn composition() -> Program {
    let difference = Call::new("Minus", vec![X1.into(), X2.into()]);
    Program::with_functions(
        "composition",
        vec![Instruction::function_call(
            Y,
            Call::new("Plus", vec![difference.into(), Variable::Input(3).into()]),
        )],
        [plus(), minus()],
    )
}

/// Every sample by name.
pub fn catalog() -> Vec<Program> {
    vec![
        successor(),
        constant(3),
        equality(),
        addition(),
        subtraction(),
        composition(),
    ]
}

/// Looks a sample up by its program name.
pub fn by_name(name: &str) -> Option<Program> {
    catalog().into_iter().find(|p| p.name() == name)
}
