//! The program model: an immutable instruction sequence, its label table and
//! the table of functions it may call.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use ahash::{AHashMap, AHashSet};

use crate::{
    config::CallInlining,
    error::{EmulatorError, Result},
    model::{Argument, Call, Instruction, Label, Operation, Variable},
    opcodes::Opcode,
};

/// An instruction sequence together with its resolved label table.
#[derive(Debug, Clone)]
pub struct Code {
    instructions: Vec<Instruction>,
    /// Label -> 0-based position of the first instruction carrying it.
    labels: AHashMap<Label, usize>,
}

impl Code {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let mut labels = AHashMap::new();
        for (pc, instruction) in instructions.iter().enumerate() {
            if let Some(label) = instruction.label {
                labels.entry(label).or_insert(pc);
            }
        }
        Self {
            instructions,
            labels,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Resolves a label to the position execution continues at. `EXIT`
    /// resolves to the past-the-end position.
    pub fn position(&self, label: Label) -> Option<usize> {
        match label {
            Label::Exit => Some(self.instructions.len()),
            label => self.labels.get(&label).copied(),
        }
    }

    /// Every variable referenced by the sequence, in canonical order.
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        for instruction in &self.instructions {
            instruction.operation.for_each_variable(|v| {
                vars.insert(v);
            });
        }
        vars
    }

    /// Every label defined or referenced by the sequence, `EXIT` excluded.
    pub fn labels(&self) -> BTreeSet<Label> {
        self.instructions
            .iter()
            .flat_map(|i| [i.label, i.operation.target()])
            .flatten()
            .filter(|l| !l.is_exit())
            .collect()
    }

    fn validate(&self, scope: &str, functions: &FunctionTable) -> Result<()> {
        let mut defined = AHashSet::new();
        for instruction in &self.instructions {
            if let Some(label) = instruction.label {
                if !defined.insert(label) {
                    return Err(EmulatorError::DuplicateLabel {
                        label,
                        scope: scope.to_string(),
                    });
                }
            }
        }

        for instruction in &self.instructions {
            if let Some(label) = instruction.operation.target() {
                if self.position(label).is_none() {
                    return Err(EmulatorError::UnknownLabel {
                        label,
                        scope: scope.to_string(),
                    });
                }
            }
            if let Some(call) = instruction.operation.call() {
                let mut missing = None;
                call.for_each_call(&mut |c: &Call| {
                    if missing.is_none() && functions.get(&c.function).is_none() {
                        missing = Some(c.function.clone());
                    }
                });
                if let Some(name) = missing {
                    return Err(EmulatorError::FunctionNotFound(name));
                }
            }
        }
        Ok(())
    }

    fn highest_label_index(&self) -> usize {
        self.labels()
            .into_iter()
            .filter_map(|l| match l {
                Label::Numbered(i) => Some(i),
                Label::Exit => None,
            })
            .max()
            .unwrap_or(0)
    }

    fn highest_work_index(&self) -> usize {
        self.variables()
            .into_iter()
            .filter_map(|v| match v {
                Variable::Work(i) => Some(i),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        // The label table is derived from the instructions.
        self.instructions == other.instructions
    }
}

impl Eq for Code {}

/// A callable sibling program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: String,
    display_name: String,
    code: Arc<Code>,
}

impl Function {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            code: Arc::new(Code::new(instructions)),
        }
    }

    /// Sets the human-readable name shown by inspection tooling.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn code(&self) -> &Code {
        &self.code
    }
}

/// The functions a program may call, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionTable {
    functions: BTreeMap<String, Function>,
}

impl FunctionTable {
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FromIterator<Function> for FunctionTable {
    fn from_iter<I: IntoIterator<Item = Function>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }
}

/// An S-language program at a given expansion level.
///
/// Programs are immutable; expansion builds a new `Program`. Cloning is cheap,
/// the code and the function table are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    name: String,
    code: Arc<Code>,
    functions: Arc<FunctionTable>,
    level: usize,
}

impl Program {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self::with_functions(name, instructions, std::iter::empty())
    }

    pub fn with_functions(
        name: impl Into<String>,
        instructions: Vec<Instruction>,
        functions: impl IntoIterator<Item = Function>,
    ) -> Self {
        Self {
            name: name.into(),
            code: Arc::new(Code::new(instructions)),
            functions: Arc::new(functions.into_iter().collect()),
            level: 0,
        }
    }

    /// Builds the program running `name` from the shared function table.
    pub fn for_function(&self, name: &str) -> Result<Self> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| EmulatorError::FunctionNotFound(name.to_string()))?;
        Ok(Self {
            name: function.name.clone(),
            code: function.code.clone(),
            functions: self.functions.clone(),
            level: 0,
        })
    }

    /// Same name and function table, new instruction sequence at `level`.
    pub(crate) fn derive(&self, instructions: Vec<Instruction>, level: usize) -> Self {
        Self {
            name: self.name.clone(),
            code: Arc::new(Code::new(instructions)),
            functions: self.functions.clone(),
            level,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn instructions(&self) -> &[Instruction] {
        self.code.instructions()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The expansion level this instruction sequence is at.
    pub const fn level(&self) -> usize {
        self.level
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// The declared input variables, i.e. every `x` the program references.
    pub fn inputs(&self) -> Vec<Variable> {
        self.code
            .variables()
            .into_iter()
            .filter(Variable::is_input)
            .collect()
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        self.code.variables()
    }

    /// Checks that labels are unique and resolve, and that every called
    /// function exists, for the program and every function body.
    pub fn validate(&self) -> Result<()> {
        self.code
            .validate(&format!("program {}", self.name), &self.functions)?;
        for function in self.functions.iter() {
            function
                .code
                .validate(&format!("function {}", function.name), &self.functions)?;
        }
        Ok(())
    }

    /// The number of expansion rounds that reduce this program to basic
    /// instructions under `policy`.
    pub fn max_expansion_level(&self, policy: CallInlining) -> Result<usize> {
        let mut levels = LevelAnalysis::new(&self.functions, policy);
        levels.code_level(&self.code)
    }

    /// The intrinsic expansion level of one instruction of this program.
    pub fn instruction_level(
        &self,
        instruction: &Instruction,
        policy: CallInlining,
    ) -> Result<usize> {
        LevelAnalysis::new(&self.functions, policy).instruction_level(instruction)
    }

    /// Highest `L<n>` and `z<n>` indices used anywhere, function bodies
    /// included.
    pub(crate) fn highest_name_indices(&self) -> (usize, usize) {
        std::iter::once(self.code.as_ref())
            .chain(self.functions.iter().map(|f| f.code.as_ref()))
            .fold((0, 0), |(label, work), code| {
                (
                    label.max(code.highest_label_index()),
                    work.max(code.highest_work_index()),
                )
            })
    }
}

impl fmt::Display for Program {
    /// Renders the program listing, one `#n (B|S) [label] text (cycles)` line
    /// per instruction.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in self.instructions().iter().enumerate() {
            writeln!(f, "{}", ListingLine(pc, instruction))?;
        }
        Ok(())
    }
}

/// A single line of a program listing for the instruction at `.0` (0-based).
pub struct ListingLine<'a>(pub usize, pub &'a Instruction);

impl fmt::Display for ListingLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ListingLine(pc, instruction) = self;
        let label = instruction
            .label
            .map(|l| l.to_string())
            .unwrap_or_default();
        write!(
            f,
            "#{} ({}) [{:<5}] {} ({})",
            pc + 1,
            instruction.kind().marker(),
            label,
            instruction.operation,
            instruction.cost()
        )
    }
}

/// Memoized intrinsic-level computation across the function table.
struct LevelAnalysis<'a> {
    functions: &'a FunctionTable,
    policy: CallInlining,
    memo: AHashMap<&'a str, usize>,
    in_progress: AHashSet<&'a str>,
}

impl<'a> LevelAnalysis<'a> {
    fn new(functions: &'a FunctionTable, policy: CallInlining) -> Self {
        Self {
            functions,
            policy,
            memo: AHashMap::new(),
            in_progress: AHashSet::new(),
        }
    }

    fn code_level(&mut self, code: &Code) -> Result<usize> {
        code.instructions()
            .iter()
            .try_fold(0, |max, i| Ok(max.max(self.instruction_level(i)?)))
    }

    fn instruction_level(&mut self, instruction: &Instruction) -> Result<usize> {
        match &instruction.operation {
            Operation::FunctionCall { call, .. } => match self.policy {
                CallInlining::Full => self.call_level(call),
                CallInlining::Boundary => Ok(0),
            },
            other => Ok(other
                .opcode()
                .expansion_level()
                .unwrap_or_else(|| unreachable!("only calls have operand-dependent levels"))),
        }
    }

    /// A call lowers to argument holders (nested calls included), zeroing, the
    /// callee body and a final assignment.
    fn call_level(&mut self, call: &Call) -> Result<usize> {
        let assignment = Opcode::Assignment.expansion_level().unwrap_or(2);
        let mut level = assignment.max(self.function_level(&call.function)?);
        for arg in &call.args {
            if let Argument::Call(nested) = arg {
                level = level.max(self.call_level(nested)?);
            }
        }
        Ok(level + 1)
    }

    fn function_level(&mut self, name: &str) -> Result<usize> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| EmulatorError::FunctionNotFound(name.to_string()))?;
        let name = function.name.as_str();
        if let Some(level) = self.memo.get(name) {
            return Ok(*level);
        }
        if !self.in_progress.insert(name) {
            return Err(EmulatorError::RecursiveFunction(name.to_string()));
        }
        let level = self.code_level(&function.code)?;
        self.in_progress.remove(name);
        self.memo.insert(name, level);
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X1: Variable = Variable::Input(1);
    const Y: Variable = Variable::Output;

    fn l(i: usize) -> Label {
        Label::Numbered(i)
    }

    #[test]
    fn test_labels_and_positions() {
        let program = Program::new(
            "loop",
            vec![
                Instruction::labeled(l(1), Operation::Decrease(X1)),
                Instruction::increase(Y),
                Instruction::jump_not_zero(X1, l(1)),
            ],
        );
        assert_eq!(program.code().position(l(1)), Some(0));
        assert_eq!(program.code().position(Label::Exit), Some(3));
        assert_eq!(program.code().position(l(2)), None);
        assert_eq!(program.inputs(), vec![X1]);
        assert!(program.validate().is_ok());
    }

    #[test]
    fn test_validate_errors() {
        let unknown = Program::new("bad", vec![Instruction::goto(l(9))]);
        assert!(matches!(
            unknown.validate(),
            Err(EmulatorError::UnknownLabel { label, .. }) if label == l(9)
        ));

        let duplicate = Program::new(
            "dup",
            vec![
                Instruction::labeled(l(1), Operation::Increase(Y)),
                Instruction::labeled(l(1), Operation::Increase(Y)),
            ],
        );
        assert!(matches!(
            duplicate.validate(),
            Err(EmulatorError::DuplicateLabel { .. })
        ));

        let missing = Program::new(
            "call",
            vec![Instruction::function_call(
                Y,
                Call::new("Id", vec![Call::new("Nope", vec![]).into()]),
            )],
        );
        assert_eq!(
            missing.validate(),
            Err(EmulatorError::FunctionNotFound("Id".to_string()))
        );
    }

    #[test]
    fn test_max_expansion_level() {
        let id = Function::new("Id", vec![Instruction::assignment(Y, X1)]);
        let program = Program::with_functions(
            "main",
            vec![
                Instruction::increase(X1),
                Instruction::zero_variable(Y),
                Instruction::function_call(Y, Call::new("Id", vec![X1.into()])),
            ],
            [id],
        );
        assert_eq!(program.max_expansion_level(CallInlining::Full), Ok(3));
        assert_eq!(program.max_expansion_level(CallInlining::Boundary), Ok(1));
        assert_eq!(
            program.instruction_level(&program.instructions()[0], CallInlining::Full),
            Ok(0)
        );
    }

    #[test]
    fn test_recursive_function() {
        let rec = Function::new(
            "Rec",
            vec![Instruction::function_call(Y, Call::new("Rec", vec![X1.into()]))],
        );
        let program = Program::with_functions(
            "main",
            vec![Instruction::function_call(Y, Call::new("Rec", vec![X1.into()]))],
            [rec],
        );
        assert!(program.validate().is_ok());
        assert_eq!(
            program.max_expansion_level(CallInlining::Full),
            Err(EmulatorError::RecursiveFunction("Rec".to_string()))
        );
        assert_eq!(program.max_expansion_level(CallInlining::Boundary), Ok(0));
    }

    #[test]
    fn test_listing() {
        let program = Program::new(
            "listing",
            vec![
                Instruction::labeled(l(1), Operation::Increase(X1)),
                Instruction::assignment(Y, X1),
            ],
        );
        let listing = program.to_string();
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "#1 (B) [L1   ] x1 <- x1 + 1 (1)");
        assert_eq!(lines[1], "#2 (S) [     ] y <- x1 (4)");
    }
}
