use crate::{
    model::{Label, Variable},
    program::Program,
};

/// Source of fresh labels and work variables, shared by every lowering of an
/// expansion so generated names never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingContext {
    next_label: usize,
    next_work: usize,
}

impl NamingContext {
    /// Starts handing out `L<next_label>` and `z<next_work>`.
    pub const fn new(next_label: usize, next_work: usize) -> Self {
        Self {
            next_label,
            next_work,
        }
    }

    /// Starts past every label and work variable used by `program` or any
    /// function it can call.
    pub fn seeded(program: &Program) -> Self {
        let (label, work) = program.highest_name_indices();
        Self::new(label + 1, work + 1)
    }

    pub fn fresh_label(&mut self) -> Label {
        let label = Label::Numbered(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn fresh_work(&mut self) -> Variable {
        let var = Variable::Work(self.next_work);
        self.next_work += 1;
        var
    }

    /// The next label index that would be handed out.
    pub const fn next_label(&self) -> usize {
        self.next_label
    }

    /// The next work-variable index that would be handed out.
    pub const fn next_work(&self) -> usize {
        self.next_work
    }
}
