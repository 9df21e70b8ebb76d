use std::fmt::Write;

use crate::{model::Instruction, program::ListingLine};

/// Link from an instruction to the instruction one level down it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationNode {
    /// Index of the parent in the previous level.
    pub parent: usize,
    /// `false` when the parent was copied through unchanged.
    pub replaced: bool,
}

impl DerivationNode {
    pub(crate) const fn replaced(parent: usize) -> Self {
        Self {
            parent,
            replaced: true,
        }
    }

    pub(crate) const fn copied(parent: usize) -> Self {
        Self {
            parent,
            replaced: false,
        }
    }
}

/// Records, for every round of an expansion, the instruction sequence it
/// produced and where each of its instructions came from.
///
/// Level 0 is the source program; level `r` is the output of round `r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationForest {
    levels: Vec<Vec<Instruction>>,
    /// `links[r - 1][i]` points from instruction `i` of level `r` into level `r - 1`.
    links: Vec<Vec<DerivationNode>>,
}

impl DerivationForest {
    pub(crate) fn new(source: Vec<Instruction>) -> Self {
        Self {
            levels: vec![source],
            links: Vec::new(),
        }
    }

    pub(crate) fn push_round(
        &mut self,
        instructions: Vec<Instruction>,
        links: Vec<DerivationNode>,
    ) {
        debug_assert_eq!(instructions.len(), links.len());
        self.levels.push(instructions);
        self.links.push(links);
    }

    /// Number of rounds recorded.
    pub fn rounds(&self) -> usize {
        self.links.len()
    }

    /// The instruction sequence at `level`, if that many rounds were recorded.
    pub fn level(&self, level: usize) -> Option<&[Instruction]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    /// The most expanded sequence.
    pub fn top(&self) -> &[Instruction] {
        self.levels.last().map(Vec::as_slice).unwrap_or_default()
    }

    /// The link of instruction `index` at `level` (`level >= 1`).
    pub fn node(&self, level: usize, index: usize) -> Option<DerivationNode> {
        let round = level.checked_sub(1)?;
        self.links.get(round)?.get(index).copied()
    }

    /// Positions `(level, index)` from the top-level instruction `index` down
    /// to its root in the source program.
    pub fn ancestry(&self, index: usize) -> Vec<(usize, usize)> {
        let mut level = self.rounds();
        if index >= self.top().len() {
            return Vec::new();
        }
        let mut chain = vec![(level, index)];
        let mut current = index;
        while let Some(node) = self.node(level, current) {
            level -= 1;
            current = node.parent;
            chain.push((level, current));
        }
        chain
    }

    /// Index in the source program of the instruction that top-level
    /// instruction `index` ultimately derives from.
    pub fn origin(&self, index: usize) -> Option<usize> {
        self.ancestry(index).last().map(|&(_, i)| i)
    }

    /// Renders the creation chain of top-level instruction `index`, newest
    /// first, joined by `>>>`. Copy-through steps are omitted.
    pub fn render_lineage(&self, index: usize) -> String {
        let mut out = String::new();
        for (level, i) in self.ancestry(index) {
            let is_copy = self.node(level, i).is_some_and(|node| !node.replaced);
            if is_copy {
                continue;
            }
            if !out.is_empty() {
                out.push_str(" >>> ");
            }
            let instruction = &self.levels[level][i];
            let _ = write!(out, "{}", ListingLine(i, instruction));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, Variable};

    fn forest() -> DerivationForest {
        let x1 = Variable::Input(1);
        let z1 = Variable::Work(1);
        let mut forest = DerivationForest::new(vec![
            Instruction::increase(x1),
            Instruction::goto(Label::Exit),
        ]);
        forest.push_round(
            vec![
                Instruction::increase(x1),
                Instruction::increase(z1),
                Instruction::jump_not_zero(z1, Label::Exit),
            ],
            vec![
                DerivationNode::copied(0),
                DerivationNode::replaced(1),
                DerivationNode::replaced(1),
            ],
        );
        forest
    }

    #[test]
    fn test_ancestry_and_origin() {
        let forest = forest();
        assert_eq!(forest.rounds(), 1);
        assert_eq!(forest.ancestry(2), vec![(1, 2), (0, 1)]);
        assert_eq!(forest.origin(0), Some(0));
        assert_eq!(forest.origin(1), Some(1));
        assert_eq!(forest.origin(3), None);
    }

    #[test]
    fn test_render_lineage() {
        let forest = forest();
        assert_eq!(
            forest.render_lineage(1),
            "#2 (B) [     ] z1 <- z1 + 1 (1) >>> #2 (S) [     ] GOTO EXIT (1)"
        );
        // Copied instructions show only their source line.
        assert_eq!(forest.render_lineage(0), "#1 (B) [     ] x1 <- x1 + 1 (1)");
    }
}
