//! Rewrites synthetic instructions into their canonical lowerings, one level
//! per round, while recording where every generated instruction came from.

mod derivation;
mod lowering;
mod naming;

pub use derivation::{DerivationForest, DerivationNode};
pub(crate) use lowering::representative_level;
pub use naming::NamingContext;
use tracing::{debug, instrument};

use crate::{
    config::CallInlining,
    error::{EmulatorError, Result},
    model::Instruction,
    opcodes::Opcode,
    program::Program,
};

/// The result of expanding a program: the expanded program and the
/// derivation forest linking it back to the source.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub program: Program,
    pub forest: DerivationForest,
}

/// Converts a signed level request into a level, rejecting anything outside
/// `0..=max`.
pub fn checked_level(requested: i64, max: usize) -> Result<usize> {
    usize::try_from(requested)
        .ok()
        .filter(|level| *level <= max)
        .ok_or(EmulatorError::InvalidExpandLevel { requested, max })
}

/// Expands `program` to `level`.
///
/// Every round lowers each synthetic instruction by one level, so after
/// `max_expansion_level` rounds only basic instructions remain. Under
/// [`CallInlining::Boundary`] calls are copied through untouched. Fails
/// without producing anything when the program does not validate or `level`
/// exceeds the maximum. Level 0 needs no level analysis, so it also accepts
/// programs with recursive functions.
#[instrument(level = "debug", skip(program), fields(program = program.name()))]
pub fn expand(program: &Program, level: usize, policy: CallInlining) -> Result<Expansion> {
    program.validate()?;
    if level == 0 {
        return Ok(Expansion {
            program: program.clone(),
            forest: DerivationForest::new(program.instructions().to_vec()),
        });
    }
    let max = program.max_expansion_level(policy)?;
    if level > max {
        return Err(EmulatorError::InvalidExpandLevel {
            requested: i64::try_from(level).unwrap_or(i64::MAX),
            max,
        });
    }

    let mut naming = NamingContext::seeded(program);
    let mut forest = DerivationForest::new(program.instructions().to_vec());
    for round in 1..=level {
        let current = forest.top();
        let mut next = Vec::with_capacity(current.len());
        let mut links = Vec::with_capacity(current.len());
        for (index, instruction) in current.iter().enumerate() {
            if lowers(instruction, policy) {
                let lowered = lowering::lower(instruction, &mut naming, program.functions())?;
                links.resize(links.len() + lowered.len(), DerivationNode::replaced(index));
                next.extend(lowered);
            } else {
                next.push(instruction.clone());
                links.push(DerivationNode::copied(index));
            }
        }
        debug!(round, instructions = next.len(), "expansion round");
        forest.push_round(next, links);
    }

    Ok(Expansion {
        program: program.derive(forest.top().to_vec(), level),
        forest,
    })
}

fn lowers(instruction: &Instruction, policy: CallInlining) -> bool {
    match instruction.opcode() {
        Opcode::FunctionCall => policy == CallInlining::Full,
        opcode => !opcode.is_basic(),
    }
}
