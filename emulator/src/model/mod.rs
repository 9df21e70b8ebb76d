//! The S-language instruction model.
//!
//! Variables and labels are small `Copy` names; an [`Instruction`] is an
//! [`Operation`] (a closed sum type over every basic and synthetic variant)
//! plus the label attached to it.

mod instruction;
mod variable;

pub use instruction::{Argument, Call, Instruction, Operation};
pub use variable::{Label, Variable};
