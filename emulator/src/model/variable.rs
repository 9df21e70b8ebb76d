use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::error::EmulatorError;

/// A namespace-tagged variable name.
///
/// The derived ordering (`y`, then `x1, x2, ...`, then `z1, z2, ...`) is the
/// order used by every snapshot and listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    /// The distinguished output variable `y`.
    Output,
    /// Input argument `x<n>`, 1-based.
    Input(usize),
    /// Work variable `z<n>`, 1-based.
    Work(usize),
}

impl Variable {
    pub const fn input(index: usize) -> Self {
        Self::Input(index)
    }

    pub const fn work(index: usize) -> Self {
        Self::Work(index)
    }

    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    pub const fn is_work(&self) -> bool {
        matches!(self, Self::Work(_))
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Output => write!(f, "y"),
            Variable::Input(i) => write!(f, "x{i}"),
            Variable::Work(i) => write!(f, "z{i}"),
        }
    }
}

impl FromStr for Variable {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("y") {
            return Ok(Variable::Output);
        }
        let bad = || EmulatorError::BadName(s.to_string());
        let (prefix, index) = s.split_at_checked(1).ok_or_else(bad)?;
        let index = parse_index(index).ok_or_else(bad)?;
        match prefix {
            "x" | "X" => Ok(Variable::Input(index)),
            "z" | "Z" => Ok(Variable::Work(index)),
            _ => Err(bad()),
        }
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A jump target: `L<n>` or the terminal label `EXIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Numbered(usize),
    Exit,
}

impl Label {
    pub const fn numbered(index: usize) -> Self {
        Self::Numbered(index)
    }

    pub const fn is_exit(&self) -> bool {
        matches!(self, Self::Exit)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `pad` so listings can align labels with a width specifier.
            Label::Numbered(i) => f.pad(&format!("L{i}")),
            Label::Exit => f.pad("EXIT"),
        }
    }
}

impl FromStr for Label {
    type Err = EmulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("exit") {
            return Ok(Label::Exit);
        }
        let bad = || EmulatorError::BadName(s.to_string());
        match s.split_at_checked(1) {
            Some(("L" | "l", index)) => parse_index(index).map(Label::Numbered).ok_or_else(bad),
            _ => Err(bad()),
        }
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Indices are 1-based and written without sign or leading `+`.
fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|&i| i > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_names() {
        assert_eq!("y".parse::<Variable>().unwrap(), Variable::Output);
        assert_eq!("x3".parse::<Variable>().unwrap(), Variable::Input(3));
        assert_eq!("Z12".parse::<Variable>().unwrap(), Variable::Work(12));
        assert_eq!(Variable::Work(7).to_string(), "z7");

        for bad in ["", "x", "x0", "w1", "x-1", "x+1", "yy"] {
            assert!(bad.parse::<Variable>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_label_names() {
        assert_eq!("L4".parse::<Label>().unwrap(), Label::Numbered(4));
        assert_eq!("exit".parse::<Label>().unwrap(), Label::Exit);
        assert_eq!(format!("[{:<5}]", Label::Numbered(2)), "[L2   ]");
        assert!("L".parse::<Label>().is_err());
        assert!("M1".parse::<Label>().is_err());
    }

    #[test]
    fn test_variable_order() {
        let mut vars = vec![
            Variable::Work(1),
            Variable::Input(2),
            Variable::Output,
            Variable::Input(1),
        ];
        vars.sort();
        assert_eq!(
            vars,
            vec![
                Variable::Output,
                Variable::Input(1),
                Variable::Input(2),
                Variable::Work(1)
            ]
        );
    }
}
