use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when an id attribute does not hold a usable number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("'{0}' is not a base-10 integer")]
    NotNumeric(String),
    #[error("{0} is not a positive element id")]
    NotPositive(i64),
}

/// The runtime id of an element, unique within a design.
///
/// Always in `1..=i64::MAX`, so every element id is also a valid [`BaseId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Returns `None` for zero and for values that do not fit in an `i64`.
    pub fn new(value: u64) -> Option<Self> {
        match i64::try_from(value) {
            Ok(signed) if signed > 0 => Some(ElementId(value)),
            _ => None,
        }
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl FromStr for ElementId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<i64>()
            .map_err(|_| IdParseError::NotNumeric(s.to_string()))?;
        if value <= 0 {
            return Err(IdParseError::NotPositive(value));
        }
        Ok(ElementId(value as u64))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Template-scoped id of a virtual child.
///
/// A base id is assigned when the template is authored and stays stable no
/// matter which runtime [`ElementId`] the derived element ends up with. Any
/// integer is accepted here; whether it resolves is decided by the
/// structural index of the owning element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseId(i64);

impl BaseId {
    pub fn new(value: i64) -> Self {
        BaseId(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<ElementId> for BaseId {
    fn from(id: ElementId) -> Self {
        // Lossless, `ElementId` never exceeds i64::MAX.
        BaseId(id.0 as i64)
    }
}

impl FromStr for BaseId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(BaseId)
            .map_err(|_| IdParseError::NotNumeric(s.to_string()))
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
