use serde::Serialize;
use std::fmt;

///
/// ErrorTree
///
/// Flat aggregate of validation failures collected across staged passes.
/// Order is deterministic: errors appear in the order passes emitted them.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ErrorTree {
    errors: Vec<String>,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a validation failure.
    pub fn add(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Fold another tree's errors into this one, preserving order.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Collapse into a `Result`, succeeding only when no errors were added.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

/// Push a formatted validation failure onto an [`ErrorTree`].
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}
