//! Content-policy labels derived from a child's age.

use std::fmt;

use super::error::ProvisionError;

pub const MIN_CHILD_AGE: i64 = 1;
pub const MAX_CHILD_AGE: i64 = 17;

/// Content-filtering tier attached to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    /// Ages 1-12.
    Strict,
    /// Ages 13-15.
    Moderate,
    /// Ages 16-17.
    Light,
    /// Adult profiles.
    Standard,
}

impl ContentPolicy {
    /// Policy for a child of the given age.
    pub fn for_child_age(age: i64) -> Result<Self, ProvisionError> {
        match age {
            1..=12 => Ok(Self::Strict),
            13..=15 => Ok(Self::Moderate),
            16..=17 => Ok(Self::Light),
            _ => Err(ProvisionError::Validation(format!(
                "Child age must be between {MIN_CHILD_AGE} and {MAX_CHILD_AGE} (got {age})"
            ))),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Light => "light",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for ContentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn age_bands() {
        for age in 1..=12 {
            assert_eq!(ContentPolicy::for_child_age(age).unwrap(), ContentPolicy::Strict);
        }
        for age in 13..=15 {
            assert_eq!(ContentPolicy::for_child_age(age).unwrap(), ContentPolicy::Moderate);
        }
        for age in 16..=17 {
            assert_eq!(ContentPolicy::for_child_age(age).unwrap(), ContentPolicy::Light);
        }
    }

    #[test]
    fn out_of_range_ages_are_rejected() {
        for age in [-1, 0, 18, 40] {
            assert!(matches!(
                ContentPolicy::for_child_age(age),
                Err(ProvisionError::Validation(_))
            ));
        }
    }
}
