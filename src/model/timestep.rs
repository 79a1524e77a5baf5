//! Timestep block rewriting
//!
//! Only the first `Timestep,...;` record is touched. Every other byte of the
//! model is carried over unchanged, whatever its encoding.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::EpqcError;

static TIMESTEP_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m-u)^[ \t]*(Timestep[ \t]*,[^;]*;)").expect("Invalid regex pattern")
});

/// Timesteps per hour accepted by the launcher
pub const VALID_TIMESTEPS: [u32; 4] = [1, 2, 4, 6];

/// Simulation timesteps per hour, restricted to 1, 2, 4 or 6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestepValue(u32);

impl TimestepValue {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for TimestepValue {
    type Error = EpqcError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if VALID_TIMESTEPS.contains(&value) {
            Ok(Self(value))
        } else {
            Err(EpqcError::InvalidTimestepValue {
                value: value.to_string(),
            })
        }
    }
}

/// Parses the raw command-line text, so `-1` or `2.5` fail the same way `3` does
impl FromStr for TimestepValue {
    type Err = EpqcError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        raw.parse::<u32>()
            .map_err(|_| EpqcError::InvalidTimestepValue {
                value: raw.to_string(),
            })
            .and_then(Self::try_from)
    }
}

impl fmt::Display for TimestepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replace the first timestep block with `Timestep,\n    <value>;`.
///
/// Returns `None` when the model has no timestep block. Indentation before
/// the keyword is kept.
pub fn rewrite_timestep(model: &[u8], timestep: TimestepValue) -> Option<Vec<u8>> {
    let block = TIMESTEP_BLOCK.captures(model)?.get(1)?;
    let replacement = format!("Timestep,\n    {timestep};");

    let mut updated = Vec::with_capacity(model.len() + replacement.len());
    updated.extend_from_slice(&model[..block.start()]);
    updated.extend_from_slice(replacement.as_bytes());
    updated.extend_from_slice(&model[block.end()..]);
    Some(updated)
}
