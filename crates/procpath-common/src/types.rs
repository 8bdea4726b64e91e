//! Domain primitive types used across the procpath workspace.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

bitflags::bitflags! {
    /// Access requested on the final path component.
    ///
    /// Bits are combined with `|`; a check succeeds only if every requested
    /// bit is granted at once. The empty mode only checks that the path
    /// resolves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMode: u32 {
        /// Read access (`R_OK`).
        const READ = 0o4;
        /// Write access (`W_OK`).
        const WRITE = 0o2;
        /// Execute access, or search for directories (`X_OK`).
        const EXECUTE = 0o1;
    }
}

/// Error returned when an access mode string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid access mode {input:?}: expected a combination of r, w, x or an octal digit")]
pub struct ParseAccessModeError {
    input: String,
}

impl FromStr for AccessMode {
    type Err = ParseAccessModeError;

    /// Parses `rwx`-style strings (`"r"`, `"rw"`, `"r-x"`, `"-"`) or a
    /// single octal digit (`"6"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAccessModeError {
            input: s.to_string(),
        };
        if s.is_empty() {
            return Err(err());
        }
        if let Ok(digit) = u32::from_str_radix(s, 8) {
            return Self::from_bits(digit).ok_or_else(err);
        }

        let mut mode = Self::empty();
        for c in s.chars() {
            match c {
                'r' => mode |= Self::READ,
                'w' => mode |= Self::WRITE,
                'x' => mode |= Self::EXECUTE,
                '-' => {}
                _ => return Err(err()),
            }
        }
        Ok(mode)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |bit: Self, c: char| if self.contains(bit) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Self::READ, 'r'),
            flag(Self::WRITE, 'w'),
            flag(Self::EXECUTE, 'x')
        )
    }
}
