//! Elecraft extension levels and the capability table.
//!
//! Sending `K2;` to a K2 (or a K3-family rig emulating one) returns `K2n;`
//! where `n` reports the command mode; `K3;` on a K3-family rig returns
//! `K3n;`. The reply string is matched verbatim against
//! [`CAPABILITY_TABLE`]. A reply that is not in the table means the rig has
//! no relevant extension, so it maps to [`ExtensionLevel::None`] rather than
//! an error.

use std::fmt;

/// Extension tier reported by one sub-device, ordered from least to most
/// capable within each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ExtensionLevel {
    /// No recognised extension.
    #[default]
    None,
    /// K2 normal mode.
    K20,
    /// K2 normal mode with extensions.
    K21,
    /// K2 extended mode.
    K22,
    /// K2 extended mode with extensions.
    K23,
    /// K3 normal mode.
    K30,
    /// K3 extended mode.
    K31,
}

/// Identity string to level, scanned in order; first match wins.
pub const CAPABILITY_TABLE: &[(&str, ExtensionLevel)] = &[
    ("K20", ExtensionLevel::K20),
    ("K21", ExtensionLevel::K21),
    ("K22", ExtensionLevel::K22),
    ("K23", ExtensionLevel::K23),
    ("K30", ExtensionLevel::K30),
    ("K31", ExtensionLevel::K31),
];

impl ExtensionLevel {
    /// The identity string the rig reports for this level, if any.
    pub fn id(&self) -> Option<&'static str> {
        CAPABILITY_TABLE
            .iter()
            .find(|(_, level)| level == self)
            .map(|(id, _)| *id)
    }
}

impl fmt::Display for ExtensionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().unwrap_or("none"))
    }
}

/// Map a probe reply to its level.
pub fn lookup_extension(id: &str) -> ExtensionLevel {
    CAPABILITY_TABLE
        .iter()
        .find(|(entry, _)| *entry == id)
        .map(|(_, level)| *level)
        .unwrap_or_default()
}

/// A separately probed unit within one rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubDevice {
    /// The K2 command set (base unit).
    K2,
    /// The K3 command set (present on K3-family rigs only).
    K3,
}

impl SubDevice {
    /// Bare probe command token.
    pub fn probe_token(&self) -> &'static str {
        match self {
            SubDevice::K2 => "K2",
            SubDevice::K3 => "K3",
        }
    }
}

impl fmt::Display for SubDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.probe_token())
    }
}
