// ── Control metadata and derived capabilities ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic role of a control pair, decoded from the controller's
/// numeric control-use code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlUse {
    On,
    Off,
    Dim,
    Lock,
    Unlock,
    /// Any code this library does not interpret.
    Unknown,
}

impl ControlUse {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::On,
            2 => Self::Off,
            3 => Self::Dim,
            18 => Self::Lock,
            19 => Self::Unlock,
            _ => Self::Unknown,
        }
    }
}

/// Inclusive value range advertised by a range-style control pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub start: f64,
    pub end: f64,
}

impl ValueRange {
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// One control pair: a value (or range) the device accepts, tagged with
/// its semantic role and optional UI label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPair {
    pub use_kind: ControlUse,
    pub label: Option<String>,
    /// The value sent to trigger this control.
    pub control_value: f64,
    pub range: Option<ValueRange>,
}

/// A high-level operation a consumer can ask a device to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    TurnOn,
    TurnOff,
    SetDimLevel,
    Lock,
    Unlock,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TurnOn => "turn on",
            Self::TurnOff => "turn off",
            Self::SetDimLevel => "set dim level",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
        };
        f.write_str(name)
    }
}

/// The capability variant a device was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    StatusOnly,
    Switchable,
    Dimmable,
    Lockable,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StatusOnly => "status-only",
            Self::Switchable => "switchable",
            Self::Dimmable => "dimmable",
            Self::Lockable => "lockable",
        };
        f.write_str(name)
    }
}

/// Derived capabilities of a device, carrying the concrete control
/// values needed to actuate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Capabilities {
    /// Readable state, no controls this library understands.
    StatusOnly,
    Switchable { on_value: f64, off_value: f64 },
    /// Switchable plus a continuous dim range; `on_value` is the value
    /// that represents 100%.
    Dimmable { on_value: f64, off_value: f64 },
    Lockable { lock_value: f64, unlock_value: f64 },
}

impl Capabilities {
    pub fn variant(&self) -> Variant {
        match self {
            Self::StatusOnly => Variant::StatusOnly,
            Self::Switchable { .. } => Variant::Switchable,
            Self::Dimmable { .. } => Variant::Dimmable,
            Self::Lockable { .. } => Variant::Lockable,
        }
    }

    /// Operations supported by this capability set.
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Self::StatusOnly => &[],
            Self::Switchable { .. } => &[Operation::TurnOn, Operation::TurnOff],
            Self::Dimmable { .. } => &[
                Operation::TurnOn,
                Operation::TurnOff,
                Operation::SetDimLevel,
            ],
            Self::Lockable { .. } => &[Operation::Lock, Operation::Unlock],
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_use_codes_decode() {
        assert_eq!(ControlUse::from_code(1), ControlUse::On);
        assert_eq!(ControlUse::from_code(2), ControlUse::Off);
        assert_eq!(ControlUse::from_code(3), ControlUse::Dim);
        assert_eq!(ControlUse::from_code(18), ControlUse::Lock);
        assert_eq!(ControlUse::from_code(19), ControlUse::Unlock);
        assert_eq!(ControlUse::from_code(99), ControlUse::Unknown);
    }

    #[test]
    fn dimmable_supports_switch_operations() {
        let caps = Capabilities::Dimmable {
            on_value: 99.0,
            off_value: 0.0,
        };
        assert!(caps.supports(Operation::TurnOn));
        assert!(caps.supports(Operation::SetDimLevel));
        assert!(!caps.supports(Operation::Lock));
    }

    #[test]
    fn lockable_rejects_switch_operations() {
        let caps = Capabilities::Lockable {
            lock_value: 255.0,
            unlock_value: 0.0,
        };
        assert!(caps.supports(Operation::Lock));
        assert!(!caps.supports(Operation::TurnOn));
    }
}
