// ── Capability classification ──
//
// Derives a device's capability variant from its control pairs.
// Classification looks only at control metadata, never at the device's
// current value or type string, so a device classifies the same way
// regardless of its state at fetch time.

use tracing::trace;

use crate::model::{Capabilities, ControlPair, ControlUse};

/// Classify a device's control pairs into a capability variant.
///
/// Rules, in order:
/// 1. On + Off pairs present, and some range pair overlaps the on/off
///    span: `Dimmable`.
/// 2. On + Off pairs present, no such range: `Switchable`.
/// 3. Lock + Unlock pairs present (by control-use code or by the exact
///    labels "Lock"/"Unlock"): `Lockable`.
/// 4. Otherwise: `StatusOnly`.
///
/// On/Off classification wins over Lock/Unlock when a device carries
/// both, so mislabeled switches stay switchable.
pub fn classify(pairs: &[ControlPair]) -> Capabilities {
    let on = pairs.iter().find(|p| p.use_kind == ControlUse::On);
    let off = pairs.iter().find(|p| p.use_kind == ControlUse::Off);

    if let (Some(on), Some(off)) = (on, off) {
        let on_value = on.control_value;
        let off_value = off.control_value;
        if has_dim_range(pairs, on_value, off_value) {
            return Capabilities::Dimmable { on_value, off_value };
        }
        return Capabilities::Switchable { on_value, off_value };
    }

    let lock = pairs.iter().find(|p| is_lock(p));
    let unlock = pairs.iter().find(|p| is_unlock(p));
    if let (Some(lock), Some(unlock)) = (lock, unlock) {
        return Capabilities::Lockable {
            lock_value: lock.control_value,
            unlock_value: unlock.control_value,
        };
    }

    trace!(pair_count = pairs.len(), "no recognized controls, status-only");
    Capabilities::StatusOnly
}

/// A dim range counts when it overlaps the span between the off and on
/// values, so intermediate levels are actually reachable.
fn has_dim_range(pairs: &[ControlPair], on_value: f64, off_value: f64) -> bool {
    let lo = on_value.min(off_value);
    let hi = on_value.max(off_value);
    pairs.iter().any(|p| {
        if p.use_kind == ControlUse::Dim {
            return true;
        }
        if matches!(
            p.use_kind,
            ControlUse::On | ControlUse::Off | ControlUse::Lock | ControlUse::Unlock
        ) {
            return false;
        }
        p.range.is_some_and(|r| r.start <= hi && r.end >= lo)
    })
}

// Some locks report generic control-use codes but carry the canonical
// labels, so labels are accepted as a fallback.
fn is_lock(pair: &ControlPair) -> bool {
    pair.use_kind == ControlUse::Lock || pair.label.as_deref() == Some("Lock")
}

fn is_unlock(pair: &ControlPair) -> bool {
    pair.use_kind == ControlUse::Unlock || pair.label.as_deref() == Some("Unlock")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueRange;

    fn pair(use_kind: ControlUse, value: f64) -> ControlPair {
        ControlPair {
            use_kind,
            label: None,
            control_value: value,
            range: None,
        }
    }

    fn range_pair(start: f64, end: f64) -> ControlPair {
        ControlPair {
            use_kind: ControlUse::Unknown,
            label: None,
            control_value: start,
            range: Some(ValueRange { start, end }),
        }
    }

    #[test]
    fn on_off_without_range_is_switchable() {
        let caps = classify(&[
            pair(ControlUse::On, 255.0),
            pair(ControlUse::Off, 0.0),
        ]);
        assert_eq!(
            caps,
            Capabilities::Switchable {
                on_value: 255.0,
                off_value: 0.0
            }
        );
    }

    #[test]
    fn on_off_with_overlapping_range_is_dimmable() {
        let caps = classify(&[
            pair(ControlUse::On, 99.0),
            pair(ControlUse::Off, 0.0),
            range_pair(1.0, 98.0),
        ]);
        assert_eq!(
            caps,
            Capabilities::Dimmable {
                on_value: 99.0,
                off_value: 0.0
            }
        );
    }

    #[test]
    fn disjoint_range_does_not_make_dimmable() {
        // Range sits entirely above the on/off span.
        let caps = classify(&[
            pair(ControlUse::On, 1.0),
            pair(ControlUse::Off, 0.0),
            range_pair(100.0, 200.0),
        ]);
        assert_eq!(
            caps,
            Capabilities::Switchable {
                on_value: 1.0,
                off_value: 0.0
            }
        );
    }

    #[test]
    fn explicit_dim_pair_is_dimmable_regardless_of_range() {
        let caps = classify(&[
            pair(ControlUse::On, 99.0),
            pair(ControlUse::Off, 0.0),
            pair(ControlUse::Dim, 50.0),
        ]);
        assert!(matches!(caps, Capabilities::Dimmable { .. }));
    }

    #[test]
    fn lock_unlock_by_code_is_lockable() {
        let caps = classify(&[
            pair(ControlUse::Lock, 255.0),
            pair(ControlUse::Unlock, 0.0),
        ]);
        assert_eq!(
            caps,
            Capabilities::Lockable {
                lock_value: 255.0,
                unlock_value: 0.0
            }
        );
    }

    #[test]
    fn lock_unlock_by_label_is_lockable() {
        let lock = ControlPair {
            use_kind: ControlUse::Unknown,
            label: Some("Lock".into()),
            control_value: 255.0,
            range: None,
        };
        let unlock = ControlPair {
            use_kind: ControlUse::Unknown,
            label: Some("Unlock".into()),
            control_value: 0.0,
            range: None,
        };
        assert_eq!(
            classify(&[lock, unlock]),
            Capabilities::Lockable {
                lock_value: 255.0,
                unlock_value: 0.0
            }
        );
    }

    #[test]
    fn on_off_wins_over_lock_unlock() {
        let caps = classify(&[
            pair(ControlUse::On, 255.0),
            pair(ControlUse::Off, 0.0),
            pair(ControlUse::Lock, 255.0),
            pair(ControlUse::Unlock, 0.0),
        ]);
        assert!(matches!(caps, Capabilities::Switchable { .. }));
    }

    #[test]
    fn lock_without_unlock_is_status_only() {
        let caps = classify(&[pair(ControlUse::Lock, 255.0)]);
        assert_eq!(caps, Capabilities::StatusOnly);
    }

    #[test]
    fn no_pairs_is_status_only() {
        assert_eq!(classify(&[]), Capabilities::StatusOnly);
    }
}
