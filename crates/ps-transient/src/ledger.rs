//! Pending changes and the ledger that superposes them.
//!
//! Every detected step becomes a [`PendingChange`]: a signed magnitude paired
//! with the decay curve that releases it over time. A [`ChangeLedger`] keeps
//! the changes of one element in chronological order and folds them into a
//! single net delta. Overlapping steps therefore add up as independent step
//! responses instead of restarting one response toward the latest target.

use crate::decay::DecayCurve;
use crate::error::SimResult;

/// How much of a change has been released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// Still following its curve.
    Curve(DecayCurve),
    /// Fully applied; contributes its whole magnitude.
    Settled,
}

/// One discrete step awaiting (or done with) its transient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingChange {
    magnitude: f64,
    release: Release,
}

impl PendingChange {
    /// A change that is already fully applied.
    pub fn settled(magnitude: f64) -> Self {
        Self {
            magnitude,
            release: Release::Settled,
        }
    }

    /// A change starting at `now`, released with time constant `tau`.
    ///
    /// The curve rises for a positive magnitude and drops otherwise, so the
    /// contribution always moves from 0 toward `magnitude`.
    pub fn start(magnitude: f64, tau: f64, now: f64) -> SimResult<Self> {
        let mut curve = DecayCurve::new(tau)?;
        if magnitude > 0.0 {
            curve.rise(now);
        } else {
            curve.drop(now);
        }
        Ok(Self {
            magnitude,
            release: Release::Curve(curve),
        })
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Part of the magnitude applied at `now`.
    ///
    /// The curve's sign only encodes direction; the magnitude already carries
    /// it, so the unsigned progress is used here.
    pub fn contribution(&self, now: f64) -> f64 {
        match &self.release {
            Release::Settled => self.magnitude,
            Release::Curve(curve) => self.magnitude * curve.magnitude_at(now),
        }
    }

    pub fn is_settled(&self, now: f64) -> bool {
        match &self.release {
            Release::Settled => true,
            Release::Curve(curve) => curve.is_settled(now),
        }
    }
}

/// Result of folding a ledger at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fold {
    /// Sum of every change's contribution.
    pub net_delta: f64,
    /// Whether every change has fully settled.
    pub all_settled: bool,
}

/// Ordered record of the steps applied to one transient element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLedger {
    changes: Vec<PendingChange>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, change: PendingChange) {
        self.changes.push(change);
    }

    /// Net delta at `now` and whether nothing is left in transition.
    pub fn fold(&self, now: f64) -> Fold {
        self.changes.iter().fold(
            Fold {
                net_delta: 0.0,
                all_settled: true,
            },
            |acc, change| Fold {
                net_delta: acc.net_delta + change.contribution(now),
                all_settled: acc.all_settled && change.is_settled(now),
            },
        )
    }

    /// Collapse the whole history into one settled change of `net_delta`.
    pub fn compact(&mut self, net_delta: f64) {
        self.changes.clear();
        self.changes.push(PendingChange::settled(net_delta));
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingChange> {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_is_settled_at_zero() {
        let ledger = ChangeLedger::new();
        let fold = ledger.fold(3.0);
        assert_eq!(fold.net_delta, 0.0);
        assert!(fold.all_settled);
    }

    #[test]
    fn negative_change_moves_down() {
        let change = PendingChange::start(-10.0, 1.0, 0.0).unwrap();
        assert_eq!(change.contribution(0.0), 0.0);
        let half = change.contribution(1.0);
        assert!(half < 0.0 && half > -10.0);
        assert_eq!(change.contribution(20.0), -10.0);
    }

    #[test]
    fn overlapping_changes_superpose() {
        let tau = 2.0;
        let mut ledger = ChangeLedger::new();
        ledger.append(PendingChange::start(50.0, tau, 0.0).unwrap());
        ledger.append(PendingChange::start(30.0, tau, 1.0).unwrap());

        let t = 3.0;
        let expected = 50.0 * (1.0 - (-t / tau).exp()) + 30.0 * (1.0 - (-(t - 1.0) / tau).exp());
        let restarted = 80.0 * (1.0 - (-(t - 1.0) / tau).exp());

        let fold = ledger.fold(t);
        assert!((fold.net_delta - expected).abs() < 1e-9);
        assert!((fold.net_delta - restarted).abs() > 1.0);
        assert!(!fold.all_settled);
    }

    #[test]
    fn compaction_keeps_one_settled_entry() {
        let mut ledger = ChangeLedger::new();
        ledger.append(PendingChange::start(5.0, 1.0, 0.0).unwrap());
        ledger.append(PendingChange::start(-2.0, 1.0, 0.5).unwrap());
        let fold = ledger.fold(30.0);
        assert!(fold.all_settled);
        assert_eq!(fold.net_delta, 3.0);

        ledger.compact(fold.net_delta);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.fold(30.0).net_delta, 3.0);
        assert_eq!(ledger.fold(1_000.0).net_delta, 3.0);
    }

    #[test]
    fn invalid_tau_propagates() {
        assert!(PendingChange::start(1.0, 0.0, 0.0).is_err());
    }
}
