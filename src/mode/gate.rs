use std::time::{Duration, Instant};

/// Handle for one in-flight unit of work (a frame through a detector, a remote request).
///
/// Tickets are stamped with the activation epoch they were issued in. Completing a
/// ticket after the mode was deactivated or reactivated is a no-op.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    seq: u64,
    issued_at: Instant,
}

/// Per-mode active flag, busy gate and cancellation epoch.
///
/// At most one ticket is outstanding at a time.
#[derive(Debug, Default)]
pub struct ActivityGate {
    active: bool,
    epoch: u64,
    next_seq: u64,
    in_flight: Option<InFlight>,
}

impl ActivityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self) {
        self.epoch += 1;
        self.active = true;
        self.in_flight = None;
    }

    /// Invalidate outstanding work and release the busy gate.
    pub fn deactivate(&mut self) {
        self.epoch += 1;
        self.active = false;
        self.in_flight = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Acquire the gate if the mode is active and idle.
    pub fn try_begin(&mut self, now: Instant) -> Option<Ticket> {
        if !self.active || self.in_flight.is_some() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(InFlight {
            seq,
            issued_at: now,
        });
        Some(Ticket {
            epoch: self.epoch,
            seq,
        })
    }

    /// Release the gate for `ticket`. Returns false when the ticket is stale, in which
    /// case its result must be dropped.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        if ticket.epoch != self.epoch || !self.active {
            return false;
        }
        match self.in_flight {
            Some(in_flight) if in_flight.seq == ticket.seq => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Drop an outstanding ticket older than `timeout`. Returns true if one expired.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> bool {
        match self.in_flight {
            Some(in_flight) if now.saturating_duration_since(in_flight.issued_at) >= timeout => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_gate_issues_no_tickets() {
        let mut gate = ActivityGate::new();
        assert!(gate.try_begin(Instant::now()).is_none());
    }

    #[test]
    fn at_most_one_ticket_outstanding() {
        let now = Instant::now();
        let mut gate = ActivityGate::new();
        gate.activate();
        let ticket = gate.try_begin(now).unwrap();
        assert!(gate.is_busy());
        assert!(gate.try_begin(now).is_none());
        assert!(gate.finish(ticket));
        assert!(!gate.is_busy());
        assert!(gate.try_begin(now).is_some());
    }

    #[test]
    fn deactivation_makes_late_results_stale_and_releases_gate() {
        let now = Instant::now();
        let mut gate = ActivityGate::new();
        gate.activate();
        let ticket = gate.try_begin(now).unwrap();
        gate.deactivate();
        assert!(!gate.is_busy());
        gate.activate();
        assert!(!gate.finish(ticket));
        assert!(gate.try_begin(now).is_some());
    }

    #[test]
    fn expired_ticket_cannot_finish_later_work() {
        let now = Instant::now();
        let mut gate = ActivityGate::new();
        gate.activate();
        let old = gate.try_begin(now).unwrap();
        assert!(!gate.expire(now + Duration::from_secs(5), Duration::from_secs(15)));
        assert!(gate.expire(now + Duration::from_secs(15), Duration::from_secs(15)));
        let fresh = gate.try_begin(now + Duration::from_secs(16)).unwrap();
        assert!(!gate.finish(old));
        assert!(gate.is_busy());
        assert!(gate.finish(fresh));
    }
}
