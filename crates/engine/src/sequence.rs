//! Ordering of remote fetches.
//!
//! Responses may come back in any order. Each fetch takes a ticket when it
//! starts; a response is applied only if its ticket is newer than everything
//! applied or invalidated so far.

/// Monotonic id of one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default, Clone)]
pub struct Sequencer {
    issued: u64,
    floor: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Returns `true` and records the ticket when its response must be applied.
    pub fn accept(&mut self, ticket: FetchTicket) -> bool {
        if ticket.0 <= self.floor {
            tracing::debug!(ticket = ticket.0, floor = self.floor, "discarding stale response");
            return false;
        }
        self.floor = ticket.0;
        true
    }

    /// Makes every ticket issued so far stale.
    pub fn invalidate(&mut self) {
        self.floor = self.issued;
    }
}
