//! Strongly-typed ID wrappers and the per-kind identity allocator
//!
//! Every entity kind gets its own integer id space. Using newtype wrappers
//! prevents accidentally mixing up IDs from different entity types at
//! compile time, and [`IdCounters`] hands out the next free id of each kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the underlying integer
            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }
    };
}

define_id!(AccountId, "acc-");
define_id!(PotId, "pot-");
define_id!(TransactionId, "txn-");
define_id!(EventId, "evt-");
define_id!(ScheduleId, "sch-");

/// Entity kinds that own an id counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Account,
    Pot,
    Transaction,
    Event,
    Schedule,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Account,
        EntityKind::Pot,
        EntityKind::Transaction,
        EntityKind::Event,
        EntityKind::Schedule,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Account => write!(f, "account"),
            EntityKind::Pot => write!(f, "pot"),
            EntityKind::Transaction => write!(f, "transaction"),
            EntityKind::Event => write!(f, "event"),
            EntityKind::Schedule => write!(f, "schedule"),
        }
    }
}

fn first_id() -> u64 {
    1
}

/// Next-id counters, one per entity kind, persisted with the snapshot
///
/// Ids are never reused: a counter only moves forward, including across
/// deletions of the entity that last received an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdCounters {
    #[serde(default = "first_id")]
    pub next_account_id: u64,
    #[serde(default = "first_id")]
    pub next_pot_id: u64,
    #[serde(default = "first_id")]
    pub next_transaction_id: u64,
    #[serde(default = "first_id")]
    pub next_event_id: u64,
    #[serde(default = "first_id")]
    pub next_schedule_id: u64,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_account_id: 1,
            next_pot_id: 1,
            next_transaction_id: 1,
            next_event_id: 1,
            next_schedule_id: 1,
        }
    }
}

impl IdCounters {
    fn slot(&mut self, kind: EntityKind) -> &mut u64 {
        match kind {
            EntityKind::Account => &mut self.next_account_id,
            EntityKind::Pot => &mut self.next_pot_id,
            EntityKind::Transaction => &mut self.next_transaction_id,
            EntityKind::Event => &mut self.next_event_id,
            EntityKind::Schedule => &mut self.next_schedule_id,
        }
    }

    /// The id the next call to [`IdCounters::next`] will return
    pub fn peek(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Account => self.next_account_id,
            EntityKind::Pot => self.next_pot_id,
            EntityKind::Transaction => self.next_transaction_id,
            EntityKind::Event => self.next_event_id,
            EntityKind::Schedule => self.next_schedule_id,
        }
    }

    /// Issue the current counter value and advance it
    pub fn next(&mut self, kind: EntityKind) -> u64 {
        let slot = self.slot(kind);
        let id = *slot;
        *slot += 1;
        id
    }

    /// Raise a counter past the largest id already in use
    ///
    /// Documents written without counters (or with stale ones) would otherwise
    /// hand out ids that collide with live entities. Returns true when the
    /// counter had to move.
    pub fn repair(&mut self, kind: EntityKind, max_existing: Option<u64>) -> bool {
        let floor = max_existing.map_or(1, |max| max + 1);
        let slot = self.slot(kind);
        if *slot < floor {
            *slot = floor;
            true
        } else {
            false
        }
    }
}
