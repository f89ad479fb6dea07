//! Total-order ids.
//!
//! Every ledger, transaction and operation in history gets a 64-bit id that
//! sorts in canonical processing order. The id packs three counters:
//!
//! | bits   | field              |
//! |--------|--------------------|
//! | 63..32 | ledger sequence    |
//! | 31..12 | transaction order  |
//! | 11..0  | operation index    |
//!
//! Transaction order and operation index both start at 1; a zero operation
//! index denotes the transaction itself. Effects are addressed by the id of
//! the owning operation plus their order within that operation.

use std::fmt;

const LEDGER_SHIFT: u32 = 32;
const TRANSACTION_SHIFT: u32 = 12;
const TRANSACTION_MASK: u32 = (1 << 20) - 1;
const OPERATION_MASK: u32 = (1 << 12) - 1;

/// A total-order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Toid {
    pub ledger_sequence: u32,
    pub transaction_order: u32,
    pub operation_index: u32,
}

impl Toid {
    /// Build an id, failing if a counter overflows its bit field.
    pub fn new(ledger_sequence: u32, transaction_order: u32, operation_index: u32) -> Option<Self> {
        if transaction_order > TRANSACTION_MASK || operation_index > OPERATION_MASK {
            return None;
        }
        Some(Self {
            ledger_sequence,
            transaction_order,
            operation_index,
        })
    }

    /// Id of the transaction that owns this operation.
    pub fn transaction(&self) -> Self {
        Self {
            operation_index: 0,
            ..*self
        }
    }

    pub fn to_i64(&self) -> i64 {
        ((self.ledger_sequence as i64) << LEDGER_SHIFT)
            | ((self.transaction_order as i64) << TRANSACTION_SHIFT)
            | self.operation_index as i64
    }

    pub fn from_i64(id: i64) -> Self {
        Self {
            ledger_sequence: (id >> LEDGER_SHIFT) as u32,
            transaction_order: ((id >> TRANSACTION_SHIFT) as u32) & TRANSACTION_MASK,
            operation_index: (id as u32) & OPERATION_MASK,
        }
    }

    /// Paging token for this id (its decimal form).
    pub fn paging_token(&self) -> String {
        self.to_i64().to_string()
    }

    /// Id of the `order`-th effect (1-based) of this operation.
    pub fn effect_id(&self, order: u32) -> String {
        format!("{:019}-{:010}", self.to_i64(), order)
    }
}

impl fmt::Display for Toid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_i64())
    }
}
