//! Memory token allocation
//!
//! Tokens are the `StrRef#` and `2DAMEMORY#` handles the apply-time
//! interpreter binds to appended strings and inserted rows. The two spaces are
//! independent; ids within a space are issued in strictly increasing order.

use crate::value::ValueExpr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// `StrRef#`, bound to appended talk-table entries
    StringTable,
    /// `2DAMEMORY#`, bound to row indices and stored cell values
    Row,
}

impl TokenKind {
    /// Script prefix of the token space
    pub fn prefix(self) -> &'static str {
        match self {
            TokenKind::StringTable => "StrRef",
            TokenKind::Row => "2DAMEMORY",
        }
    }
}

/// A concrete token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenRef {
    /// Token space
    pub kind: TokenKind,
    /// Id within the space
    pub id: u32,
}

impl TokenRef {
    /// `StrRef<id>`
    pub fn string_table(id: u32) -> Self {
        Self {
            kind: TokenKind::StringTable,
            id,
        }
    }

    /// `2DAMEMORY<id>`
    pub fn row(id: u32) -> Self {
        Self {
            kind: TokenKind::Row,
            id,
        }
    }

    /// Value expression referencing this token
    pub fn to_value(self) -> ValueExpr {
        match self.kind {
            TokenKind::StringTable => ValueExpr::StringTableToken(self.id),
            TokenKind::Row => ValueExpr::RowToken(self.id),
        }
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

/// One monotonically increasing id counter
///
/// The counter runs one past `u32::MAX` so an exhausted space is
/// distinguishable from one that still has `u32::MAX` to hand out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenNamespace {
    next: u64,
    reserved_max: Option<u32>,
    issued: u32,
}

impl TokenNamespace {
    /// Issue the next id, or `None` once every id has been taken
    pub fn allocate(&mut self) -> Option<u32> {
        let id = u32::try_from(self.next).ok()?;
        self.next += 1;
        self.issued = self.issued.saturating_add(1);
        Some(id)
    }

    /// Mark ids as taken so they are never issued.
    ///
    /// The floor only rises: reserving ids below `next` has no effect.
    pub fn reserve<I: IntoIterator<Item = u32>>(&mut self, ids: I) {
        if let Some(max) = ids.into_iter().max() {
            self.reserved_max = Some(self.reserved_max.map_or(max, |m| m.max(max)));
            self.next = self.next.max(u64::from(max) + 1);
        }
    }

    /// Id the next allocation returns, `None` when the space is exhausted
    pub fn next_id(&self) -> Option<u32> {
        u32::try_from(self.next).ok()
    }

    /// Highest id ever reserved
    pub fn reserved_max(&self) -> Option<u32> {
        self.reserved_max
    }

    /// Number of ids handed out by [`allocate`](Self::allocate)
    pub fn issued(&self) -> u32 {
        self.issued
    }
}

/// Both token spaces of one compilation session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAllocator {
    string_table: TokenNamespace,
    row: TokenNamespace,
}

impl TokenAllocator {
    /// Create an allocator with both spaces starting at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id in a space.
    ///
    /// Returns `None` when a reservation or earlier allocations used up the
    /// space; the caller then leaves the value untokenized.
    pub fn allocate(&mut self, kind: TokenKind) -> Option<TokenRef> {
        let Some(id) = self.namespace_mut(kind).allocate() else {
            log::warn!("No {} ids left to allocate", kind.prefix());
            return None;
        };
        log::trace!("Allocated {}{id}", kind.prefix());
        Some(TokenRef { kind, id })
    }

    /// Reserve externally assigned ids in a space
    pub fn reserve<I: IntoIterator<Item = u32>>(&mut self, kind: TokenKind, ids: I) {
        self.namespace_mut(kind).reserve(ids);
    }

    /// Counter of one space
    pub fn namespace(&self, kind: TokenKind) -> &TokenNamespace {
        match kind {
            TokenKind::StringTable => &self.string_table,
            TokenKind::Row => &self.row,
        }
    }

    fn namespace_mut(&mut self, kind: TokenKind) -> &mut TokenNamespace {
        match kind {
            TokenKind::StringTable => &mut self.string_table,
            TokenKind::Row => &mut self.row,
        }
    }
}
