//! Sound set slot edits

use crate::value::ValueExpr;
use kotor_ssf::SoundSlot;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

/// `<Slot name>=value` edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundEdit {
    /// Slot, written by its script name (`Battlecry 1`)
    #[serde(serialize_with = "slot_name", deserialize_with = "parse_slot")]
    pub slot: SoundSlot,
    /// New strref
    pub value: ValueExpr,
}

impl SoundEdit {
    /// Edit of one slot
    pub fn new(slot: SoundSlot, value: ValueExpr) -> Self {
        Self { slot, value }
    }
}

pub(crate) fn slot_name<S: Serializer>(slot: &SoundSlot, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(slot.script_name())
}

pub(crate) fn parse_slot<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SoundSlot, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(D::Error::custom)
}
