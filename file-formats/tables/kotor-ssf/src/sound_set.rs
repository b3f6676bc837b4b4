//! Sound set model and `SSF V1.1` codec

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Signature and version at the start of every sound set
pub const SSF_MAGIC: &[u8; 8] = b"SSF V1.1";

/// Number of named sound slots
pub const SLOT_COUNT: usize = 28;

/// Reserved trailing entries written after the named slots
const RESERVED_ENTRIES: usize = 12;

/// Header size; the sound table follows directly
const HEADER_SIZE: u32 = 12;

/// Strref value meaning "no sound"
pub const NO_STRREF: u32 = 0xFFFF_FFFF;

/// The 28 named sound slots, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoundSlot {
    /// Battle cry variation 1
    BattleCry1,
    /// Battle cry variation 2
    BattleCry2,
    /// Battle cry variation 3
    BattleCry3,
    /// Battle cry variation 4
    BattleCry4,
    /// Battle cry variation 5
    BattleCry5,
    /// Battle cry variation 6
    BattleCry6,
    /// Selected variation 1
    Select1,
    /// Selected variation 2
    Select2,
    /// Selected variation 3
    Select3,
    /// Attack grunt variation 1
    AttackGrunt1,
    /// Attack grunt variation 2
    AttackGrunt2,
    /// Attack grunt variation 3
    AttackGrunt3,
    /// Pain grunt variation 1
    PainGrunt1,
    /// Pain grunt variation 2
    PainGrunt2,
    /// Low health
    LowHealth,
    /// Death
    Dead,
    /// Critical hit
    CriticalHit,
    /// Target immune
    TargetImmune,
    /// Place mine
    LayMine,
    /// Disarm mine
    DisarmMine,
    /// Stealth activated
    BeginStealth,
    /// Search activated
    BeginSearch,
    /// Lock picking started
    BeginUnlock,
    /// Lock picking failed
    UnlockFailed,
    /// Lock picking succeeded
    UnlockSuccess,
    /// Left the party
    SeparatedFromParty,
    /// Rejoined the party
    RejoinedParty,
    /// Poisoned
    Poisoned,
}

impl SoundSlot {
    /// Every slot in file order
    pub const ALL: [SoundSlot; SLOT_COUNT] = [
        SoundSlot::BattleCry1,
        SoundSlot::BattleCry2,
        SoundSlot::BattleCry3,
        SoundSlot::BattleCry4,
        SoundSlot::BattleCry5,
        SoundSlot::BattleCry6,
        SoundSlot::Select1,
        SoundSlot::Select2,
        SoundSlot::Select3,
        SoundSlot::AttackGrunt1,
        SoundSlot::AttackGrunt2,
        SoundSlot::AttackGrunt3,
        SoundSlot::PainGrunt1,
        SoundSlot::PainGrunt2,
        SoundSlot::LowHealth,
        SoundSlot::Dead,
        SoundSlot::CriticalHit,
        SoundSlot::TargetImmune,
        SoundSlot::LayMine,
        SoundSlot::DisarmMine,
        SoundSlot::BeginStealth,
        SoundSlot::BeginSearch,
        SoundSlot::BeginUnlock,
        SoundSlot::UnlockFailed,
        SoundSlot::UnlockSuccess,
        SoundSlot::SeparatedFromParty,
        SoundSlot::RejoinedParty,
        SoundSlot::Poisoned,
    ];

    /// Position of the slot in the sound table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot at a table position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Name used by patch scripts (`Battlecry 1`, `Low health`, ...)
    pub fn script_name(self) -> &'static str {
        match self {
            SoundSlot::BattleCry1 => "Battlecry 1",
            SoundSlot::BattleCry2 => "Battlecry 2",
            SoundSlot::BattleCry3 => "Battlecry 3",
            SoundSlot::BattleCry4 => "Battlecry 4",
            SoundSlot::BattleCry5 => "Battlecry 5",
            SoundSlot::BattleCry6 => "Battlecry 6",
            SoundSlot::Select1 => "Selected 1",
            SoundSlot::Select2 => "Selected 2",
            SoundSlot::Select3 => "Selected 3",
            SoundSlot::AttackGrunt1 => "Attack 1",
            SoundSlot::AttackGrunt2 => "Attack 2",
            SoundSlot::AttackGrunt3 => "Attack 3",
            SoundSlot::PainGrunt1 => "Pain 1",
            SoundSlot::PainGrunt2 => "Pain 2",
            SoundSlot::LowHealth => "Low health",
            SoundSlot::Dead => "Death",
            SoundSlot::CriticalHit => "Critical hit",
            SoundSlot::TargetImmune => "Target immune",
            SoundSlot::LayMine => "Place mine",
            SoundSlot::DisarmMine => "Disarm mine",
            SoundSlot::BeginStealth => "Stealth on",
            SoundSlot::BeginSearch => "Search",
            SoundSlot::BeginUnlock => "Pick lock start",
            SoundSlot::UnlockFailed => "Pick lock fail",
            SoundSlot::UnlockSuccess => "Pick lock done",
            SoundSlot::SeparatedFromParty => "Leave party",
            SoundSlot::RejoinedParty => "Rejoin party",
            SoundSlot::Poisoned => "Poisoned",
        }
    }
}

impl fmt::Display for SoundSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

impl FromStr for SoundSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        SoundSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.script_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownSlot(s.to_string()))
    }
}

/// A creature sound set: one optional talk-table strref per slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundSet {
    sounds: [Option<u32>; SLOT_COUNT],
}

impl Default for SoundSet {
    fn default() -> Self {
        Self {
            sounds: [None; SLOT_COUNT],
        }
    }
}

impl SoundSet {
    /// Create a sound set with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Strref assigned to a slot
    pub fn get(&self, slot: SoundSlot) -> Option<u32> {
        self.sounds[slot.index()]
    }

    /// Assign (or clear) a slot
    pub fn set(&mut self, slot: SoundSlot, strref: Option<u32>) {
        self.sounds[slot.index()] = strref;
    }

    /// Iterate slots that carry a strref
    pub fn assigned(&self) -> impl Iterator<Item = (SoundSlot, u32)> + '_ {
        SoundSlot::ALL
            .iter()
            .filter_map(|slot| self.get(*slot).map(|strref| (*slot, strref)))
    }

    /// Decode a `SSF V1.1` file
    pub fn read(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE as usize || &data[..8] != SSF_MAGIC {
            let found = String::from_utf8_lossy(&data[..data.len().min(8)]).into_owned();
            return Err(Error::InvalidHeader(format!(
                "expected 'SSF V1.1', found '{found}'"
            )));
        }

        let mut cursor = Cursor::new(data);
        cursor.set_position(8);
        let offset = cursor.read_u32::<LittleEndian>()?;
        if offset as usize > data.len() {
            return Err(Error::InvalidOffset(offset));
        }
        cursor.set_position(u64::from(offset));

        let mut set = SoundSet::new();
        for slot in SoundSlot::ALL {
            let raw = cursor.read_u32::<LittleEndian>()?;
            if raw != NO_STRREF {
                set.set(slot, Some(raw));
            }
        }
        Ok(set)
    }

    /// Encode as `SSF V1.1`
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_SIZE as usize + 4 * (SLOT_COUNT + RESERVED_ENTRIES));
        out.extend_from_slice(SSF_MAGIC);
        out.write_u32::<LittleEndian>(HEADER_SIZE)?;
        for strref in &self.sounds {
            out.write_u32::<LittleEndian>(strref.unwrap_or(NO_STRREF))?;
        }
        for _ in 0..RESERVED_ENTRIES {
            out.write_u32::<LittleEndian>(NO_STRREF)?;
        }
        Ok(out)
    }
}
