//! Bridge to the resource codec crates

use crate::modification::Variant;
use crate::modifiers::gff::split_strref_suffix;
use crate::scanner::ReferenceLocation;
use crate::{Error, Result};
use kotor_2da::TwoDA;
use kotor_gff::{FieldPath, Gff, GffValue};
use kotor_ssf::SoundSet;
use kotor_tlk::TalkTable;
use std::path::Path;

/// Extensions of GFF-based resources
pub const GFF_EXTENSIONS: &[&str] = &[
    "are", "bic", "btc", "btd", "bte", "bti", "btp", "btm", "btt", "dlg", "fac", "git", "gff",
    "gui", "ifo", "itp", "jrl", "pth", "res", "utc", "utd", "ute", "uti", "utm", "utp", "uts",
    "utt", "utw",
];

/// Resource kind as determined by the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `.2da`
    TwoDA,
    /// Any GFF-based extension
    Gff,
    /// `.tlk`
    Tlk,
    /// `.ssf`
    Ssf,
    /// `.nss`
    Nss,
}

impl ResourceKind {
    /// Kind of a filename, by extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "2da" => Some(ResourceKind::TwoDA),
            "tlk" => Some(ResourceKind::Tlk),
            "ssf" => Some(ResourceKind::Ssf),
            "nss" => Some(ResourceKind::Nss),
            other if GFF_EXTENSIONS.contains(&other) => Some(ResourceKind::Gff),
            _ => None,
        }
    }

    /// Modification variant that edits this kind
    pub fn variant(self) -> Variant {
        match self {
            ResourceKind::TwoDA => Variant::RowTable,
            ResourceKind::Gff => Variant::FieldTree,
            ResourceKind::Tlk => Variant::StringTable,
            ResourceKind::Ssf => Variant::SoundTable,
            ResourceKind::Nss => Variant::Script,
        }
    }
}

/// Decode/encode contract of one resource format
pub trait ResourceCodec {
    /// Decoded tree
    type Tree;

    /// Decode raw bytes
    fn decode(bytes: &[u8]) -> Result<Self::Tree>;

    /// Encode a tree
    fn encode(tree: &Self::Tree) -> Result<Vec<u8>>;
}

/// Binary `2DA V2.b`
#[derive(Debug, Clone, Copy)]
pub struct TwoDACodec;

impl ResourceCodec for TwoDACodec {
    type Tree = TwoDA;

    fn decode(bytes: &[u8]) -> Result<TwoDA> {
        Ok(kotor_2da::read_2da(bytes)?)
    }

    fn encode(tree: &TwoDA) -> Result<Vec<u8>> {
        Ok(kotor_2da::write_2da(tree)?)
    }
}

/// `GFF V3.2`
#[derive(Debug, Clone, Copy)]
pub struct GffCodec;

impl ResourceCodec for GffCodec {
    type Tree = Gff;

    fn decode(bytes: &[u8]) -> Result<Gff> {
        Ok(kotor_gff::read_gff(bytes)?)
    }

    fn encode(tree: &Gff) -> Result<Vec<u8>> {
        Ok(kotor_gff::write_gff(tree)?)
    }
}

/// `TLK V3.0`
#[derive(Debug, Clone, Copy)]
pub struct TlkCodec;

impl ResourceCodec for TlkCodec {
    type Tree = TalkTable;

    fn decode(bytes: &[u8]) -> Result<TalkTable> {
        Ok(TalkTable::read(bytes)?)
    }

    fn encode(tree: &TalkTable) -> Result<Vec<u8>> {
        Ok(tree.write()?)
    }
}

/// `SSF V1.1`
#[derive(Debug, Clone, Copy)]
pub struct SsfCodec;

impl ResourceCodec for SsfCodec {
    type Tree = SoundSet;

    fn decode(bytes: &[u8]) -> Result<SoundSet> {
        Ok(SoundSet::read(bytes)?)
    }

    fn encode(tree: &SoundSet) -> Result<Vec<u8>> {
        Ok(tree.write()?)
    }
}

/// A decoded resource of any supported kind
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedResource {
    /// 2DA table
    TwoDA(TwoDA),
    /// GFF document
    Gff(Gff),
    /// Talk table
    Tlk(TalkTable),
    /// Sound set
    Ssf(SoundSet),
}

impl DecodedResource {
    /// Decode bytes of a resource named `filename`
    pub fn decode(filename: &str, bytes: &[u8]) -> Result<Self> {
        let kind = ResourceKind::from_filename(filename).ok_or_else(|| Error::unsupported(filename))?;
        Ok(match kind {
            ResourceKind::TwoDA => DecodedResource::TwoDA(TwoDACodec::decode(bytes)?),
            ResourceKind::Gff => DecodedResource::Gff(GffCodec::decode(bytes)?),
            ResourceKind::Tlk => DecodedResource::Tlk(TlkCodec::decode(bytes)?),
            ResourceKind::Ssf => DecodedResource::Ssf(SsfCodec::decode(bytes)?),
            ResourceKind::Nss => return Err(Error::NoCodec(filename.to_string())),
        })
    }

    /// Encode back to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            DecodedResource::TwoDA(tree) => TwoDACodec::encode(tree),
            DecodedResource::Gff(tree) => GffCodec::encode(tree),
            DecodedResource::Tlk(tree) => TlkCodec::encode(tree),
            DecodedResource::Ssf(tree) => SsfCodec::encode(tree),
        }
    }

    /// Kind of the resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            DecodedResource::TwoDA(_) => ResourceKind::TwoDA,
            DecodedResource::Gff(_) => ResourceKind::Gff,
            DecodedResource::Tlk(_) => ResourceKind::Tlk,
            DecodedResource::Ssf(_) => ResourceKind::Ssf,
        }
    }

    /// Literal found at a location, if the location exists in this resource
    pub fn literal_at(&self, location: &ReferenceLocation) -> Option<String> {
        match (self, location) {
            (DecodedResource::TwoDA(table), ReferenceLocation::Cell { row, column, .. }) => {
                table.cell(*row, column).map(str::to_string)
            }
            (DecodedResource::Ssf(set), ReferenceLocation::SoundSlot(slot)) => {
                set.get(*slot).map(|strref| strref.to_string())
            }
            (DecodedResource::Gff(gff), ReferenceLocation::Field { path }) => {
                let (base, strref) = split_strref_suffix(path);
                let value = gff.root.resolve(&FieldPath::parse(base))?;
                match (value, strref) {
                    (GffValue::ExoLocString(loc), true) => loc.string_ref.map(|s| s.to_string()),
                    (_, true) => None,
                    (value, false) => value.literal(),
                }
            }
            _ => None,
        }
    }
}
