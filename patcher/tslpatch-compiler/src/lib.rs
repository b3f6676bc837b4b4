//! # tslpatch_compiler - incremental TSLPatcher script compiler
//!
//! Turns per-file "before vs. after" edits of KotOR resources into a
//! `changes.ini` patch script plus the template files it needs, so that an
//! apply-time patcher can reproduce the edits on any compatible install.
//!
//! Values produced by one edit, such as an appended talk table string or an
//! inserted 2DA row, are bound to `StrRef#`/`2DAMEMORY#` tokens. Other files
//! that reference the old value are relinked to the token once they are
//! written, after checking that the old value is still where it was found.
//!
//! ```
//! use tslpatch_compiler::{
//!     IncrementalWriter, MemoryFileSystem, Modification, StringAppend, WriteRequest,
//!     WriterConfig,
//! };
//!
//! let mut tlk = Modification::string_table("dialog.tlk");
//! if let Modification::StringTable(m) = &mut tlk {
//!     m.modifiers.push(StringAppend::new("Hello there."));
//! }
//!
//! let mut writer = IncrementalWriter::new(MemoryFileSystem::new(), WriterConfig::new());
//! writer.write(WriteRequest::new(tlk)).unwrap();
//! let summary = writer.finalize().unwrap();
//! assert_eq!(summary.string_tokens, 1);
//!
//! let script = writer.fs().text("tslpatchdata/changes.ini").unwrap();
//! assert!(script.contains("[TLKList]\nStrRef0=0\n"));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod ini;
pub mod install;
pub mod linker;
pub mod modification;
pub mod modifiers;
pub mod registry;
pub mod rewriter;
pub mod scanner;
pub mod sections;
pub mod tokens;
pub mod value;
pub mod writer;

pub use codec::{DecodedResource, ResourceCodec, ResourceKind};
pub use config::{PatchSettings, WriterConfig};
pub use error::{Error, Result};
pub use fs::{DiskFileSystem, FileSystem, MemoryFileSystem};
pub use ini::{IniDocument, PatchScriptSerializer};
pub use install::{InstallFolderRegistry, normalize_destination};
pub use linker::{PendingReference, PendingReferenceLinker, ResolveReport};
pub use modification::{Absorbed, FileHeader, ModHandle, Modification, ModificationSet, Variant};
pub use modifiers::{
    AddColumn, AddRow, ChangeRow, CopyRow, FieldEdit, FieldInsert, FieldTreeModifier, ListInsert,
    NestedInsert, RowTableModifier, RowTarget, SoundEdit, StringAppend,
};
pub use rewriter::{CellTokenRewriter, RewriteReport};
pub use scanner::{LiteralKey, OriginId, ReferenceLocation, ReferenceScanner, ReferenceSite};
pub use sections::WrittenSections;
pub use tokens::{TokenAllocator, TokenKind, TokenRef};
pub use value::ValueExpr;
pub use writer::{FinalizeSummary, IncrementalWriter, TemplateSource, WriteOutcome, WriteRequest, WriteStatus};
