//! Incremental patch script writer
//!
//! The writer accepts one [`Modification`] per call, links it against what
//! has been seen so far and keeps the whole session in memory. The script is
//! re-derived from that state on every flush, so the number of flushes never
//! changes the output.

use crate::codec::{DecodedResource, ResourceKind};
use crate::config::WriterConfig;
use crate::fs::FileSystem;
use crate::ini::PatchScriptSerializer;
use crate::install::{InstallFolderRegistry, normalize_destination};
use crate::linker::{PendingReference, PendingReferenceLinker, ResolveReport};
use crate::modification::{ModHandle, Modification, ModificationSet, Variant};
use crate::modifiers::RowTableModifier;
use crate::rewriter::{CellTokenRewriter, RewriteReport};
use crate::scanner::{LiteralKey, OriginId, ReferenceScanner};
use crate::sections::WrittenSections;
use crate::tokens::{TokenAllocator, TokenKind, TokenRef};
use crate::value::ValueExpr;
use crate::Result;
use kotor_tlk::{TalkTable, TlkEntry};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// Where a template's bytes come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// No template
    #[default]
    None,
    /// Bytes in memory
    Bytes(Vec<u8>),
    /// File read through the writer's filesystem
    Path(PathBuf),
}

/// One file submitted to the writer
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Accumulated edits of the file
    pub modification: Modification,
    /// Template copied into the output folder
    pub template: TemplateSource,
    /// Current bytes of the file, used to verify pending references
    pub verify: Option<Vec<u8>>,
    /// Origin the file was diffed from
    pub origin: OriginId,
}

impl WriteRequest {
    /// Request without template or verification bytes
    pub fn new(modification: Modification) -> Self {
        Self {
            modification,
            template: TemplateSource::None,
            verify: None,
            origin: OriginId::default(),
        }
    }

    /// Set the template
    pub fn template(mut self, template: TemplateSource) -> Self {
        self.template = template;
        self
    }

    /// Set the verification bytes
    pub fn verify(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.verify = Some(bytes.into());
        self
    }

    /// Set the origin
    pub fn origin(mut self, origin: impl Into<OriginId>) -> Self {
        self.origin = origin.into();
        self
    }
}

/// What happened to a submitted file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    /// First submission, now buffered
    Buffered,
    /// Already buffered, patched in place
    Patched,
    /// Already buffered, nothing new
    Unchanged,
    /// Not accepted
    Skipped,
}

/// Result of one [`IncrementalWriter::write`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// What happened
    pub status: WriteStatus,
    /// Handle of the buffered modification
    pub handle: Option<ModHandle>,
    /// Modifiers added to the buffered modification
    pub added: usize,
    /// Pending references resolved against this file
    pub links: ResolveReport,
    /// Pending references created from this file's modifiers
    pub generated: usize,
}

impl WriteOutcome {
    fn skipped() -> Self {
        Self {
            status: WriteStatus::Skipped,
            handle: None,
            added: 0,
            links: ResolveReport::default(),
            generated: 0,
        }
    }
}

/// Session totals reported by [`IncrementalWriter::finalize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeSummary {
    /// Buffered files per variant
    pub files: BTreeMap<Variant, usize>,
    /// Files listed in `[InstallList]`
    pub install_files: usize,
    /// Appended strings
    pub appends: usize,
    /// `StrRef` tokens issued by the writer
    pub string_tokens: u32,
    /// `2DAMEMORY` tokens issued by the writer and the final rewrite
    pub row_tokens: u32,
    /// Pending reference outcomes over the session
    pub links: ResolveReport,
    /// References never resolved
    pub unresolved: usize,
    /// Rewriter totals of the final flush
    pub rewrites: RewriteReport,
    /// Number of script flushes
    pub flushes: usize,
    /// Path of the script
    pub script: PathBuf,
}

/// Compiles a stream of per-file modifications into a patch script
#[derive(Debug)]
pub struct IncrementalWriter<F: FileSystem> {
    fs: F,
    config: WriterConfig,
    modifications: ModificationSet,
    tokens: TokenAllocator,
    scanner: ReferenceScanner,
    linker: PendingReferenceLinker,
    installs: InstallFolderRegistry,
    written: WrittenSections,
    origins: HashMap<ModHandle, OriginId>,
    verified: HashMap<ModHandle, DecodedResource>,
    templates: HashSet<ModHandle>,
    unflushed: usize,
    links: ResolveReport,
    rewrites: RewriteReport,
    rewritten_row_tokens: u32,
    flushes: usize,
}

impl<F: FileSystem> IncrementalWriter<F> {
    /// Create a writer with an empty session
    pub fn new(fs: F, config: WriterConfig) -> Self {
        Self::with_scanner(fs, config, ReferenceScanner::new())
    }

    /// Create a writer that links against a pre-built reference index
    pub fn with_scanner(fs: F, config: WriterConfig, scanner: ReferenceScanner) -> Self {
        Self {
            fs,
            config,
            modifications: ModificationSet::new(),
            tokens: TokenAllocator::new(),
            scanner,
            linker: PendingReferenceLinker::new(),
            installs: InstallFolderRegistry::new(),
            written: WrittenSections::new(),
            origins: HashMap::new(),
            verified: HashMap::new(),
            templates: HashSet::new(),
            unflushed: 0,
            links: ResolveReport::default(),
            rewrites: RewriteReport::default(),
            rewritten_row_tokens: 0,
            flushes: 0,
        }
    }

    /// Submit one file.
    ///
    /// Files are keyed by variant and case-insensitive filename. The first
    /// submission buffers the modification and writes its template; later
    /// submissions are merged into the buffered one by modifier target (see
    /// [`Modification::absorb`]).
    pub fn write(&mut self, request: WriteRequest) -> Result<WriteOutcome> {
        let WriteRequest {
            mut modification,
            template,
            verify,
            origin,
        } = request;
        let filename = modification.filename().to_string();
        let variant = modification.variant();

        match ResourceKind::from_filename(&filename) {
            Some(kind) if kind.variant() == variant => {}
            Some(kind) => {
                log::warn!(
                    "Skipping {filename}: a {variant} modification cannot edit a {} resource",
                    kind.variant()
                );
                return Ok(WriteOutcome::skipped());
            }
            None => {
                log::warn!("Skipping {filename}: unrecognized resource kind");
                return Ok(WriteOutcome::skipped());
            }
        }

        let fresh = verify.and_then(|bytes| {
            if variant == Variant::Script {
                return None;
            }
            DecodedResource::decode(&filename, &bytes)
                .map_err(|e| log::warn!("Cannot decode {filename} for verification: {e}"))
                .ok()
        });

        let (strings, rows) = modification.named_tokens();
        self.tokens.reserve(TokenKind::StringTable, strings);
        self.tokens.reserve(TokenKind::Row, rows);

        let (handle, status, added, merged) = match self.modifications.find(variant, &filename) {
            Some(handle) => {
                self.written.unmark(variant, &filename);
                let Some(existing) = self.modifications.get_mut(handle) else {
                    return Ok(WriteOutcome::skipped());
                };
                if normalize_destination(&existing.header().destination)
                    != normalize_destination(&modification.header().destination)
                {
                    log::warn!(
                        "{filename} resubmitted for {}, keeping {}",
                        modification.header().destination,
                        existing.header().destination
                    );
                }
                let before = existing.len();
                let absorbed = existing.absorb(modification);
                if let Some(fresh) = fresh {
                    self.verified.insert(handle, fresh);
                }
                self.origins.insert(handle, origin.clone());
                (
                    handle,
                    WriteStatus::Patched,
                    before..before + absorbed.appended,
                    absorbed.merged,
                )
            }
            None => {
                let added = 0..modification.len();
                let header = modification.header_mut();
                header.destination = normalize_destination(&header.destination);
                let handle = self.modifications.push(modification);
                if let Some(fresh) = fresh {
                    self.verified.insert(handle, fresh);
                }
                self.origins.insert(handle, origin.clone());
                if let Some(m) = self.modifications.get(handle)
                    && m.header().install
                {
                    let (destination, name) = (m.header().destination.clone(), m.filename().to_string());
                    self.installs.add(&destination, &name);
                }
                (handle, WriteStatus::Buffered, added, 0)
            }
        };

        let template_written = self.write_template(handle, &filename, template);
        let generated = self.generate_references(handle, added.clone(), &origin);
        let links = self.resolve_in_place(handle, &filename);
        self.written.mark(variant, &filename);

        let status = match status {
            WriteStatus::Patched
                if added.is_empty() && merged == 0 && links.resolved == 0 && !template_written =>
            {
                WriteStatus::Unchanged
            }
            status => status,
        };
        log::debug!(
            "{filename}: {status:?}, {} new modifier(s), {merged} merged value(s)",
            added.len()
        );

        self.unflushed += 1;
        if self.unflushed >= self.config.flush_every() {
            self.flush()?;
        }

        Ok(WriteOutcome {
            status,
            handle: Some(handle),
            added: added.len(),
            links,
            generated,
        })
    }

    /// Queue a pending reference.
    ///
    /// When the target file is already buffered the reference is resolved
    /// right away against the resource cached for it.
    pub fn add_pending(&mut self, reference: PendingReference) -> ResolveReport {
        let target = reference.target.clone();
        if !self.linker.add(reference) {
            return ResolveReport::default();
        }
        let Some(kind) = ResourceKind::from_filename(&target) else {
            return ResolveReport::default();
        };
        match self.modifications.find(kind.variant(), &target) {
            Some(handle) => self.resolve_in_place(handle, &target),
            None => ResolveReport::default(),
        }
    }

    /// Copy a file into the template folder and list it under `[InstallList]`
    pub fn add_install_file(&mut self, destination: &str, filename: &str, bytes: &[u8]) -> Result<bool> {
        self.fs.create_dir_all(self.config.dir())?;
        self.fs.write(&self.config.template_path(filename), bytes)?;
        Ok(self.installs.add(destination, filename))
    }

    /// Rewrite the script and the append table from the whole session state.
    ///
    /// The token rewrite runs on a copy of the modifications and of the
    /// allocator. Buffered modifications keep their submitted literals, and
    /// tokens named by files written after this flush stay free.
    pub fn flush(&mut self) -> Result<()> {
        self.fs.create_dir_all(self.config.dir())?;

        let mut modifications = self.modifications.clone();
        let mut tokens = self.tokens.clone();
        self.rewrites = CellTokenRewriter::rewrite(&mut modifications, &mut tokens);
        self.rewritten_row_tokens = tokens.namespace(TokenKind::Row).issued();
        let text = PatchScriptSerializer::new(self.config.patch_settings())
            .serialize(&modifications, &self.installs);
        self.fs.write(&self.config.script_path(), text.as_bytes())?;

        let mut table = TalkTable::new(0);
        for append in self.modifications.appends() {
            let entry = TlkEntry::new(append.text.as_str());
            table.push(if append.sound.is_empty() {
                entry
            } else {
                entry.with_sound(append.sound.as_str())
            });
        }
        if !table.is_empty() {
            self.fs.write(&self.config.append_table_path(), &table.write()?)?;
        }

        self.unflushed = 0;
        self.flushes += 1;
        log::debug!(
            "Flushed {} file(s) to {}",
            self.modifications.total(),
            self.config.script_path().display()
        );
        Ok(())
    }

    /// Flush once more and report the session totals
    pub fn finalize(&mut self) -> Result<FinalizeSummary> {
        self.flush()?;
        let summary = FinalizeSummary {
            files: Variant::ALL
                .iter()
                .map(|v| (*v, self.modifications.count(*v)))
                .collect(),
            install_files: self.installs.file_count(),
            appends: self.modifications.appends().count(),
            string_tokens: self.tokens.namespace(TokenKind::StringTable).issued(),
            row_tokens: self.rewritten_row_tokens,
            links: self.links,
            unresolved: self.linker.len(),
            rewrites: self.rewrites,
            flushes: self.flushes,
            script: self.config.script_path(),
        };
        if summary.unresolved > 0 {
            log::info!("{} reference(s) were never resolved", summary.unresolved);
        }
        Ok(summary)
    }

    fn write_template(&mut self, handle: ModHandle, filename: &str, template: TemplateSource) -> bool {
        if self.templates.contains(&handle) || handle.variant == Variant::StringTable {
            return false;
        }
        let bytes = match template {
            TemplateSource::None => return false,
            TemplateSource::Bytes(bytes) => bytes,
            TemplateSource::Path(path) => match self.fs.read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Cannot read template {} for {filename}: {e}", path.display());
                    return false;
                }
            },
        };
        let written = self
            .fs
            .create_dir_all(self.config.dir())
            .and_then(|()| self.fs.write(&self.config.template_path(filename), &bytes));
        match written {
            Ok(()) => {
                self.templates.insert(handle);
                true
            }
            Err(e) => {
                log::warn!("Cannot write template {filename}: {e}");
                false
            }
        }
    }

    /// Assign tokens to new modifiers and queue the references they imply
    fn generate_references(&mut self, handle: ModHandle, added: std::ops::Range<usize>, origin: &OriginId) -> usize {
        let mut references = Vec::new();
        let Some(modification) = self.modifications.get_mut(handle) else {
            return 0;
        };
        let filename = modification.filename().to_string();

        match modification {
            Modification::StringTable(m) => {
                for append in m.modifiers.get_mut(added).into_iter().flatten() {
                    let token = match append.token {
                        Some(token) => token,
                        None => {
                            let Some(token) = self.tokens.allocate(TokenKind::StringTable) else {
                                continue;
                            };
                            append.token = Some(token.id);
                            token.id
                        }
                    };
                    let Some(source) = append.source_strref else {
                        continue;
                    };
                    let key = LiteralKey::StrRef(source);
                    for site in self.scanner.query(&key).iter().filter(|s| s.origin == *origin) {
                        references.push(PendingReference::from_site(
                            site,
                            &filename,
                            key.literal(),
                            TokenRef::string_table(token),
                        ));
                    }
                }
            }
            Modification::RowTable(m) => {
                for modifier in m.modifiers.get_mut(added).into_iter().flatten() {
                    let (source, stores) = match modifier {
                        RowTableModifier::AddRow(add) => (add.source_row, &mut add.stores),
                        RowTableModifier::CopyRow(copy) => (copy.source_row, &mut copy.stores),
                        _ => continue,
                    };
                    let Some(source) = source else {
                        continue;
                    };
                    let key = LiteralKey::row(&filename, source);
                    let sites: Vec<_> = self
                        .scanner
                        .query(&key)
                        .iter()
                        .filter(|s| s.origin == *origin)
                        .collect();
                    if sites.is_empty() {
                        continue;
                    }
                    let token = match stores.iter().find(|(_, v)| **v == ValueExpr::RowIndex) {
                        Some((token, _)) => *token,
                        None => {
                            let Some(token) = self.tokens.allocate(TokenKind::Row) else {
                                continue;
                            };
                            stores.insert(token.id, ValueExpr::RowIndex);
                            token.id
                        }
                    };
                    for site in sites {
                        references.push(PendingReference::from_site(
                            site,
                            &filename,
                            key.literal(),
                            TokenRef::row(token),
                        ));
                    }
                }
            }
            _ => {}
        }

        let count = references.len();
        for reference in references {
            self.add_pending(reference);
        }
        count
    }

    /// Resolve references targeting a buffered file against its cached resource
    fn resolve_in_place(&mut self, handle: ModHandle, filename: &str) -> ResolveReport {
        if !self.linker.has_pending(filename) {
            return ResolveReport::default();
        }
        let variant = handle.variant;
        let was_marked = self.written.unmark(variant, filename);
        let origin = self.origins.get(&handle).cloned().unwrap_or_default();
        let report = match self.modifications.get_mut(handle) {
            Some(modification) => {
                self.linker
                    .resolve(filename, modification, self.verified.get(&handle), &origin)
            }
            None => ResolveReport::default(),
        };
        if was_marked {
            self.written.mark(variant, filename);
        }
        self.links += report;
        report
    }

    /// Buffered modifications
    pub fn modifications(&self) -> &ModificationSet {
        &self.modifications
    }

    /// Token allocator
    pub fn tokens(&self) -> &TokenAllocator {
        &self.tokens
    }

    /// Reference index
    pub fn scanner(&self) -> &ReferenceScanner {
        &self.scanner
    }

    /// Reference index, for scanning more resources mid-session
    pub fn scanner_mut(&mut self) -> &mut ReferenceScanner {
        &mut self.scanner
    }

    /// Pending references
    pub fn linker(&self) -> &PendingReferenceLinker {
        &self.linker
    }

    /// Install folders
    pub fn installs(&self) -> &InstallFolderRegistry {
        &self.installs
    }

    /// Files with emitted sections
    pub fn written(&self) -> &WrittenSections {
        &self.written
    }

    /// Configuration
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Output filesystem
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Consume the writer and return its filesystem
    pub fn into_fs(self) -> F {
        self.fs
    }
}
