use crate::error::BuildError;
use crate::index::{DocumentStats, IndexSegment, PostingsList, TermId};
use crate::tokenizer::Analyzer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_docs: u32,
    pub num_terms: u32,
    pub total_length: u64,
    pub analyzer: Analyzer,
    pub created_at: String,
}

/// File layout of a persisted index rooted at one directory.
///
/// The live segment sits in `segment/`; saves are staged next to it and
/// swapped in by rename.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn segment(&self) -> PathBuf { self.root.join("segment") }
    fn staging(&self) -> PathBuf { self.root.join("segment.staging") }
    fn retired(&self) -> PathBuf { self.root.join("segment.old") }
}

fn meta(dir: &Path) -> PathBuf { dir.join("meta.json") }
fn dictionary(dir: &Path) -> PathBuf { dir.join("dictionary.bin") }
fn postings(dir: &Path) -> PathBuf { dir.join("postings.bin") }
fn docs(dir: &Path) -> PathBuf { dir.join("docs.bin") }

/// Directory holding the current segment. A swap interrupted after the live
/// segment was retired leaves it complete in `segment.old/`.
fn current_dir(paths: &IndexPaths) -> Option<PathBuf> {
    [paths.segment(), paths.retired()].into_iter().find(|d| meta(d).is_file())
}

/// Whether a complete segment has been persisted under `paths`.
pub fn segment_exists(paths: &IndexPaths) -> bool {
    current_dir(paths).is_some()
}

/// Put a retired segment back in place when the live one is missing.
fn recover_interrupted_swap(paths: &IndexPaths) -> Result<(), BuildError> {
    let live = paths.segment();
    let retired = paths.retired();
    if meta(&live).is_file() || !meta(&retired).is_file() {
        return Ok(());
    }
    if live.exists() {
        fs::remove_dir_all(&live)?;
    }
    fs::rename(&retired, &live)?;
    tracing::warn!(path = %live.display(), "restored segment from interrupted swap");
    Ok(())
}

fn write_bin<T: Serialize>(path: &Path, value: &T) -> Result<(), BuildError> {
    let mut w = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn read_bin<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, BuildError> {
    let r = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(r)?)
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Persist `segment`, replacing whatever segment was saved before.
///
/// Everything is written to a staging directory first; the previous segment
/// is only retired once the new one is complete on disk.
pub fn save_segment(paths: &IndexPaths, segment: &IndexSegment) -> Result<(), BuildError> {
    create_dir_all(&paths.root)?;
    recover_interrupted_swap(paths)?;
    let staging = paths.staging();
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    create_dir_all(&staging)?;

    write_bin(&dictionary(&staging), &segment.dictionary)?;
    write_bin(&postings(&staging), &segment.postings)?;
    write_bin(&docs(&staging), &segment.docs)?;
    let meta_file = MetaFile {
        version: FORMAT_VERSION,
        num_docs: segment.document_count(),
        num_terms: segment.term_count() as u32,
        total_length: segment.total_length,
        analyzer: segment.analyzer,
        created_at: now_rfc3339(),
    };
    let mut f = File::create(meta(&staging))?;
    f.write_all(serde_json::to_string_pretty(&meta_file)?.as_bytes())?;
    f.sync_all()?;

    let live = paths.segment();
    let retired = paths.retired();
    if retired.exists() {
        fs::remove_dir_all(&retired)?;
    }
    if live.exists() {
        fs::rename(&live, &retired)?;
    }
    if let Err(e) = fs::rename(&staging, &live) {
        if retired.exists() {
            if let Err(restore) = fs::rename(&retired, &live) {
                tracing::error!(error = %restore, "could not restore previous segment");
            }
        }
        return Err(e.into());
    }
    if retired.exists() {
        fs::remove_dir_all(&retired)?;
    }
    tracing::info!(
        path = %live.display(),
        docs = meta_file.num_docs,
        terms = meta_file.num_terms,
        "segment saved"
    );
    Ok(())
}

fn not_found(paths: &IndexPaths) -> BuildError {
    BuildError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no segment under {}", paths.root.display()),
    ))
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, BuildError> {
    let dir = current_dir(paths).ok_or_else(|| not_found(paths))?;
    read_meta(&dir)
}

fn read_meta(dir: &Path) -> Result<MetaFile, BuildError> {
    let mut f = File::open(meta(dir))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

fn corrupt(msg: String) -> BuildError {
    BuildError::Io(io::Error::new(io::ErrorKind::InvalidData, msg))
}

/// Load the persisted segment in full.
pub fn load_segment(paths: &IndexPaths) -> Result<IndexSegment, BuildError> {
    let dir = current_dir(paths).ok_or_else(|| not_found(paths))?;
    let meta = read_meta(&dir)?;
    if meta.version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported segment version {}", meta.version)));
    }
    let dictionary: BTreeMap<String, TermId> = read_bin(&dictionary(&dir))?;
    let postings: Vec<PostingsList> = read_bin(&postings(&dir))?;
    let docs: Vec<DocumentStats> = read_bin(&docs(&dir))?;

    let dangling_term = dictionary.values().any(|&t| t as usize >= postings.len());
    if dictionary.len() != postings.len() || dangling_term {
        return Err(corrupt("dictionary does not match postings".into()));
    }
    if postings.iter().flatten().any(|p| p.doc_id as usize >= docs.len()) {
        return Err(corrupt("posting refers to unknown document".into()));
    }
    let segment = IndexSegment::from_parts(meta.analyzer, dictionary, postings, docs);
    if segment.document_count() != meta.num_docs || segment.total_length != meta.total_length {
        return Err(corrupt("document table does not match meta.json".into()));
    }
    tracing::info!(
        path = %dir.display(),
        docs = meta.num_docs,
        created_at = %meta.created_at,
        "segment loaded"
    );
    Ok(segment)
}
