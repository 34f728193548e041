use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cache::NormalizationCache;
use crate::documents::DocumentTable;
use crate::index::{BuiltIndex, DocId, IndexBuilder, RawRecord};
use crate::query::{EngineConfig, SearchEngine};
use crate::tokenizer::{digit_runs, Stoplist};

/// File layout of a data directory.
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn inverted_index(&self) -> PathBuf { self.root.join("inverted_index.txt") }
    pub fn stoplist(&self) -> PathBuf { self.root.join("generated_stoplist.txt") }
    pub fn stemming_dictionary(&self) -> PathBuf { self.root.join("stemming_dictionary.txt") }
    pub fn document_id_map(&self) -> PathBuf { self.root.join("document_id_map.txt") }
}

/// Lines of `path` as raw bytes, without their `\n` or `\r\n` terminator.
fn read_raw_lines(path: &Path) -> Result<Vec<Vec<u8>>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(f);
    let mut lines = Vec::new();
    loop {
        let mut buf = Vec::new();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        if n == 0 {
            return Ok(lines);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        lines.push(buf);
    }
}

/// Decoded lines with their 1-based numbers. A line that is not UTF-8 is
/// logged and dropped; the rest of the file is still read.
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    Ok(read_raw_lines(path)?
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match String::from_utf8(raw) {
            Ok(line) => Some((i + 1, line)),
            Err(_) => {
                tracing::warn!(path = %path.display(), line = i + 1, "skipping line that is not valid UTF-8");
                None
            }
        })
        .collect())
}

/// One term per line. A missing file yields an empty stoplist.
pub fn load_stoplist(path: &Path) -> Result<Stoplist> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no stoplist file, every query word is significant");
        return Ok(Stoplist::new());
    }
    let stoplist = Stoplist::from_terms(read_lines(path)?.into_iter().map(|(_, line)| line));
    tracing::info!(terms = stoplist.len(), "loaded stoplist");
    Ok(stoplist)
}

/// `rawTerm,stem` per line. A missing file yields an empty cache; lines
/// without a comma are skipped.
pub fn load_stemming_dictionary(path: &Path) -> Result<NormalizationCache> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no stemming dictionary yet, starting empty");
        return Ok(NormalizationCache::new());
    }
    let mut pairs = Vec::new();
    for (line_no, line) in read_lines(path)? {
        match line.split_once(',') {
            Some((raw, stem)) => pairs.push((raw.to_string(), stem.to_string())),
            None if line.trim().is_empty() => {}
            None => tracing::warn!(line = line_no, "skipping stemming dictionary line without a comma"),
        }
    }
    let cache = NormalizationCache::from_pairs(pairs);
    tracing::info!(entries = cache.len(), "loaded stemming dictionary");
    Ok(cache)
}

/// Overwrite `path` with every cached pair, sorted by raw term.
pub fn save_stemming_dictionary(path: &Path, cache: &NormalizationCache) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(f);
    let pairs = cache.snapshot();
    for (raw, stem) in &pairs {
        writeln!(out, "{raw},{stem}")?;
    }
    out.flush()?;
    tracing::info!(entries = pairs.len(), path = %path.display(), "saved stemming dictionary");
    Ok(())
}

/// Header line, then `path,docId` per line (split on the last comma, so
/// paths may contain commas). Relative paths are resolved against `base`.
pub fn load_document_table(path: &Path, base: &Path) -> Result<DocumentTable> {
    let mut table = DocumentTable::new();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "no document id map, snippets will be unavailable");
        return Ok(table);
    }
    for (line_no, line) in read_lines(path)? {
        if line_no == 1 || line.trim().is_empty() {
            continue;
        }
        let parsed = line
            .rsplit_once(',')
            .and_then(|(name, id)| id.trim().parse::<DocId>().ok().map(|id| (name, id)));
        match parsed {
            Some((name, id)) => table.insert_relative(id, name, base),
            None => tracing::warn!(line = line_no, content = %line, "skipping invalid document id map line"),
        }
    }
    tracing::info!(documents = table.len(), "loaded document id map");
    Ok(table)
}

/// Read `term,docId,positions` lines into an index. A first line whose
/// document id field is not numeric and whose positions field holds no digits
/// is taken as a header. Undecodable lines are skipped and counted.
pub fn load_index(path: &Path, stemming: bool, cache: &NormalizationCache) -> Result<BuiltIndex> {
    let mut builder = IndexBuilder::new(stemming, cache);
    for (i, raw) in read_raw_lines(path)?.iter().enumerate() {
        if raw.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        if i == 0 && is_header(raw) {
            tracing::debug!(path = %path.display(), "skipping index header line");
            continue;
        }
        // Rejected records are logged and counted in the build report.
        builder.add_bytes(i + 1, raw).ok();
    }
    Ok(builder.finish())
}

fn is_header(raw: &[u8]) -> bool {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|line| RawRecord::from_line(line).ok())
        .map(|record| {
            record.doc_id.trim().parse::<DocId>().is_err()
                && digit_runs(&record.positions).map_or(false, |p| p.is_empty())
        })
        .unwrap_or(false)
}

/// Load every resource in `paths` and build a ready engine.
pub fn load_engine(paths: &DataPaths, config: EngineConfig) -> Result<SearchEngine> {
    let stoplist = load_stoplist(&paths.stoplist())?;
    let cache = load_stemming_dictionary(&paths.stemming_dictionary())?;
    let documents = load_document_table(&paths.document_id_map(), &paths.root)?;
    let built = load_index(&paths.inverted_index(), config.stemming, &cache)?;
    Ok(SearchEngine::new(built, stoplist, cache, documents, config))
}

/// Non-empty trimmed lines of a query file.
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    Ok(read_lines(path)?
        .into_iter()
        .map(|(_, l)| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
