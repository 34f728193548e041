use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::index::DocId;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Document {
    /// As written in the document id map.
    name: String,
    /// Where the raw text is read from.
    path: PathBuf,
}

/// Document id -> name and location of the document's raw text.
#[derive(Debug, Clone, Default)]
pub struct DocumentTable {
    docs: HashMap<DocId, Document>,
}

impl DocumentTable {
    pub fn new() -> Self { Self::default() }

    /// Register `name`, read from `base.join(name)`.
    pub fn insert_relative(&mut self, doc_id: DocId, name: &str, base: &Path) {
        self.docs.insert(doc_id, Document { name: name.to_string(), path: base.join(name) });
    }

    /// Register a document whose name is its path.
    pub fn insert(&mut self, doc_id: DocId, path: impl Into<PathBuf>) {
        let path = path.into();
        let name = path.to_string_lossy().into_owned();
        self.docs.insert(doc_id, Document { name, path });
    }

    pub fn path(&self, doc_id: DocId) -> Option<&Path> {
        self.docs.get(&doc_id).map(|d| d.path.as_path())
    }

    /// Display name used in rendered results.
    pub fn name(&self, doc_id: DocId) -> Option<String> {
        self.docs.get(&doc_id).map(|d| d.name.clone())
    }

    /// Every registered document, ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Path)> {
        let mut ids: Vec<DocId> = self.docs.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(move |id| (id, self.docs[&id].path.as_path()))
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

impl<P: Into<PathBuf>> FromIterator<(DocId, P)> for DocumentTable {
    fn from_iter<I: IntoIterator<Item = (DocId, P)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (id, path) in iter {
            table.insert(id, path);
        }
        table
    }
}
