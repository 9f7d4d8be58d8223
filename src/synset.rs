//! Synset lookup used to turn free-text labels into synset identifiers.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Maps a free-text label, with a parent/hypernym hint, to a synset id.
pub trait SynsetLookup {
    fn synset_offset(&self, term: &str, hint: &str) -> Result<String>;
}

/// Fetch the lookup service, failing when none was configured.
pub fn require_lookup(lookup: Option<&dyn SynsetLookup>) -> Result<&dyn SynsetLookup> {
    lookup.ok_or(ConvertError::SynsetUnavailable)
}

/// Synset lookup backed by a tab-separated table.
///
/// Each non-empty, non-`#` line is either `term<TAB>synset` or
/// `term<TAB>hint<TAB>synset`. Terms and hints are matched the way WordNet
/// lemma names are written: trimmed, lowercased, spaces as underscores.
#[derive(Debug, Default, Clone)]
pub struct SynsetTable {
    by_pair: HashMap<(String, String), String>,
    by_term: HashMap<String, String>,
    entries: usize,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "_")
}

impl SynsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut table = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            match fields.as_slice() {
                [term, synset] if !synset.trim().is_empty() => table.insert(term, None, synset),
                [term, hint, synset] if !synset.trim().is_empty() => {
                    table.insert(term, Some(*hint), synset)
                }
                _ => {
                    return Err(ConvertError::InvalidSynsetTable {
                        path: path.to_path_buf(),
                        line: idx + 1,
                    })
                }
            }
        }
        log::info!(
            "Loaded {} synset entries from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn insert(&mut self, term: &str, hint: Option<&str>, synset: &str) {
        let synset = synset.trim().to_string();
        self.entries += 1;
        match hint {
            Some(hint) => {
                self.by_pair
                    .insert((normalize(term), normalize(hint)), synset.clone());
                self.by_term.entry(normalize(term)).or_insert(synset);
            }
            None => {
                self.by_term.insert(normalize(term), synset);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl SynsetLookup for SynsetTable {
    fn synset_offset(&self, term: &str, hint: &str) -> Result<String> {
        let key = normalize(term);
        self.by_pair
            .get(&(key.clone(), normalize(hint)))
            .or_else(|| self.by_term.get(&key))
            .cloned()
            .ok_or_else(|| ConvertError::SynsetNotFound {
                term: term.to_string(),
                hint: hint.to_string(),
            })
    }
}
