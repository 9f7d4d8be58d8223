//! Label and phase inference from image paths.
//!
//! Three naming conventions are recognized, tried in order:
//!
//! 1. ImageNet synsets anywhere in the path: `n04422727_41_bluecheese.jpg`,
//!    `train/n04422727/cheese.jpg`.
//! 2. COCO image ids in the file stem: `COCO_val2014_000000006818.jpg`.
//! 3. Anything else is labeled by its parent directory through the synset
//!    lookup service.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::Result;
use crate::synset::{require_lookup, SynsetLookup};
use crate::types::{LabelId, VALID_PHASES};
use crate::utils::{path_elements_rev, split_ext};

static SYNSET_LABEL_PATTERN: OnceLock<Regex> = OnceLock::new();
static COCO_LABEL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn synset_label_pattern() -> &'static Regex {
    SYNSET_LABEL_PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<label>n\d{8})(?P<ext>_\d+)?(_(?P<meta>\w+))?")
            .expect("synset label pattern is valid")
    })
}

fn coco_label_pattern() -> &'static Regex {
    COCO_LABEL_PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<meta>COCO_.*)?(?P<label>\d{12})$")
            .expect("COCO label pattern is valid")
    })
}

/// Label inferred for one image path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGuess {
    pub label: LabelId,
    /// Most specific form of the label, matched against annotation file names
    pub full_label: String,
    /// Convention tag: `IN_*`, `COCO_*`, or the lookup identifier
    pub meta: String,
}

/// Match the synset convention against a single path element.
fn match_synset(elem: &str) -> Option<LabelGuess> {
    let caps = synset_label_pattern().captures(elem)?;
    let label = caps.name("label")?.as_str();
    let full_label = match caps.name("ext").map(|m| m.as_str()) {
        Some(ext) if !ext.is_empty() => format!("{}{}", label, ext),
        _ => label.to_string(),
    };
    let meta = caps.name("meta").map_or("", |m| m.as_str());
    Some(LabelGuess {
        label: LabelId::Name(label.to_string()),
        full_label,
        meta: format!("IN_{}", meta),
    })
}

/// Match the COCO convention against a file stem.
fn match_coco(stem: &str) -> Option<LabelGuess> {
    let caps = coco_label_pattern().captures(stem)?;
    let digits = caps.name("label")?.as_str();
    let image_id = digits.parse::<u64>().ok()?;
    let meta = caps.name("meta").map_or("", |m| m.as_str());
    Some(LabelGuess {
        label: LabelId::Id(image_id),
        full_label: digits.to_string(),
        meta: format!("COCO_{}", meta),
    })
}

/// Guess the label of an image from its path.
///
/// The lookup service is only consulted when neither the synset nor the
/// COCO convention matches; it is an error for it to be missing then.
pub fn guess_label(path: &Path, lookup: Option<&dyn SynsetLookup>) -> Result<LabelGuess> {
    if let Some(guess) = path_elements_rev(path)
        .iter()
        .find_map(|elem| match_synset(elem))
    {
        return Ok(guess);
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, _) = split_ext(&file_name);
    if let Some(guess) = match_coco(stem) {
        return Ok(guess);
    }

    // Use the immediate directory as label
    let parent = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let synset = require_lookup(lookup)?.synset_offset(&parent, stem)?;
    Ok(LabelGuess {
        label: LabelId::Name(synset.clone()),
        full_label: synset.clone(),
        meta: synset,
    })
}

/// Guess the phase from a path: the last element containing one of
/// `train`, `test` or `val` (case-insensitive substring), as written.
pub fn guess_phase(path: &Path) -> Option<String> {
    path_elements_rev(path)
        .into_iter()
        .find(|elem| is_known_phase(elem))
}

/// True if a phase name contains one of the known phase tokens.
pub fn is_known_phase(phase: &str) -> bool {
    let lower = phase.to_lowercase();
    VALID_PHASES.iter().any(|name| lower.contains(name))
}
