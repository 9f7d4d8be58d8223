use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::label::{guess_label, guess_phase, is_known_phase};
use crate::synset::SynsetLookup;
use crate::types::{ImageRecord, LabelCounts, PhaseBuckets, DEFAULT_PHASE, IMG_EXTENSIONS};
use crate::utils::{is_hidden, split_ext};

/// Gather image records under `root_path` into per-phase buckets.
///
/// Directories are walked depth-first in name order, without looking into
/// archives. At most `max_keep_per_label` images are kept for each label;
/// the first image of a label is always kept.
///
/// Example layouts:
/// ```text
/// root/training/n04422727/blue_cheese.jpg
/// root/training/n04422727_43.jpg
/// root/training/cheeses/n04422727_41.jpg
/// root/n04422727_41_training.jpg
/// root/training/n04422727_42_bluecheese.jpg
/// root/training/COCO_val2014_000000006818.jpg
/// ```
pub fn gather_images(
    root_path: &Path,
    images: &mut PhaseBuckets,
    counts: &mut LabelCounts,
    max_keep_per_label: Option<usize>,
    lookup: Option<&dyn SynsetLookup>,
) -> Result<()> {
    let mut names: Vec<String> = fs::read_dir(root_path)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();

    for name in names.iter().filter(|name| !is_hidden(name)) {
        let path = root_path.join(name);
        if path.is_dir() {
            gather_images(&path, images, counts, max_keep_per_label, lookup)?;
            continue;
        }

        let (_, ext) = split_ext(name);
        let ext = ext.to_lowercase();
        if !IMG_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }

        let guess = guess_label(&path, lookup)?;
        let count = counts.entry(guess.label.clone()).or_insert(0);
        if *count > 0 && max_keep_per_label.is_some_and(|cap| *count >= cap) {
            debug!("Label {} is capped, dropping {}", guess.label, path.display());
            continue;
        }
        *count += 1;

        let phase = match guess_phase(&path) {
            Some(phase) => phase,
            None => {
                let phase = images
                    .keys()
                    .find(|phase| is_known_phase(phase))
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_PHASE.to_string());
                warn!("Phase {} was assumed when processing {}", phase, path.display());
                phase
            }
        };

        images.entry(phase).or_default().push(ImageRecord {
            path,
            label: guess.label,
            full_label: guess.full_label,
            meta: guess.meta,
        });
    }

    Ok(())
}
