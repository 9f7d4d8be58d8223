//! COCO `instances_*.json` parsing
//!
//! Only the parts needed for boxes are read: `annotations` and `categories`.

use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::synset::SynsetLookup;
use crate::types::{BoundingBox, CocoBoxes, Coord, LabelId};

/// COCO category information
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub supercategory: String,
}

/// COCO annotation information
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub image_id: u64,
    pub category_id: u64,
    pub bbox: [Coord; 4], // [x, y, width, height]
}

/// The subset of a COCO instances file used for boxes
#[derive(Debug, Clone, Deserialize)]
pub struct InstancesFile {
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

/// Convert `[x, y, w, h]` into a closed `[xmin, ymin, xmax, ymax]`.
pub fn xywh_to_rect(bbox: [Coord; 4]) -> [Coord; 4] {
    let [x, y, w, h] = bbox;
    [x, y, x.extent(w), y.extent(h)]
}

/// Read an instances file from disk.
///
/// The file is parsed straight from a buffered stream; instances files run
/// to hundreds of megabytes.
pub fn read_instances_file(path: &Path) -> Result<InstancesFile> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| ConvertError::CocoJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Group the boxes of an instances file by image id.
///
/// Each category is translated to a synset once, through `lookup`, with its
/// supercategory as the hint.
pub fn group_bboxes(instances: InstancesFile, lookup: &dyn SynsetLookup) -> Result<CocoBoxes> {
    let categories: HashMap<u64, Category> = instances
        .categories
        .into_iter()
        .map(|cat| (cat.id, cat))
        .collect();
    let mut synsets: HashMap<u64, LabelId> = HashMap::new();

    let mut bboxes = CocoBoxes::new();
    for ann in instances.annotations {
        let class = match synsets.get(&ann.category_id) {
            Some(class) => class.clone(),
            None => {
                let Some(cat) = categories.get(&ann.category_id) else {
                    warn!(
                        "Ignore annotation of image {} with unknown category {}",
                        ann.image_id, ann.category_id
                    );
                    continue;
                };
                let class = LabelId::Name(lookup.synset_offset(&cat.name, &cat.supercategory)?);
                synsets.insert(ann.category_id, class.clone());
                class
            }
        };
        bboxes
            .entry(ann.image_id)
            .or_default()
            .push(BoundingBox::new(class, xywh_to_rect(ann.bbox)));
    }

    Ok(bboxes)
}

/// Parse bboxes from the instances file at `path`
pub fn get_coco_bboxes(path: &Path, lookup: &dyn SynsetLookup) -> Result<CocoBoxes> {
    group_bboxes(read_instances_file(path)?, lookup)
}
