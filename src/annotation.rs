//! Bounding-box resolution for gathered images.
//!
//! COCO images (meta `COCO_*`) are looked up by image id in the
//! `instances_<phase>*.json` file of the annotation sources; those files are
//! parsed once per phase and memoized in an [`AnnotationCache`]. Every other
//! image is matched to a VOC XML file whose name starts with its full label,
//! falling back to a single whole-image box.

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::archive::ArchiveWalker;
use crate::coco::get_coco_bboxes;
use crate::error::{ConvertError, Result};
use crate::synset::{require_lookup, SynsetLookup};
use crate::types::{AnnotationCache, BoundingBox, ImageRecord, LabelId};
use crate::voc::get_xml_rects;

const COCO_META_PREFIX: &str = "COCO_";

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Finds the boxes of an image in a fixed list of annotation sources.
#[derive(Clone, Copy)]
pub struct AnnotationResolver<'a> {
    sources: &'a [PathBuf],
    lookup: Option<&'a dyn SynsetLookup>,
}

impl<'a> AnnotationResolver<'a> {
    pub fn new(sources: &'a [PathBuf], lookup: Option<&'a dyn SynsetLookup>) -> Self {
        Self { sources, lookup }
    }

    pub fn resolve_record(
        &self,
        phase: &str,
        record: &ImageRecord,
        cache: &mut AnnotationCache,
    ) -> Result<Vec<BoundingBox>> {
        self.resolve_boxes(phase, &record.full_label, &record.label, &record.meta, cache)
    }

    /// Get the list of boxes for an image label.
    ///
    /// An empty list means the image has no annotation and should be
    /// skipped; this only happens for COCO images and unreadable VOC files.
    pub fn resolve_boxes(
        &self,
        phase: &str,
        full_label: &str,
        label: &LabelId,
        meta: &str,
        cache: &mut AnnotationCache,
    ) -> Result<Vec<BoundingBox>> {
        if meta.starts_with(COCO_META_PREFIX) {
            return self.resolve_coco(phase, label, cache);
        }
        self.resolve_voc(full_label, label)
    }

    fn resolve_coco(
        &self,
        phase: &str,
        label: &LabelId,
        cache: &mut AnnotationCache,
    ) -> Result<Vec<BoundingBox>> {
        let lookup = require_lookup(self.lookup)?;
        if cache.instances_missing() {
            return Ok(Vec::new());
        }

        for source in self.sources {
            for path in ArchiveWalker::new(source, r"\.json")? {
                let path = path?;
                let fname = file_name_of(&path);
                if !(fname.contains("instances") && fname.contains(phase)) {
                    continue;
                }
                if !cache.contains_file(&fname) {
                    debug!("Loading COCO annotations from {}", path.display());
                    let parsed = get_coco_bboxes(&path, lookup)?;
                    cache.insert(fname.clone(), parsed);
                }
                let boxes = label
                    .as_id()
                    .and_then(|image_id| cache.get(&fname)?.get(&image_id))
                    .cloned()
                    .unwrap_or_default();
                return Ok(boxes);
            }
        }

        warn!("No COCO instances file found for phase {}", phase);
        cache.mark_instances_missing();
        Ok(Vec::new())
    }

    fn resolve_voc(&self, full_label: &str, label: &LabelId) -> Result<Vec<BoundingBox>> {
        let label_text = label.to_string();
        let voc_filter = |elem: &str| elem.contains(label_text.as_str());

        for source in self.sources {
            let walker = ArchiveWalker::new(source, r"\.xml")?.with_filter(&voc_filter);
            for path in walker {
                let path = path?;
                if !file_name_of(&path).starts_with(full_label) {
                    continue;
                }
                let rects = match get_xml_rects(&path, &label_text) {
                    Ok(rects) => rects,
                    Err(e @ ConvertError::VocXml { .. }) => {
                        warn!("{}", e);
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                };
                return Ok(rects
                    .into_iter()
                    .map(|rect| BoundingBox::new(label.clone(), rect))
                    .collect());
            }
        }

        // full image as a box
        Ok(vec![BoundingBox::whole_image(label.clone())])
    }
}
