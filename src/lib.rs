//! ImageNet / COCO / VOC to TSV converter
//!
//! This library walks an image dataset, infers every image's label from its
//! path, resolves its bounding boxes from annotation archives or directories,
//! and writes one `<phase>.tsv` plus `<phase>.lineidx` per dataset split.

pub mod annotation;
pub mod archive;
pub mod coco;
pub mod config;
pub mod dataset;
pub mod error;
pub mod gather;
pub mod io;
pub mod label;
pub mod synset;
pub mod types;
pub mod utils;
pub mod voc;

// Re-export commonly used types and functions
pub use annotation::AnnotationResolver;
pub use archive::ArchiveWalker;
pub use config::Args;
pub use dataset::{convert_dataset, process_dataset};
pub use error::{ConvertError, Result};
pub use gather::gather_images;
pub use label::{guess_label, guess_phase, LabelGuess};
pub use synset::{SynsetLookup, SynsetTable};
pub use types::{
    AnnotationCache, BoundingBox, Coord, ImageRecord, LabelCounts, LabelId, PhaseBuckets,
    ProcessingStats,
};
