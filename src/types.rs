use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// Image file extensions picked up while gathering
pub const IMG_EXTENSIONS: &[&str] = &[".jpg", ".png"];

// Tokens that identify a dataset split in a path element
pub const VALID_PHASES: &[&str] = &["train", "test", "val"];

// Phase used when nothing in the path and nothing gathered so far names one
pub const DEFAULT_PHASE: &str = "training";

/// Class identity of an image or a box.
///
/// COCO images are keyed by their integer image id, everything else by a
/// synset-like string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum LabelId {
    Id(u64),
    Name(String),
}

impl LabelId {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            LabelId::Id(id) => Some(*id),
            LabelId::Name(_) => None,
        }
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelId::Id(id) => write!(f, "{}", id),
            LabelId::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for LabelId {
    fn from(name: &str) -> Self {
        LabelId::Name(name.to_string())
    }
}

/// A single box coordinate, kept in the numeric kind it was read in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coord {
    Int(i64),
    Float(f64),
}

impl Coord {
    /// Closed-interval far edge of a span starting at `self`: `self + size - 1`.
    pub fn extent(self, size: Coord) -> Coord {
        match (self, size) {
            (Coord::Int(origin), Coord::Int(size)) => Coord::Int(origin + size - 1),
            (origin, size) => Coord::Float(origin.as_f64() + size.as_f64() - 1.0),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Coord::Int(v) => v as f64,
            Coord::Float(v) => v,
        }
    }
}

impl From<i64> for Coord {
    fn from(v: i64) -> Self {
        Coord::Int(v)
    }
}

impl FromStr for Coord {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(v) => Ok(Coord::Int(v)),
            Err(_) => s.parse::<f64>().map(Coord::Float),
        }
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Coord::Int(v) => serializer.serialize_i64(v),
            Coord::Float(v) => serializer.serialize_f64(v),
        }
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoordVisitor;

        impl<'de> Visitor<'de> for CoordVisitor {
            type Value = Coord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coord, E> {
                Ok(Coord::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coord, E> {
                i64::try_from(v)
                    .map(Coord::Int)
                    .map_err(|_| E::custom(format!("coordinate {} out of range", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coord, E> {
                Ok(Coord::Float(v))
            }
        }

        deserializer.deserialize_any(CoordVisitor)
    }
}

/// `[xmin, ymin, xmax, ymax]`, closed interval.
pub type Rect = [Coord; 4];

/// A labeled box. A single all-zero rect stands for the whole image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    pub class: LabelId,
    pub rect: Rect,
}

impl BoundingBox {
    pub fn new(class: LabelId, rect: Rect) -> Self {
        Self { class, rect }
    }

    /// Box covering the whole image, used when no localized annotation exists.
    pub fn whole_image(class: LabelId) -> Self {
        Self::new(class, [Coord::Int(0); 4])
    }

    pub fn is_whole_image(&self) -> bool {
        self.rect.iter().all(|c| *c == Coord::Int(0))
    }
}

/// An image found while gathering, with the label inferred from its path.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub label: LabelId,
    pub full_label: String,
    pub meta: String,
}

// Phase name -> images, in gathering order
pub type PhaseBuckets = IndexMap<String, Vec<ImageRecord>>;

// Per-label number of images retained so far
pub type LabelCounts = HashMap<LabelId, usize>;

// Parsed COCO boxes, keyed by image id
pub type CocoBoxes = HashMap<u64, Vec<BoundingBox>>;

/// COCO annotations seen while processing one phase.
///
/// Parsed instance files are kept by basename. Once a phase is found to have
/// no instances file at all, that is remembered too.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    files: HashMap<String, CocoBoxes>,
    instances_missing: bool,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fname: &str) -> Option<&CocoBoxes> {
        self.files.get(fname)
    }

    pub fn contains_file(&self, fname: &str) -> bool {
        self.files.contains_key(fname)
    }

    pub fn insert(&mut self, fname: String, boxes: CocoBoxes) {
        self.files.insert(fname, boxes);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn instances_missing(&self) -> bool {
        self.instances_missing
    }

    pub fn mark_instances_missing(&mut self) {
        self.instances_missing = true;
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub phases: usize,
    pub images_gathered: usize,
    pub rows_written: usize,
    pub whole_image_rows: usize,
    pub skipped_no_annotation: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_row(&mut self, boxes: &[BoundingBox]) {
        self.rows_written += 1;
        if boxes.len() == 1 && boxes[0].is_whole_image() {
            self.whole_image_rows += 1;
        }
    }

    pub fn increment_skipped_no_annotation(&mut self) {
        self.skipped_no_annotation += 1;
    }

    pub fn print_summary(&self) {
        log::info!("=== Conversion Summary ===");
        log::info!("Phases written: {}", self.phases);
        log::info!("Images gathered: {}", self.images_gathered);
        log::info!("Rows written: {}", self.rows_written);
        log::info!("Rows with a whole-image box: {}", self.whole_image_rows);
        if self.skipped_no_annotation > 0 {
            log::warn!(
                "Skipped images without annotation: {}",
                self.skipped_no_annotation
            );
        }
    }
}
