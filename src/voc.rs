//! VOC-style XML annotations.

use log::{debug, warn};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::types::{Coord, Rect};

/// `object` elements are collected even when other elements sit between them.
#[derive(Debug, Deserialize)]
pub struct VocAnnotation {
    #[serde(default)]
    pub object: Vec<VocObject>,
}

#[derive(Debug, Deserialize)]
pub struct VocObject {
    pub name: String,
    #[serde(default)]
    pub difficult: Option<String>,
    #[serde(default)]
    pub bndbox: Vec<VocBndBox>,
}

#[derive(Debug, Deserialize)]
pub struct VocBndBox {
    pub xmin: String,
    pub ymin: String,
    pub xmax: String,
    pub ymax: String,
}

impl VocObject {
    pub fn is_difficult(&self) -> bool {
        self.difficult
            .as_deref()
            .and_then(|flag| flag.trim().parse::<Coord>().ok())
            .is_some_and(|flag| flag.as_f64() != 0.0)
    }
}

impl VocBndBox {
    /// Coordinates exactly as stored; VOC boxes are not reliably 1-based.
    pub fn rect(&self) -> Option<Rect> {
        Some([
            self.xmin.trim().parse().ok()?,
            self.ymin.trim().parse().ok()?,
            self.xmax.trim().parse().ok()?,
            self.ymax.trim().parse().ok()?,
        ])
    }
}

pub fn read_voc_annotation(path: &Path) -> Result<VocAnnotation> {
    let reader = BufReader::new(File::open(path)?);
    quick_xml::de::from_reader(reader).map_err(|source| ConvertError::VocXml {
        path: path.to_path_buf(),
        source,
    })
}

/// Rects of the non-difficult objects named `label` in a VOC XML file.
pub fn get_xml_rects(path: &Path, label: &str) -> Result<Vec<Rect>> {
    let annotation = read_voc_annotation(path)?;

    let mut rects = Vec::new();
    for obj in &annotation.object {
        if obj.name != label {
            debug!(
                "Ignore label \"{}\" != {} in {}",
                obj.name,
                label,
                path.display()
            );
            continue;
        }
        if obj.is_difficult() {
            debug!("Ignore difficult label \"{}\" in {}", label, path.display());
            continue;
        }
        for bndbox in &obj.bndbox {
            match bndbox.rect() {
                Some(rect) => rects.push(rect),
                None => warn!("Ignore malformed bndbox {:?} in {}", bndbox, path.display()),
            }
        }
    }

    Ok(rects)
}
