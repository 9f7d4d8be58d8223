use serde::Serialize;
use serde_json::ser::Formatter;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::types::BoundingBox;

/// JSON formatter using `", "` and `": "` separators, as Python's `json.dumps`
/// writes them by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Render a box list the way it appears in the TSV.
pub fn boxes_to_json(boxes: &[BoundingBox]) -> serde_json::Result<String> {
    let mut buf = Vec::with_capacity(boxes.len() * 48);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    boxes.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Path of `path` relative to `root`, with `/` separators.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Writer for one phase: `<phase>.tsv` plus its `<phase>.lineidx`, which
/// holds the byte offset of every TSV row.
pub struct PhaseWriter {
    tsv: BufWriter<File>,
    lineidx: BufWriter<File>,
    offset: u64,
    rows: usize,
}

impl PhaseWriter {
    pub fn create(root: &Path, phase: &str) -> io::Result<Self> {
        let (tsv_path, lineidx_path) = Self::paths(root, phase);
        Ok(Self {
            tsv: BufWriter::new(File::create(tsv_path)?),
            lineidx: BufWriter::new(File::create(lineidx_path)?),
            offset: 0,
            rows: 0,
        })
    }

    /// Output file paths for a phase, `<root>/<phase>.tsv` and `<root>/<phase>.lineidx`
    pub fn paths(root: &Path, phase: &str) -> (PathBuf, PathBuf) {
        (
            root.join(format!("{}.tsv", phase)),
            root.join(format!("{}.lineidx", phase)),
        )
    }

    pub fn write_row(
        &mut self,
        full_label: &str,
        boxes: &[BoundingBox],
        relpath: &str,
    ) -> io::Result<()> {
        let boxes = boxes_to_json(boxes).map_err(io::Error::from)?;
        let row = format!("{}\t{}\t{}\n", full_label, boxes, relpath);
        writeln!(self.lineidx, "{}", self.offset)?;
        self.tsv.write_all(row.as_bytes())?;
        self.offset += row.len() as u64;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<usize> {
        self.tsv.flush()?;
        self.lineidx.flush()?;
        Ok(self.rows)
    }
}
