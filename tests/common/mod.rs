#![allow(dead_code)]

use dataset2tsv::{Result, SynsetLookup, SynsetTable};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `content` at `path`, creating parent directories.
pub fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn tar_gz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_bytes(entries)).unwrap();
    encoder.finish().unwrap()
}

/// Tar whose entry names are written verbatim, bypassing the builder's
/// path checks.
pub fn raw_tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        {
            let gnu = header.as_gnu_mut().unwrap();
            gnu.name[..name.len()].copy_from_slice(name.as_bytes());
        }
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn raw_name_tar_bytes(name: &str, data: &[u8]) -> Vec<u8> {
    raw_tar_bytes(&[(name, data)])
}

/// Tar holding a single symlink `name -> target`.
pub fn symlink_tar_bytes(name: &str, target: &str) -> Vec<u8> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_link_name(target).unwrap();
    let mut builder = tar::Builder::new(Vec::new());
    builder
        .append_data(&mut header, name, std::io::empty())
        .unwrap();
    builder.into_inner().unwrap()
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

pub fn voc_xml(objects: &[(&str, u8, [i64; 4])]) -> String {
    let mut xml = String::from(
        "<annotation><folder>n04422727</folder><filename>n04422727_41</filename>\
         <size><width>500</width><height>375</height><depth>3</depth></size>\
         <segmented>0</segmented>",
    );
    for (name, difficult, [xmin, ymin, xmax, ymax]) in objects {
        xml.push_str(&format!(
            "<object><name>{}</name><pose>Unspecified</pose><truncated>0</truncated>\
             <difficult>{}</difficult><bndbox><xmin>{}</xmin><ymin>{}</ymin>\
             <xmax>{}</xmax><ymax>{}</ymax></bndbox></object>",
            name, difficult, xmin, ymin, xmax, ymax
        ));
    }
    xml.push_str("</annotation>");
    xml
}

/// Synset table that counts how often it is asked.
pub struct CountingLookup {
    pub table: SynsetTable,
    pub calls: Cell<usize>,
}

impl CountingLookup {
    pub fn new(entries: &[(&str, Option<&str>, &str)]) -> Self {
        let mut table = SynsetTable::new();
        for (term, hint, synset) in entries {
            table.insert(term, *hint, synset);
        }
        Self {
            table,
            calls: Cell::new(0),
        }
    }
}

impl SynsetLookup for CountingLookup {
    fn synset_offset(&self, term: &str, hint: &str) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        self.table.synset_offset(term, hint)
    }
}
