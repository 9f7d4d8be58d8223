//! Archive-aware recursive file listing.
//!
//! [`ArchiveWalker`] yields the files under a path like a recursive
//! directory listing, except that `.tar`, `.tar.gz` and `.zip` containers met
//! on the way are extracted next to themselves into `extracted_<name>` and
//! walked as directories. An existing extraction directory is reused as is.

use flate2::read::GzDecoder;
use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::utils::{compound_extension, is_hidden};

/// Predicate on a directory entry name, used to narrow a walk.
pub type NameFilter<'f> = &'f dyn Fn(&str) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Tar,
    TarGz,
    Zip,
}

impl ContainerKind {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".tar" => Some(ContainerKind::Tar),
            ".tar.gz" => Some(ContainerKind::TarGz),
            ".zip" => Some(ContainerKind::Zip),
            _ => None,
        }
    }
}

enum Step<'f> {
    Visit {
        path: PathBuf,
        filter: Option<NameFilter<'f>>,
        is_root: bool,
    },
    // Nested archive copy to delete once its extraction has been walked
    Discard(PathBuf),
}

/// Lazy, depth-first listing of the files under a path.
///
/// Only files whose compound extension matches the extension pattern
/// (case-insensitive, anchored at the start) are yielded. An optional name
/// filter narrows the walk: at each directory level it keeps the matching
/// entries and is dropped below them; a level with several entries and no
/// match is pruned; a level with a single entry is descended regardless.
///
/// Extraction failures end the walk: the error is yielded once and the
/// iterator is exhausted afterwards.
pub struct ArchiveWalker<'f> {
    stack: Vec<Step<'f>>,
    extension: Regex,
    failed: bool,
}

impl<'f> ArchiveWalker<'f> {
    pub fn new<P: AsRef<Path>>(path: P, extension_pattern: &str) -> Result<Self> {
        let extension = RegexBuilder::new(&format!("^(?:{})", extension_pattern))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            stack: vec![Step::Visit {
                path: path.as_ref().to_path_buf(),
                filter: None,
                is_root: true,
            }],
            extension,
            failed: false,
        })
    }

    /// Narrow the walk with a name filter, see [`ArchiveWalker`].
    pub fn with_filter(mut self, name_filter: NameFilter<'f>) -> Self {
        for step in &mut self.stack {
            if let Step::Visit { filter, .. } = step {
                *filter = Some(name_filter);
            }
        }
        self
    }

    fn visit(
        &mut self,
        path: PathBuf,
        filter: Option<NameFilter<'f>>,
        is_root: bool,
    ) -> Result<Option<PathBuf>> {
        if path.is_dir() {
            self.push_children(&path, filter)?;
            return Ok(None);
        }
        if !path.is_file() {
            debug!("Skipping missing path {}", path.display());
            return Ok(None);
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (base, ext) = compound_extension(&file_name);

        let Some(kind) = ContainerKind::from_extension(&ext) else {
            return Ok(self.extension.is_match(&ext).then_some(path));
        };

        let extracted = path.with_file_name(format!("extracted_{}", base));
        if !extracted.exists() {
            extract_archive(&path, &extracted, kind)?;
            if !is_root {
                self.stack.push(Step::Discard(path));
            }
        }
        self.stack.push(Step::Visit {
            path: extracted,
            filter,
            is_root: false,
        });
        Ok(None)
    }

    fn push_children(&mut self, dir: &Path, filter: Option<NameFilter<'f>>) -> Result<()> {
        let mut names: Vec<String> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<_>>()?;
        names.retain(|name| !is_hidden(name));
        names.sort();

        let mut child_filter = filter;
        if let Some(predicate) = filter {
            let matched: Vec<String> = names
                .iter()
                .filter(|name| predicate(name.as_str()))
                .cloned()
                .collect();
            if !matched.is_empty() {
                names = matched;
                child_filter = None;
            } else if names.len() > 1 {
                names.clear();
            }
        }

        for name in names.into_iter().rev() {
            self.stack.push(Step::Visit {
                path: dir.join(name),
                filter: child_filter,
                is_root: false,
            });
        }
        Ok(())
    }
}

impl Iterator for ArchiveWalker<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed {
            match self.stack.pop()? {
                Step::Discard(path) => {
                    if let Err(e) = fs::remove_file(&path) {
                        warn!("Failed to remove extracted archive {}: {}", path.display(), e);
                    }
                }
                Step::Visit {
                    path,
                    filter,
                    is_root,
                } => match self.visit(path, filter, is_root) {
                    Ok(Some(found)) => return Some(Ok(found)),
                    Ok(None) => {}
                    Err(e) => {
                        self.failed = true;
                        self.stack.clear();
                        return Some(Err(e));
                    }
                },
            }
        }
        None
    }
}

/// True if `entry`, joined onto a destination directory, stays inside it.
pub fn stays_within_destination(entry: &Path) -> bool {
    let mut depth = 0usize;
    for component in entry.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Extract a container archive into `dest`.
///
/// A member whose path, or link target, would land outside `dest` aborts with
/// [`ConvertError::PathTraversal`]. Any failure removes the partially
/// written `dest`.
fn extract_archive(archive: &Path, dest: &Path, kind: ContainerKind) -> Result<()> {
    info!("Extracting {} into {}", archive.display(), dest.display());
    match kind {
        ContainerKind::Tar | ContainerKind::TarGz => {
            fs::create_dir_all(dest)?;
            let unpacked = unpack_tar(archive, dest, kind);
            if unpacked.is_err() {
                let _ = fs::remove_dir_all(dest);
            }
            unpacked
        }
        ContainerKind::Zip => {
            let zip_err = |source| ConvertError::Zip {
                path: archive.to_path_buf(),
                source,
            };
            let mut zip = zip::ZipArchive::new(BufReader::new(File::open(archive)?))
                .map_err(zip_err)?;
            for i in 0..zip.len() {
                let member = zip.by_index(i).map_err(zip_err)?;
                if member.enclosed_name().is_none() {
                    return Err(ConvertError::PathTraversal {
                        archive: archive.to_path_buf(),
                        entry: member.name().to_string(),
                    });
                }
            }
            fs::create_dir_all(dest)?;
            let unpacked = zip.extract(dest).map_err(zip_err);
            if unpacked.is_err() {
                let _ = fs::remove_dir_all(dest);
            }
            unpacked
        }
    }
}

fn open_tar(archive: &Path, kind: ContainerKind) -> std::io::Result<tar::Archive<Box<dyn Read>>> {
    let file = BufReader::new(File::open(archive)?);
    let reader: Box<dyn Read> = match kind {
        ContainerKind::TarGz => Box::new(GzDecoder::new(file)),
        _ => Box::new(file),
    };
    Ok(tar::Archive::new(reader))
}

/// Single pass over the tar stream: each member is checked, then unpacked.
fn unpack_tar(archive: &Path, dest: &Path, kind: ContainerKind) -> Result<()> {
    let archive_err = |source| ConvertError::Archive {
        path: archive.to_path_buf(),
        source,
    };
    let traversal = |entry: &Path| ConvertError::PathTraversal {
        archive: archive.to_path_buf(),
        entry: entry.to_string_lossy().into_owned(),
    };

    let mut tar = open_tar(archive, kind).map_err(archive_err)?;
    for entry in tar.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        let name = entry.path().map_err(archive_err)?.into_owned();
        if !stays_within_destination(&name) {
            return Err(traversal(&name));
        }
        if let Some(target) = entry.link_name().map_err(archive_err)? {
            // symlinks resolve from their own directory, hard links from the root
            let resolved = match entry.header().entry_type() {
                tar::EntryType::Symlink => name.parent().unwrap_or(Path::new("")).join(&target),
                _ => target.into_owned(),
            };
            if !stays_within_destination(&resolved) {
                return Err(traversal(&name));
            }
        }
        entry.unpack_in(dest).map_err(archive_err)?;
    }
    Ok(())
}
