use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::annotation::AnnotationResolver;
use crate::config::Args;
use crate::error::Result;
use crate::gather::gather_images;
use crate::io::{relative_path, PhaseWriter};
use crate::synset::{SynsetLookup, SynsetTable};
use crate::types::{AnnotationCache, ImageRecord, LabelCounts, PhaseBuckets, ProcessingStats};
use crate::utils::create_progress_bar;

/// Resolve the boxes of one phase's images and write its TSV and line index.
pub fn write_phase(
    root_path: &Path,
    phase: &str,
    records: &[ImageRecord],
    resolver: &AnnotationResolver,
    stats: &mut ProcessingStats,
) -> Result<usize> {
    let mut cache = AnnotationCache::new();
    let mut writer = PhaseWriter::create(root_path, phase)?;
    let pb = create_progress_bar(records.len() as u64, phase);

    for record in records {
        let boxes = resolver.resolve_record(phase, record, &mut cache)?;
        pb.inc(1);
        if boxes.is_empty() {
            warn!("No annotation for {}", record.path.display());
            stats.increment_skipped_no_annotation();
            continue;
        }
        let relpath = relative_path(&record.path, root_path);
        writer.write_row(&record.full_label, &boxes, &relpath)?;
        stats.record_row(&boxes);
    }

    pb.finish_with_message(format!("{} processing complete", phase));
    Ok(writer.finish()?)
}

/// Gather, resolve and write every phase found under `root_path`.
pub fn convert_dataset(
    root_path: &Path,
    annotations: &[PathBuf],
    max_keep_per_label: Option<usize>,
    lookup: Option<&dyn SynsetLookup>,
) -> Result<(PhaseBuckets, LabelCounts, ProcessingStats)> {
    let mut images = PhaseBuckets::new();
    let mut counts = LabelCounts::new();
    gather_images(root_path, &mut images, &mut counts, max_keep_per_label, lookup)?;

    let mut stats = ProcessingStats::new();
    stats.phases = images.len();
    stats.images_gathered = images.values().map(Vec::len).sum();
    info!(
        "Gathered {} images with {} labels.",
        stats.images_gathered,
        counts.len()
    );

    let resolver = AnnotationResolver::new(annotations, lookup);
    let multi_phase = images.len() > 1;
    for (phase, records) in &images {
        if multi_phase {
            info!("Phase: {}", phase);
        }
        let rows = write_phase(root_path, phase, records, &resolver, &mut stats)?;
        info!("Wrote {} rows for phase {}", rows, phase);
    }

    Ok((images, counts, stats))
}

/// Main dataset processing pipeline
pub fn process_dataset(args: &Args) -> Result<ProcessingStats> {
    let table = args
        .synsets
        .as_deref()
        .map(SynsetTable::from_path)
        .transpose()?;
    if table.is_none() {
        warn!("No synset table given; COCO categories and directory labels cannot be resolved.");
    }
    let lookup = table.as_ref().map(|t| t as &dyn SynsetLookup);

    let (_, _, stats) = convert_dataset(&args.root_path, &args.annotation, args.keep, lookup)?;
    Ok(stats)
}
