use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

const USAGE_EXAMPLES: &str = "\
Example:
  dataset2tsv d:/data/imagenet/ -a d:/data/imagenet/Annotation.tar.gz
  dataset2tsv d:/data/coco -a d:/data/coco/annotations_trainval2017.zip -s synsets.tsv
  dataset2tsv d:/data/fridge -a d:/data/coco/annotations_fridge/ -s synsets.tsv";

/// Process images in a path recursively and prepare TSV files (ImageNet, COCO and VOC).
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None, after_help = USAGE_EXAMPLES)]
pub struct Args {
    /// Maximum number of images to keep for each label
    #[arg(short = 'k', long = "keep", value_parser = validate_keep)]
    pub keep: Option<usize>,

    /// Annotation archive file, or directory (can be specified multiple times)
    #[arg(short = 'a', long = "annotation", required = true)]
    pub annotation: Vec<PathBuf>,

    /// Synset table (term<TAB>[hint<TAB>]synset) for COCO categories and directory labels
    #[arg(short = 's', long = "synsets")]
    pub synsets: Option<PathBuf>,

    /// Path to the images dataset
    #[arg(value_name = "PATH")]
    pub root_path: PathBuf,
}

// Validate that the retention cap is a positive integer
fn validate_keep(s: &str) -> Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val > 0 => Ok(val),
        _ => Err("KEEP must be a positive integer".to_string()),
    }
}
