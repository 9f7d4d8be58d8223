use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Split a file name into stem and last extension.
///
/// Leading dots do not start an extension, so `.hidden` has none.
pub fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if !name[..idx].chars().all(|c| c == '.') => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Split a file name into the name minus its last extension and the
/// lowercased compound extension made of every dotted suffix.
///
/// `Annotation.tar.gz` gives `("Annotation.tar", ".tar.gz")`.
pub fn compound_extension(name: &str) -> (&str, String) {
    let (base, last) = split_ext(name);
    let mut ext = last.to_string();
    let mut short = base;
    loop {
        let (stem, suffix) = split_ext(short);
        if suffix.is_empty() {
            break;
        }
        ext.insert_str(0, suffix);
        short = stem;
    }
    (base, ext.to_lowercase())
}

/// Path elements from the last one backward, skipping empty ones.
///
/// Both `/` and `\` separate elements.
pub fn path_elements_rev(path: &Path) -> Vec<String> {
    path.to_string_lossy()
        .split(['/', '\\'])
        .filter(|elem| !elem.is_empty())
        .rev()
        .map(str::to_string)
        .collect()
}

/// Names starting with `.` or `$` are hidden and never visited
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('$')
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_split_ext() {
        assert_eq!(split_ext("n04422727_41.jpg"), ("n04422727_41", ".jpg"));
        assert_eq!(split_ext("Annotation"), ("Annotation", ""));
        assert_eq!(split_ext(".hidden"), (".hidden", ""));
        assert_eq!(split_ext("a.b.c"), ("a.b", ".c"));
    }

    #[test]
    fn test_compound_extension() {
        assert_eq!(
            compound_extension("Annotation.tar.gz"),
            ("Annotation.tar", ".tar.gz".to_string())
        );
        assert_eq!(
            compound_extension("n04422727.TAR"),
            ("n04422727", ".tar".to_string())
        );
        assert_eq!(
            compound_extension("annotations_trainval2017.zip"),
            ("annotations_trainval2017", ".zip".to_string())
        );
        assert_eq!(compound_extension("README"), ("README", String::new()));
    }

    #[test]
    fn test_path_elements_rev() {
        let elems = path_elements_rev(&PathBuf::from("/data/train//n04422727_41.jpg"));
        assert_eq!(elems, vec!["n04422727_41.jpg", "train", "data"]);
    }
}
