use crate::catalog::is_image_name;
use std::path::{Path, PathBuf};

/// A connected local folder and the label its entries are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRoot {
    pub dir: PathBuf,
    pub label: String,
}

impl LocalRoot {
    /// Derives a label from the folder name, suffixing `-2`, `-3`, ... when
    /// another connected root already uses it.
    pub fn new(dir: &Path, taken: &[&str]) -> Self {
        let base = dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("folder-{}", taken.len() + 1));

        let mut label = base.clone();
        let mut suffix = 2;
        while taken.contains(&label.as_str()) {
            label = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        LocalRoot {
            dir: dir.to_path_buf(),
            label,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalFile {
    pub absolute_path: PathBuf,
    /// `<label>/<relative path>` with forward slashes.
    pub catalog_path: String,
}

/// Recursively lists the image files below a connected folder.
pub fn scan_local_root(root: &LocalRoot) -> Vec<LocalFile> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(&root.dir)
        .follow_links(false)
        .max_open(32)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !is_image_name(&name) {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(&root.dir) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        files.push(LocalFile {
            absolute_path: entry.path().to_path_buf(),
            catalog_path: format!("{}/{}", root.label, relative),
        });
    }
    files
}

/// Scans every connected root in order.
pub fn scan_local_roots(roots: &[LocalRoot]) -> Vec<LocalFile> {
    roots.iter().flat_map(scan_local_root).collect()
}

/// MIME type for a local image, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}
