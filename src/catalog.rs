//! Unified image catalog: identity, merge/sort rules, selection repair and
//! ownership of the byte handles issued for local files.

use crate::scanner::{self, LocalFile, LocalRoot};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Allowed image extensions, applied to local and remote names alike.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "heic"];

pub const LOCAL_SOURCE: &str = "local";
pub const NEXTCLOUD_SOURCE: &str = "nextcloud";

/// Where the raw bytes of an entry can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentLocator {
    /// Handle issued by the current catalog generation for a local file.
    LocalHandle { handle: String, url: String },
    /// Same-origin proxy URL for a remote-share file.
    Remote { url: String },
}

impl ContentLocator {
    pub fn url(&self) -> &str {
        match self {
            ContentLocator::LocalHandle { url, .. } | ContentLocator::Remote { url } => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub id: String,
    pub source: String,
    pub path: String,
    pub name: String,
    pub content_locator: ContentLocator,
}

impl ImageEntry {
    pub fn new(source: &str, path: &str, content_locator: ContentLocator) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        ImageEntry {
            id: format!("{}:{}", source, path),
            source: source.to_string(),
            path: path.to_string(),
            name,
            content_locator,
        }
    }
}

/// Case-insensitive extension check against [`IMAGE_EXTENSIONS`].
pub fn is_image_name(name: &str) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Merges every origin into one sequence ordered by path.
///
/// No cross-origin dedup is performed. The sort is stable, so entries sharing a
/// path keep their origin order (local first, then remote origins by tag).
pub fn build_catalog(
    local_entries: Vec<ImageEntry>,
    remote_entries_by_origin: &BTreeMap<String, Vec<ImageEntry>>,
) -> Vec<ImageEntry> {
    let mut merged = local_entries;
    for entries in remote_entries_by_origin.values() {
        merged.extend(entries.iter().cloned());
    }
    merged.sort_by(|a, b| a.path.cmp(&b.path));
    merged
}

/// Keeps `previous` when it still exists, otherwise falls back to the first entry.
pub fn repair_selection(previous: Option<&str>, catalog: &[ImageEntry]) -> Option<String> {
    if let Some(id) = previous {
        if catalog.iter().any(|entry| entry.id == id) {
            return Some(id.to_string());
        }
    }
    catalog.first().map(|entry| entry.id.clone())
}

/// Issues and releases opaque handles for local image files.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    live: HashMap<String, PathBuf>,
    next_id: u64,
    issued: u64,
    released: u64,
}

impl HandleRegistry {
    pub fn issue(&mut self, generation: u64, path: &Path) -> String {
        self.next_id += 1;
        self.issued += 1;
        let handle = format!("{}-{}", generation, self.next_id);
        self.live.insert(handle.clone(), path.to_path_buf());
        handle
    }

    pub fn resolve(&self, handle: &str) -> Option<&Path> {
        self.live.get(handle).map(PathBuf::as_path)
    }

    /// Returns `false` if the handle was unknown or already released.
    pub fn release(&mut self, handle: &str) -> bool {
        if self.live.remove(handle).is_some() {
            self.released += 1;
            log::debug!("Released byte handle {}", handle);
            true
        } else {
            false
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }
}

/// Catalog state for the single local session.
///
/// All mutation goes through `&mut self`; the application keeps the session
/// behind one async mutex so a refresh is a single critical section.
#[derive(Debug, Default)]
pub struct CatalogSession {
    local_roots: Vec<LocalRoot>,
    remote: BTreeMap<String, Vec<ImageEntry>>,
    catalog: Vec<ImageEntry>,
    selected: Option<String>,
    generation: u64,
    handles: HandleRegistry,
}

impl CatalogSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[ImageEntry] {
        &self.catalog
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&ImageEntry> {
        let id = self.selected.as_deref()?;
        self.find(id)
    }

    pub fn find(&self, id: &str) -> Option<&ImageEntry> {
        self.catalog.iter().find(|entry| entry.id == id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn local_roots(&self) -> &[LocalRoot] {
        &self.local_roots
    }

    /// Registers a local folder under a label unique among connected roots.
    pub fn connect_folder(&mut self, dir: &Path) -> &LocalRoot {
        let taken: Vec<&str> = self.local_roots.iter().map(|root| root.label.as_str()).collect();
        let root = LocalRoot::new(dir, &taken);
        self.local_roots.push(root);
        &self.local_roots[self.local_roots.len() - 1]
    }

    pub fn set_remote_entries(&mut self, origin: &str, entries: Vec<ImageEntry>) {
        self.remote.insert(origin.to_string(), entries);
    }

    /// Selects `id` if it is part of the current catalog.
    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    /// Rebuilds the catalog from every connected origin, walking local folders
    /// on the calling thread.
    ///
    /// Handles of the superseded generation are released before enumeration
    /// starts, so they are gone even if the rebuild produces nothing.
    pub fn refresh(&mut self) -> &[ImageEntry] {
        self.release_catalog_handles();
        let files = scanner::scan_local_roots(&self.local_roots);
        self.install_generation(files)
    }

    /// Same as [`refresh`](Self::refresh), with the folder walk moved to the
    /// blocking pool. The caller keeps `&mut self` for the whole rebuild, so it
    /// stays one critical section.
    pub async fn refresh_off_runtime(&mut self) -> &[ImageEntry] {
        self.release_catalog_handles();
        let roots = self.local_roots.clone();
        let scan = tokio::task::spawn_blocking(move || scanner::scan_local_roots(&roots));
        let files = match scan.await {
            Ok(files) => files,
            Err(error) => {
                log::error!("Local folder scan failed: {}", error);
                Vec::new()
            }
        };
        self.install_generation(files)
    }

    fn install_generation(&mut self, files: Vec<LocalFile>) -> &[ImageEntry] {
        self.generation += 1;
        let generation = self.generation;

        let mut local_entries = Vec::with_capacity(files.len());
        for file in files {
            let handle = self.handles.issue(generation, &file.absolute_path);
            let url = format!("/api/local/file?handle={}", handle);
            local_entries.push(ImageEntry::new(
                LOCAL_SOURCE,
                &file.catalog_path,
                ContentLocator::LocalHandle { handle, url },
            ));
        }

        self.catalog = build_catalog(local_entries, &self.remote);
        self.selected = repair_selection(self.selected.as_deref(), &self.catalog);

        log::info!(
            "Catalog generation {} holds {} images ({} local roots, {} remote origins)",
            generation,
            self.catalog.len(),
            self.local_roots.len(),
            self.remote.len()
        );
        &self.catalog
    }

    /// Disconnects every origin and releases all handles.
    pub fn clear(&mut self) {
        self.release_catalog_handles();
        self.local_roots.clear();
        self.remote.clear();
        self.catalog.clear();
        self.selected = None;
    }

    fn release_catalog_handles(&mut self) {
        for entry in &self.catalog {
            if let ContentLocator::LocalHandle { handle, .. } = &entry.content_locator {
                self.handles.release(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn remote(path: &str) -> ImageEntry {
        ImageEntry::new(
            NEXTCLOUD_SOURCE,
            path,
            ContentLocator::Remote {
                url: format!("/api/nextcloud/file?path={}", path),
            },
        )
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "post_planner_catalog_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn catalog_is_sorted_by_path() {
        let mut remote_by_origin = BTreeMap::new();
        remote_by_origin.insert(
            NEXTCLOUD_SOURCE.to_string(),
            vec![remote("b/2.jpg"), remote("a/1.png"), remote("a/0.gif")],
        );

        let catalog = build_catalog(Vec::new(), &remote_by_origin);
        let paths: Vec<&str> = catalog.iter().map(|entry| entry.path.as_str()).collect();
        assert_eq!(paths, vec!["a/0.gif", "a/1.png", "b/2.jpg"]);
    }

    #[test]
    fn catalog_keeps_same_path_from_different_origins() {
        let local = ImageEntry::new(
            LOCAL_SOURCE,
            "a/1.png",
            ContentLocator::LocalHandle {
                handle: "1-1".into(),
                url: "/api/local/file?handle=1-1".into(),
            },
        );
        let mut remote_by_origin = BTreeMap::new();
        remote_by_origin.insert(NEXTCLOUD_SOURCE.to_string(), vec![remote("a/1.png")]);

        let catalog = build_catalog(vec![local], &remote_by_origin);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].id, "local:a/1.png");
        assert_eq!(catalog[1].id, "nextcloud:a/1.png");
    }

    #[test]
    fn selection_repair_falls_back_to_first_or_none() {
        let catalog = vec![remote("a/0.gif"), remote("b/2.jpg")];
        assert_eq!(
            repair_selection(Some("nextcloud:b/2.jpg"), &catalog).as_deref(),
            Some("nextcloud:b/2.jpg")
        );
        assert_eq!(
            repair_selection(Some("local:gone.jpg"), &catalog).as_deref(),
            Some("nextcloud:a/0.gif")
        );
        assert_eq!(repair_selection(Some("local:gone.jpg"), &[]), None);
        assert_eq!(repair_selection(None, &[]), None);
    }

    #[test]
    fn image_names_are_filtered_case_insensitively() {
        assert!(is_image_name("IMG_0001.JPG"));
        assert!(is_image_name("shot.heic"));
        assert!(is_image_name("a.b.webp"));
        assert!(!is_image_name("notes.txt"));
        assert!(!is_image_name("jpg"));
        assert!(!is_image_name("movie.mov"));
    }

    #[test]
    fn entry_identity_combines_source_and_path() {
        let entry = remote("2024/summer/beach.jpg");
        assert_eq!(entry.id, "nextcloud:2024/summer/beach.jpg");
        assert_eq!(entry.name, "beach.jpg");
    }

    #[test]
    fn handles_from_previous_generations_are_released_exactly_once() {
        let dir = temp_dir("handles");
        fs::write(dir.join("one.jpg"), b"1").expect("write");
        fs::write(dir.join("two.png"), b"2").expect("write");
        fs::write(dir.join("skip.txt"), b"x").expect("write");

        let mut session = CatalogSession::new();
        session.connect_folder(&dir);

        session.refresh();
        let first_handles: Vec<String> = session
            .images()
            .iter()
            .filter_map(|entry| match &entry.content_locator {
                ContentLocator::LocalHandle { handle, .. } => Some(handle.clone()),
                ContentLocator::Remote { .. } => None,
            })
            .collect();
        assert_eq!(first_handles.len(), 2);
        assert_eq!(session.handles().live(), 2);

        session.refresh();
        assert_eq!(session.handles().released(), 2);
        for handle in &first_handles {
            assert!(session.handles().resolve(handle).is_none());
        }

        session.refresh();
        assert_eq!(session.handles().issued(), 6);
        assert_eq!(session.handles().released(), 4);
        assert_eq!(session.handles().live(), 2);

        let mut registry = HandleRegistry::default();
        let handle = registry.issue(1, &dir.join("one.jpg"));
        assert!(registry.release(&handle));
        assert!(!registry.release(&handle));
        assert_eq!(registry.released(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn offloaded_refresh_issues_and_releases_like_refresh() {
        let dir = temp_dir("offloaded");
        fs::create_dir_all(dir.join("nested")).expect("mkdir");
        fs::write(dir.join("b.png"), b"1").expect("write");
        fs::write(dir.join("nested/a.jpg"), b"2").expect("write");

        let mut session = CatalogSession::new();
        let label = session.connect_folder(&dir).label.clone();

        let paths: Vec<String> = session
            .refresh_off_runtime()
            .await
            .iter()
            .map(|entry| entry.path.clone())
            .collect();
        assert_eq!(
            paths,
            vec![format!("{}/b.png", label), format!("{}/nested/a.jpg", label)]
        );
        assert_eq!(session.generation(), 1);
        assert_eq!(session.selected_id(), Some(format!("local:{}/b.png", label).as_str()));

        session.refresh_off_runtime().await;
        session.refresh();
        assert_eq!(session.handles().issued(), 6);
        assert_eq!(session.handles().released(), 4);
        assert_eq!(session.handles().live(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn refresh_repairs_selection_and_clear_releases_everything() {
        let dir = temp_dir("clear");
        fs::write(dir.join("a.jpg"), b"1").expect("write");

        let mut session = CatalogSession::new();
        let label = session.connect_folder(&dir).label.clone();
        session.set_remote_entries(NEXTCLOUD_SOURCE, vec![remote("zz/last.jpg")]);
        session.refresh();

        let local_id = format!("local:{}/a.jpg", label);
        assert_eq!(session.images().len(), 2);
        assert!(session.select("nextcloud:zz/last.jpg"));
        assert!(!session.select("nextcloud:missing.jpg"));

        session.set_remote_entries(NEXTCLOUD_SOURCE, Vec::new());
        session.refresh();
        assert_eq!(session.selected_id(), Some(local_id.as_str()));

        session.clear();
        assert!(session.images().is_empty());
        assert!(session.selected_id().is_none());
        assert_eq!(session.handles().live(), 0);
        assert_eq!(session.handles().issued(), session.handles().released());

        fs::remove_dir_all(&dir).ok();
    }
}
