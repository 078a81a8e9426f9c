//! Nextcloud WebDAV access: PROPFIND multistatus parsing, the bounded
//! breadth-first image crawl, and authenticated file fetches for the proxy.

use crate::catalog::is_image_name;
use crate::config::NextcloudConfig;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::time::Duration;

/// Characters left alone by JavaScript's `encodeURIComponent`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const DAV_FILES_PREFIX: &str = "/remote.php/dav/files/";
const DAV_TIMEOUT_SECONDS: u64 = 12;
const PROPFIND_BODY: &str = r#"<?xml version="1.0"?>
<d:propfind xmlns:d="DAV:">
  <d:prop>
    <d:resourcetype />
    <d:getcontenttype />
  </d:prop>
</d:propfind>"#;

#[derive(Debug, thiserror::Error)]
pub enum DavError {
    #[error("Nextcloud request failed ({status}): {body}")]
    Upstream { status: u16, body: String },
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Transport(String),
}

/// One `<d:response>` block of a multistatus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResourceEntry {
    pub path: String,
    pub content_type: String,
    pub is_collection: bool,
}

impl DavResourceEntry {
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Issues depth-1 directory listings against the share.
pub trait DavTransport {
    /// Returns the raw multistatus XML for the immediate children of `dir`.
    fn list_directory(&self, dir: &str) -> impl Future<Output = Result<String, DavError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Href,
    ContentType,
}

#[derive(Default)]
struct PendingBlock {
    href: String,
    content_type: String,
    is_collection: bool,
}

/// Parses a multistatus body into resource records.
///
/// Only the `href`, `resourcetype` and `getcontenttype` properties are read;
/// namespace prefixes are ignored. A malformed or truncated body yields the
/// blocks that were complete before the damage.
pub fn parse_multistatus(xml: &str) -> Vec<DavResourceEntry> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut block: Option<PendingBlock> = None;
    let mut field: Option<Field> = None;
    let mut in_resourcetype = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => match element.local_name().as_ref() {
                b"response" => block = Some(PendingBlock::default()),
                b"href" => field = Some(Field::Href),
                b"getcontenttype" => field = Some(Field::ContentType),
                b"resourcetype" => in_resourcetype = true,
                b"collection" if in_resourcetype => mark_collection(&mut block),
                _ => {}
            },
            Ok(Event::Empty(element)) => {
                if in_resourcetype && element.local_name().as_ref() == b"collection" {
                    mark_collection(&mut block);
                }
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map(|value| value.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                append_field(&mut block, field, &value);
            }
            Ok(Event::CData(data)) => {
                let value = String::from_utf8_lossy(&data).into_owned();
                append_field(&mut block, field, &value);
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"response" => {
                    if let Some(done) = block.take() {
                        if let Some(entry) = finish_block(done) {
                            results.push(entry);
                        }
                    }
                }
                b"href" | b"getcontenttype" => field = None,
                b"resourcetype" => in_resourcetype = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                log::warn!(
                    "Stopped parsing multistatus body at byte {} after {} entries: {}",
                    reader.buffer_position(),
                    results.len(),
                    error
                );
                break;
            }
        }
    }

    results
}

fn mark_collection(block: &mut Option<PendingBlock>) {
    if let Some(block) = block.as_mut() {
        block.is_collection = true;
    }
}

fn append_field(block: &mut Option<PendingBlock>, field: Option<Field>, value: &str) {
    let (Some(block), Some(field)) = (block.as_mut(), field) else {
        return;
    };
    match field {
        Field::Href => block.href.push_str(value),
        Field::ContentType => block.content_type.push_str(value),
    }
}

fn finish_block(block: PendingBlock) -> Option<DavResourceEntry> {
    let href = block.href.trim();
    if href.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(href).decode_utf8_lossy();
    let path = extract_dav_relative_path(&decoded);
    if path.is_empty() {
        return None;
    }
    Some(DavResourceEntry {
        path,
        content_type: block.content_type.trim().to_ascii_lowercase(),
        is_collection: block.is_collection,
    })
}

/// Strips scheme/host, the DAV files prefix and the user segment from an href.
///
/// `https://host/remote.php/dav/files/ana/Photos/a.jpg` becomes `Photos/a.jpg`;
/// anything outside the files tree becomes an empty string.
pub fn extract_dav_relative_path(href: &str) -> String {
    let href_path = strip_origin(href);
    let Some(index) = href_path.find(DAV_FILES_PREFIX) else {
        return String::new();
    };
    let tail = &href_path[index + DAV_FILES_PREFIX.len()..];
    let Some((_, rest)) = tail.split_once('/') else {
        return String::new();
    };
    rest.trim_matches('/').to_string()
}

fn strip_origin(href: &str) -> &str {
    let lower = href.get(..8).map(str::to_ascii_lowercase).unwrap_or_default();
    let after_scheme = if lower.starts_with("https://") {
        &href[8..]
    } else if lower.starts_with("http://") {
        &href[7..]
    } else {
        return href;
    };
    match after_scheme.find('/') {
        Some(index) => &after_scheme[index..],
        None => "",
    }
}

fn normalize_dir(dir: &str) -> String {
    format!("/{}", dir.trim_matches('/'))
}

/// Breadth-first crawl for image files below `start_dir`.
///
/// Each directory is listed at most once. Collections are expanded while their
/// depth is below `max_depth`, and the crawl stops as soon as `max_images`
/// images were collected. Returned paths are relative to `start_dir`, in
/// discovery order. Any failed listing aborts the whole crawl.
pub async fn crawl_images<T: DavTransport>(
    transport: &T,
    start_dir: &str,
    max_images: usize,
    max_depth: usize,
) -> Result<Vec<DavResourceEntry>, DavError> {
    let root = normalize_dir(start_dir);
    let root_relative = root.trim_start_matches('/').to_string();
    let mut queue = VecDeque::from([(root.clone(), 0usize)]);
    let mut visited = HashSet::new();
    let mut images = Vec::new();

    while images.len() < max_images {
        let Some((dir, depth)) = queue.pop_front() else {
            break;
        };
        if !visited.insert(dir.clone()) {
            continue;
        }

        log::debug!("Listing {} at depth {}", dir, depth);
        let xml = transport.list_directory(&dir).await?;
        let own_path = dir.trim_start_matches('/');

        for entry in parse_multistatus(&xml) {
            if entry.path == own_path {
                continue;
            }

            if entry.is_collection {
                if depth < max_depth {
                    queue.push_back((normalize_dir(&entry.path), depth + 1));
                }
                continue;
            }

            if !entry.content_type.starts_with("image/") || !is_image_name(entry.name()) {
                continue;
            }

            let relative = relative_to_root(&entry.path, &root_relative);
            if relative.is_empty() {
                continue;
            }

            images.push(DavResourceEntry {
                path: relative,
                content_type: entry.content_type,
                is_collection: false,
            });
            if images.len() >= max_images {
                break;
            }
        }
    }

    Ok(images)
}

fn relative_to_root(path: &str, root_relative: &str) -> String {
    if root_relative.is_empty() {
        return path.trim_start_matches('/').to_string();
    }
    match path.strip_prefix(root_relative) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            rest.trim_start_matches('/').to_string()
        }
        _ => path.to_string(),
    }
}

/// Authenticated client for one Nextcloud account.
#[derive(Clone)]
pub struct NextcloudClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    root_dir: String,
}

impl NextcloudClient {
    pub fn new(config: &NextcloudConfig) -> Result<Self, DavError> {
        let credentials = BASE64_STANDARD.encode(format!(
            "{}:{}",
            config.username, config.app_password
        ));
        let mut auth = HeaderValue::from_str(&format!("Basic {}", credentials))
            .map_err(|error| DavError::Transport(format!("Invalid credentials: {}", error)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DAV_TIMEOUT_SECONDS))
            .default_headers(headers)
            .build()
            .map_err(|error| DavError::Transport(error.to_string()))?;

        Ok(NextcloudClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            root_dir: config.dir.clone(),
        })
    }

    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Builds the DAV URL for a path inside the user's files tree.
    pub fn dav_url(&self, raw_path: &str) -> String {
        build_dav_url(&self.base_url, &self.username, raw_path)
    }

    /// Fetches a file below the configured root; non-success statuses become
    /// [`DavError::Upstream`] carrying the server's body text.
    pub async fn fetch_file(&self, relative_path: &str) -> Result<reqwest::Response, DavError> {
        let url = self.dav_url(&format!("{}/{}", self.root_dir, relative_path));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| transport_error(&url, &error))?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        Ok(response)
    }
}

impl DavTransport for NextcloudClient {
    async fn list_directory(&self, dir: &str) -> Result<String, DavError> {
        let url = self.dav_url(dir);
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|error| DavError::Transport(error.to_string()))?;
        let response = self
            .client
            .request(method, &url)
            .header("Depth", "1")
            .header(CONTENT_TYPE, "application/xml")
            .body(PROPFIND_BODY)
            .send()
            .await
            .map_err(|error| transport_error(&url, &error))?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        response
            .text()
            .await
            .map_err(|error| transport_error(&url, &error))
    }
}

pub fn build_dav_url(base_url: &str, username: &str, raw_path: &str) -> String {
    let clean = raw_path.trim_start_matches('/');
    let encoded: Vec<String> = clean
        .split('/')
        .map(|part| utf8_percent_encode(part, URI_COMPONENT).to_string())
        .collect();
    format!(
        "{}{}{}/{}",
        base_url,
        DAV_FILES_PREFIX,
        utf8_percent_encode(username, URI_COMPONENT),
        encoded.join("/")
    )
}

async fn upstream_error(response: reqwest::Response) -> DavError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    DavError::Upstream { status, body }
}

fn transport_error(url: &str, error: &reqwest::Error) -> DavError {
    if error.is_timeout() {
        return DavError::Timeout(format!(
            "Nextcloud request timed out at {} after {} seconds",
            url, DAV_TIMEOUT_SECONDS
        ));
    }
    DavError::Transport(format!("Nextcloud transport error at {}: {}", url, error))
}
