use crate::file_index::FileIndex;
use crate::models::SourceLink;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// URL prefix under which the files directory is served.
pub const FILES_ROUTE: &str = "/files";

/// Card target for cited links that are neither local files nor safe relative paths.
pub const INERT_URL: &str = "#";

fn markdown_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"))
}

fn url_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme pattern"))
}

/// True for same-origin relative references, the only kind a card may link to as-is.
///
/// Browsers drop tabs, newlines and leading spaces before parsing a URL, so those are
/// stripped before looking for a scheme.
pub fn is_relative_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();

    if cleaned.starts_with("//") || cleaned.starts_with('\\') || cleaned.starts_with("/\\") {
        return false;
    }
    !url_scheme().is_match(&cleaned)
}

/// Finds document links in an answer and points them at local files when one matches.
///
/// Web links are left alone; they are not document references.
pub fn extract_source_links(text: &str, index: &FileIndex) -> Vec<SourceLink> {
    let mut links = Vec::new();

    for caps in markdown_link().captures_iter(text) {
        let link_text = &caps[1];
        let url = &caps[2];

        if url.starts_with("http://") || url.starts_with("https://") {
            continue;
        }

        let mut filename = Path::new(url)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !filename.contains('.') {
            filename = link_text.to_string();
        }
        let filename = match urlencoding::decode(&filename) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => filename.clone(),
        };

        let matched = index.best_match(&filename);
        let final_url = match matched {
            Some(file) => file_url(&file.relative_path),
            None if is_relative_url(url) => url.to_string(),
            None => {
                log::warn!("Dropping non-relative link target: {}", url);
                INERT_URL.to_string()
            }
        };

        links.push(SourceLink {
            filename: filename.split('.').next().unwrap_or_default().to_string(),
            url: final_url,
            original_link: caps[0].to_string(),
            text: link_text.to_string(),
            fuzzy_matched: matched.is_some(),
        });
    }

    if !links.is_empty() {
        log::info!("Found {} links to process", links.len());
    }
    links
}

/// Download URL for a path relative to the files directory.
pub fn file_url(relative_path: &str) -> String {
    let encoded: Vec<String> = relative_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", FILES_ROUTE, encoded.join("/"))
}
