use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Minimum similarity (0-100) for a cited name to count as a local file.
pub const MATCH_THRESHOLD: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    /// Path relative to the files directory, `/`-separated.
    pub relative_path: String,
    pub stem: String,
    pub full_name: String,
}

/// Downloadable documents the assistant may cite by name.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    root: PathBuf,
    files: Vec<IndexedFile>,
}

impl FileIndex {
    pub fn scan(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();

        if !root.is_dir() {
            log::warn!("Files directory {} does not exist", root.display());
            return Self { root, files: Vec::new() };
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::error!("Error scanning files directory: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&root) else {
                continue;
            };
            let relative_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            files.push(IndexedFile {
                relative_path,
                stem: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default(),
                full_name: entry.file_name().to_string_lossy().to_string(),
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        if files.is_empty() {
            log::info!("No files found in {}", root.display());
        } else {
            log::info!("Indexed {} files in {}", files.len(), root.display());
        }

        Self { root, files }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[IndexedFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Best fuzzy match on the file stem, if it clears [`MATCH_THRESHOLD`].
    pub fn best_match(&self, filename: &str) -> Option<&IndexedFile> {
        let target = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());

        let mut best: Option<(&IndexedFile, u32)> = None;
        for file in &self.files {
            let score = similarity(&target, &file.stem);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((file, score));
            }
        }

        match best {
            Some((file, score)) if score > MATCH_THRESHOLD => {
                log::info!(
                    "Found fuzzy match for '{}': {} (score: {})",
                    filename,
                    file.relative_path,
                    score
                );
                Some(file)
            }
            Some((_, score)) => {
                log::info!("No good fuzzy match found for '{}' (best score: {})", filename, score);
                None
            }
            None => None,
        }
    }
}

/// Lowercases and turns every non-alphanumeric run into a single space.
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `2 * LCS / (len_a + len_b)` on chars, scaled to 0..=100.
fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }

    200.0 * prev[b.len()] as f64 / total as f64
}

fn str_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio(&a, &b)
}

/// Best ratio of the shorter string against every same-length window of the longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let mut best: f64 = 0.0;
    for window in long.windows(short.len()) {
        best = best.max(ratio(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort_ratio(a: &str, b: &str, partial: bool) -> f64 {
    let (a, b) = (sorted_tokens(a), sorted_tokens(b));
    if partial {
        partial_ratio(&a, &b)
    } else {
        str_ratio(&a, &b)
    }
}

fn token_set_ratio(a: &str, b: &str, partial: bool) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    if partial && !common.is_empty() {
        return 100.0;
    }

    let join = |words: Vec<&str>| words.join(" ");
    let sect = join(common);
    let with_rest = |rest: Vec<&str>| {
        let rest = join(rest);
        format!("{} {}", sect, rest).trim().to_string()
    };
    let combined_a = with_rest(set_a.difference(&set_b).copied().collect());
    let combined_b = with_rest(set_b.difference(&set_a).copied().collect());

    let score = |x: &str, y: &str| if partial { partial_ratio(x, y) } else { str_ratio(x, y) };
    let mut best = score(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best.max(score(&sect, &combined_a)).max(score(&sect, &combined_b));
    }
    best
}

/// Weighted similarity in 0..=100, scored like the usual `WRatio` heuristic.
///
/// Both sides are normalized first. When one string is at least 1.5 times
/// longer, partial (substring) scores are considered at a discount.
pub fn similarity(a: &str, b: &str) -> u32 {
    const UNBASE_SCALE: f64 = 0.95;

    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (len_a, len_b) = (a.chars().count() as f64, b.chars().count() as f64);
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);
    let base = str_ratio(&a, &b);

    let best = if len_ratio < 1.5 {
        base.max(token_sort_ratio(&a, &b, false) * UNBASE_SCALE)
            .max(token_set_ratio(&a, &b, false) * UNBASE_SCALE)
    } else {
        let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        base.max(partial_ratio(&a, &b) * partial_scale)
            .max(token_sort_ratio(&a, &b, true) * UNBASE_SCALE * partial_scale)
            .max(token_set_ratio(&a, &b, true) * UNBASE_SCALE * partial_scale)
    };

    best.round() as u32
}
