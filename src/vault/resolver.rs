//! Link target resolution.
//!
//! Maps a link as written (`Note`, `folder/Note.md`, `Note#Heading`) to a
//! vault path. Lookup order: exact path, path with `.md` appended, the same
//! two relative to the source note's folder, then a basename match where the
//! shortest path wins.

use std::collections::{BTreeSet, HashMap};

use super::models::MD_EXTENSION;

/// Strip `#subpath` / `^block` suffixes from a link target.
pub fn link_path(link: &str) -> &str {
    let end = link.find(['#', '^']).unwrap_or(link.len());
    link[..end].trim()
}

/// Index of vault paths used to resolve link targets.
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    paths: BTreeSet<String>,
    /// Lowercased basename (with and without extension) → paths
    by_name: HashMap<String, Vec<String>>,
}

impl LinkResolver {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut resolver = Self::default();
        for path in paths {
            resolver.insert(path.into());
        }
        resolver
    }

    pub fn insert(&mut self, path: String) {
        let name = path.rsplit('/').next().unwrap_or(&path).to_lowercase();
        let mut keys = vec![name.clone()];
        if let Some((stem, _)) = name.rsplit_once('.') {
            if !stem.is_empty() {
                keys.push(stem.to_string());
            }
        }
        for key in keys {
            let entry = self.by_name.entry(key).or_default();
            if !entry.contains(&path) {
                entry.push(path.clone());
            }
        }
        self.paths.insert(path);
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Resolve `link` written in `source` to a vault path.
    pub fn resolve(&self, link: &str, source: &str) -> Option<String> {
        let target = link_path(link);
        if target.is_empty() {
            return None;
        }
        let target = target.trim_start_matches("./");

        for candidate in [target.to_string(), format!("{}.{}", target, MD_EXTENSION)] {
            if self.paths.contains(&candidate) {
                return Some(candidate);
            }
        }

        if let Some((folder, _)) = source.rsplit_once('/') {
            let relative = normalize_path(&format!("{}/{}", folder, target));
            for candidate in [relative.clone(), format!("{}.{}", relative, MD_EXTENSION)] {
                if self.paths.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }

        // Basename lookup; a partial path must still match the tail
        let name = target.rsplit('/').next().unwrap_or(target).to_lowercase();
        let suffix = target.to_lowercase();
        self.by_name
            .get(&name)?
            .iter()
            .filter(|p| {
                let lower = p.to_lowercase();
                !target.contains('/')
                    || lower.ends_with(&suffix)
                    || lower.ends_with(&format!("{}.{}", suffix, MD_EXTENSION))
            })
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .cloned()
    }
}

/// Collapse `.` and `..` segments.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}
