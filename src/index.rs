//! Vault-wide link resolution index.
//!
//! [VaultIndex] is a reverse index over every markdown file in the vault:
//! which wikilinks each file contains, what they resolve to, and which files
//! point back at a given target. The engine only ever reads it; after a bulk
//! mutation callers rebuild via [VaultIndex::scan]. An operation started
//! against a slightly stale index fails soft ("reference not found") rather
//! than corrupting unrelated text.

use std::collections::{BTreeMap, BTreeSet};

use crate::{error::QualiError, link, link::Wikilink, store::TextStore};

#[derive(Debug, Clone, Default)]
pub struct VaultIndex {
    files: BTreeSet<String>,
    /// File stem (no folders, no extension) to every path carrying it.
    by_basename: BTreeMap<String, Vec<String>>,
    /// Target path to (source path, resolved-link count).
    backlinks: BTreeMap<String, BTreeMap<String, usize>>,
    /// Source path to its embed links.
    embeds: BTreeMap<String, Vec<Wikilink>>,
}

fn basename(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".md").unwrap_or(name)
}

impl VaultIndex {
    /// Builds the index by reading every markdown file through `store`.
    pub async fn scan(store: &dyn TextStore) -> Result<Self, QualiError> {
        let mut index = VaultIndex::default();
        for path in store.list().await? {
            index.files.insert(path.clone());
            index
                .by_basename
                .entry(basename(&path).to_string())
                .or_default()
                .push(path);
        }
        for path in index.files.clone() {
            let content = store.read(&path).await?;
            let links = link::parse_wikilinks(&content);
            for wikilink in &links {
                if let Some(target) = index.resolve_target(&wikilink.target) {
                    *index
                        .backlinks
                        .entry(target)
                        .or_default()
                        .entry(path.clone())
                        .or_default() += 1;
                }
            }
            let embeds: Vec<Wikilink> = links.into_iter().filter(|l| l.embed).collect();
            if !embeds.is_empty() {
                index.embeds.insert(path.clone(), embeds);
            }
        }
        tracing::debug!(
            "Indexed {} files, {} link targets",
            index.files.len(),
            index.backlinks.len()
        );
        Ok(index)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    fn resolve_target(&self, target: &str) -> Option<String> {
        // Exact vault path first, with and without extension.
        if self.files.contains(target) {
            return Some(target.to_string());
        }
        let with_ext = format!("{target}.md");
        if self.files.contains(&with_ext) {
            return Some(with_ext);
        }
        // Basename fallback: unique match wins, otherwise shortest path.
        // Literal text matching alone is unsafe under aliasing and renames,
        // which is why callers resolve through here instead.
        let candidates = self.by_basename.get(basename(target))?;
        candidates
            .iter()
            .min_by_key(|p| (p.len(), p.as_str()))
            .cloned()
    }

    /// Resolves raw wikilink text (alias and `#anchor` already split off by
    /// the parser) to a vault path, or None for a broken link.
    pub fn resolve_link(&self, _source_path: &str, link_text: &str) -> Option<String> {
        self.resolve_target(link_text.trim())
    }

    /// Files holding at least one resolved link to `path`, with counts.
    pub fn backlinks_of(&self, path: &str) -> Vec<(String, usize)> {
        self.backlinks
            .get(path)
            .map(|sources| sources.iter().map(|(p, n)| (p.clone(), *n)).collect())
            .unwrap_or_default()
    }

    /// Embed links contained in `path`.
    pub fn embeds_of(&self, path: &str) -> &[Wikilink] {
        self.embeds.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}
