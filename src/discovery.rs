//! Corpus enumeration.
//!
//! The corpus layout is `<root>/<collection>/claims/<type>/<file>.yml`
//! with an optional `<root>/<collection>/meta.yml` per collection. Full
//! runs enumerate everything, grouped by collection and type and sorted
//! for a deterministic target order; selective runs receive their file
//! list from the caller and never touch the directory tree.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;
use crate::record::RecordType;

/// Enumerates claim files and collections under a corpus root.
#[derive(Debug, Clone)]
pub struct CorpusDiscovery {
    root: PathBuf,
}

impl CorpusDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collection directories, sorted by name.
    pub async fn collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every claim file and collection meta file in the corpus.
    pub async fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for collection in self.collections().await? {
            let collection_dir = self.root.join(&collection);

            let meta = collection_dir.join("meta.yml");
            if fs::try_exists(&meta).await? {
                files.push(meta);
            }

            for ty in RecordType::CLAIMS {
                let type_dir = collection_dir.join("claims").join(ty.dir_name());
                if !fs::try_exists(&type_dir).await? {
                    continue;
                }
                let mut batch = Vec::new();
                let mut entries = fs::read_dir(&type_dir).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if entry.file_type().await?.is_file()
                        && path.extension().and_then(|e| e.to_str()) == Some("yml")
                    {
                        batch.push(path);
                    }
                }
                batch.sort();
                files.append(&mut batch);
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_corpus(root: &Path) {
        std::fs::create_dir_all(root.join("creatine/claims/effects")).unwrap();
        std::fs::create_dir_all(root.join("creatine/claims/cycles")).unwrap();
        std::fs::create_dir_all(root.join("ashwagandha/claims/effects")).unwrap();

        std::fs::write(root.join("creatine/meta.yml"), "name: creatine\n").unwrap();
        std::fs::write(
            root.join("creatine/claims/effects/b-effect.yml"),
            "effect: x\n",
        )
        .unwrap();
        std::fs::write(
            root.join("creatine/claims/effects/a-effect.yml"),
            "effect: y\n",
        )
        .unwrap();
        std::fs::write(root.join("creatine/claims/cycles/loading-8.yml"), "kind: loading\n")
            .unwrap();
        std::fs::write(
            root.join("ashwagandha/claims/effects/calm-up.yml"),
            "effect: z\n",
        )
        .unwrap();

        // Stray files the enumeration must ignore.
        std::fs::write(root.join("README.md"), "docs\n").unwrap();
        std::fs::write(root.join("creatine/claims/effects/notes.txt"), "ignore\n").unwrap();
    }

    #[tokio::test]
    async fn test_collections_sorted() {
        let temp = TempDir::new().unwrap();
        build_corpus(temp.path());

        let discovery = CorpusDiscovery::new(temp.path());
        let collections = discovery.collections().await.unwrap();
        assert_eq!(collections, vec!["ashwagandha", "creatine"]);
    }

    #[tokio::test]
    async fn test_discover_groups_and_sorts() {
        let temp = TempDir::new().unwrap();
        build_corpus(temp.path());

        let discovery = CorpusDiscovery::new(temp.path());
        let files = discovery.discover().await.unwrap();

        let relative: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(temp.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();

        assert_eq!(
            relative,
            vec![
                "ashwagandha/claims/effects/calm-up.yml",
                "creatine/meta.yml",
                "creatine/claims/effects/a-effect.yml",
                "creatine/claims/effects/b-effect.yml",
                "creatine/claims/cycles/loading-8.yml",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_root_errors() {
        let discovery = CorpusDiscovery::new("/nonexistent/corpus/path");
        assert!(discovery.discover().await.is_err());
    }
}
