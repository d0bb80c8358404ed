//! Gather input files from CLI arguments.
//!
//! Explicit file paths are taken as given, whatever their extension, so the
//! batch report can name unsupported files. Directories are walked and
//! filtered by `ingest.include_globs` (matched against the path relative to
//! the directory).

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use doc_insights_core::models::SourceFile;

use crate::config::IngestConfig;

const DEFAULT_EXCLUDES: [&str; 3] = ["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Resolve `paths` to a sorted, de-duplicated list of files.
pub fn collect_paths(paths: &[PathBuf], config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&DEFAULT_EXCLUDES.map(String::from))?;

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            bail!("Input path does not exist: {}", root.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            found.push(path.to_path_buf());
        }
        // Sort for deterministic ordering
        found.sort();
        files.extend(found);
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

/// Read every collected file into memory.
pub fn load_sources(paths: &[PathBuf], config: &IngestConfig) -> Result<Vec<SourceFile>> {
    collect_paths(paths, config)?
        .iter()
        .map(|path| read_source(path))
        .collect()
}

pub fn read_source(path: &Path) -> Result<SourceFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile { filename, bytes })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn walks_directories_with_globs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("b.txt"), "b").unwrap();
        std::fs::write(root.join("sub/a.pdf"), "a").unwrap();
        std::fs::write(root.join("notes.md"), "skip").unwrap();
        std::fs::write(root.join(".git/c.txt"), "skip").unwrap();

        let files = collect_paths(&[root.to_path_buf()], &IngestConfig::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b.txt", "sub/a.pdf"]);
    }

    #[test]
    fn explicit_files_bypass_globs() {
        let tmp = TempDir::new().unwrap();
        let deck = tmp.path().join("deck.pptx");
        std::fs::write(&deck, "x").unwrap();

        let sources =
            load_sources(&[deck.clone(), deck.clone()], &IngestConfig::default()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].filename, "deck.pptx");
        assert_eq!(sources[0].bytes, b"x");
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = collect_paths(
            &[PathBuf::from("/no/such/dir/anywhere")],
            &IngestConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
