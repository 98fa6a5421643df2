//! Structural metadata extraction for markdown documents.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Chapter title used when a document carries no `# ` heading line.
pub const UNKNOWN_CHAPTER: &str = "Unknown Chapter";

/// Structural metadata derived from a document, enough to build a citation
/// without re-reading the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub relative_path: String,
    pub chapter: String,
    pub file_name: String,
}

/// Derives chapter and path metadata for one document.
///
/// The chapter is the text of the first line beginning with a single `#`
/// heading marker, falling back to [`UNKNOWN_CHAPTER`]. Extraction never
/// fails: a path that cannot be made relative to `root` degrades to the full
/// path with a logged diagnostic so one odd document never blocks a run.
pub fn extract(root: &Path, path: &Path, text: &str) -> DocumentMetadata {
    let relative_path = match path.strip_prefix(root) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => {
            warn!(
                path = %path.display(),
                root = %root.display(),
                "document path is not under the corpus root; using full path"
            );
            path.to_string_lossy().into_owned()
        }
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| relative_path.clone());

    let chapter = text
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_CHAPTER.to_string());

    DocumentMetadata {
        relative_path,
        chapter,
        file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn first_h1_becomes_chapter() {
        let root = PathBuf::from("/docs");
        let path = root.join("intro/chapter-one.md");
        let text = "---\nid: one\n---\n\n# Getting Started\n\nBody text.\n# Later Heading\n";
        let meta = extract(&root, &path, text);
        assert_eq!(meta.chapter, "Getting Started");
        assert_eq!(meta.relative_path, "intro/chapter-one.md");
        assert_eq!(meta.file_name, "chapter-one.md");
    }

    #[test]
    fn missing_heading_falls_back_to_sentinel() {
        let root = PathBuf::from("/docs");
        let path = root.join("notes.md");
        let meta = extract(&root, &path, "just prose, no headings\n");
        assert_eq!(meta.chapter, UNKNOWN_CHAPTER);
    }

    #[test]
    fn deeper_headings_are_not_chapters() {
        let root = PathBuf::from("/docs");
        let path = root.join("notes.md");
        let meta = extract(&root, &path, "## Subsection\n### Deeper\n");
        assert_eq!(meta.chapter, UNKNOWN_CHAPTER);
    }

    #[test]
    fn foreign_path_degrades_to_full_path() {
        let root = PathBuf::from("/docs");
        let path = PathBuf::from("/elsewhere/stray.md");
        let meta = extract(&root, &path, "# Stray\n");
        assert_eq!(meta.relative_path, "/elsewhere/stray.md");
        assert_eq!(meta.chapter, "Stray");
    }
}
