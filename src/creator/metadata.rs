//! Sidecar metadata resolution for media files.
//!
//! Content payloads come from JSON files living next to the media. Two
//! conventions exist:
//! - **Batch files** holding entries for many media files, keyed by media
//!   filename: `{lang}_prompt_results_*.json` and `*_{lang}_*.json`.
//! - **Single files** named after the media file:
//!   `{lang}_prompt_results_{base}.json`, `{base}_{lang}.json`,
//!   `{base}.{lang}.json`, `{base}-{lang}.json`, `{base}.json`.
//!
//! Batch patterns are tried first; a candidate only counts when the media
//! filename (with or without extension) maps to an object carrying both
//! `title` and `description`. Malformed JSON just disqualifies the
//! candidate. When nothing validates, a placeholder payload is synthesized
//! from the filename stem.

use crate::store::{ContentData, MediaType, now_ms};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve the content payload for a media file.
///
/// Never fails: falls back to a filename-derived placeholder when no
/// sidecar metadata validates.
pub fn resolve_content(media_path: &Path, language: &str) -> ContentData {
    match find_metadata(media_path, language) {
        Some((file, entry)) => {
            debug!("resolved metadata for {} from {}", media_path.display(), file.display());
            content_from_entry(media_path, language, &file, &entry)
        }
        None => ContentData::placeholder(&media_path.to_string_lossy(), language),
    }
}

/// Find a validating metadata file and the entry for this media file.
pub fn find_metadata(media_path: &Path, language: &str) -> Option<(PathBuf, Value)> {
    let dir = media_path.parent()?;
    let filename = media_path.file_name()?.to_string_lossy().to_string();
    let base = media_path.file_stem()?.to_string_lossy().to_string();

    // Batch-style glob patterns first.
    for pattern in [
        format!("{}_prompt_results_*.json", language),
        format!("*_{}_*.json", language),
    ] {
        let full = dir.join(&pattern).to_string_lossy().to_string();
        let Ok(paths) = glob::glob(&full) else { continue };
        let mut candidates: Vec<PathBuf> = paths.flatten().collect();
        candidates.sort();
        for candidate in candidates {
            if let Some(entry) = batch_entry(&candidate, &filename, &base) {
                return Some((candidate, entry));
            }
        }
    }

    // Single-file naming conventions, in priority order.
    for name in [
        format!("{}_prompt_results_{}.json", language, base),
        format!("{}_{}.json", base, language),
        format!("{}.{}.json", base, language),
        format!("{}-{}.json", base, language),
        format!("{}.json", base),
    ] {
        let candidate = dir.join(&name);
        if !candidate.is_file() {
            continue;
        }
        if let Some(entry) = single_entry(&candidate, &filename, &base) {
            return Some((candidate, entry));
        }
    }

    None
}

/// Check a batch file: the media filename (with or without extension) must
/// be a key whose value is an object holding both `title` and `description`.
fn batch_entry(path: &Path, filename: &str, base: &str) -> Option<Value> {
    let root = read_json(path)?;
    let map = root.as_object()?;
    for key in [filename, base] {
        if let Some(entry) = map.get(key)
            && is_valid_entry(entry)
        {
            return Some(entry.clone());
        }
    }
    None
}

/// Check a single file: either keyed like a batch file or a bare object
/// with `title` and `description` at the top level.
fn single_entry(path: &Path, filename: &str, base: &str) -> Option<Value> {
    let root = read_json(path)?;
    if is_valid_entry(&root) {
        return Some(root);
    }
    let map = root.as_object()?;
    for key in [filename, base] {
        if let Some(entry) = map.get(key)
            && is_valid_entry(entry)
        {
            return Some(entry.clone());
        }
    }
    None
}

fn is_valid_entry(entry: &Value) -> bool {
    entry
        .as_object()
        .map(|o| o.contains_key("title") && o.contains_key("description"))
        .unwrap_or(false)
}

fn read_json(path: &Path) -> Option<Value> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("skipping malformed metadata file {}: {}", path.display(), e);
            None
        }
    }
}

fn content_from_entry(media_path: &Path, language: &str, file: &Path, entry: &Value) -> ContentData {
    let title = entry.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string();
    let description = entry
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let hashtags = entry
        .get("hashtags")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    ContentData {
        title,
        description,
        hashtags,
        media_type: MediaType::from_path(&media_path.to_string_lossy()),
        language: language.to_string(),
        generated_at: now_ms(),
        metadata_path: Some(file.to_string_lossy().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_batch_file_keyed_by_filename() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "sunset.mp4", "");
        write(
            temp.path(),
            "en_prompt_results_batch1.json",
            r##"{"sunset.mp4": {"title": "Sunset", "description": "Golden hour", "hashtags": ["#sunset"]}}"##,
        );

        let content = resolve_content(&media, "en");
        assert_eq!(content.title, "Sunset");
        assert_eq!(content.description, "Golden hour");
        assert_eq!(content.hashtags, vec!["#sunset"]);
        assert_eq!(content.media_type, MediaType::Video);
        assert!(content.metadata_path.unwrap().ends_with("en_prompt_results_batch1.json"));
    }

    #[test]
    fn test_batch_file_keyed_by_stem() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "sunset.mp4", "");
        write(
            temp.path(),
            "batch_en_results.json",
            r#"{"sunset": {"title": "Sunset", "description": "Golden hour"}}"#,
        );

        let content = resolve_content(&media, "en");
        assert_eq!(content.title, "Sunset");
    }

    #[test]
    fn test_batch_entry_missing_description_is_rejected() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "sunset.mp4", "");
        write(
            temp.path(),
            "en_prompt_results_a.json",
            r#"{"sunset.mp4": {"title": "Sunset"}}"#,
        );

        let content = resolve_content(&media, "en");
        // Entry lacked description: placeholder wins
        assert_eq!(content.title, "sunset");
        assert!(content.metadata_path.is_none());
    }

    #[test]
    fn test_single_file_priority_order() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "clip.mp4", "");
        // Lower-priority convention present alongside a higher-priority one
        write(
            temp.path(),
            "clip.json",
            r#"{"title": "Generic", "description": "generic"}"#,
        );
        write(
            temp.path(),
            "clip_en.json",
            r#"{"title": "English", "description": "english"}"#,
        );

        let content = resolve_content(&media, "en");
        assert_eq!(content.title, "English");
    }

    #[test]
    fn test_single_file_dotted_and_dashed_conventions() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "clip.mp4", "");
        write(
            temp.path(),
            "clip.de.json",
            r#"{"title": "Deutsch", "description": "beschreibung"}"#,
        );

        let content = resolve_content(&media, "de");
        assert_eq!(content.title, "Deutsch");

        let media2 = write(temp.path(), "other.mp4", "");
        write(
            temp.path(),
            "other-de.json",
            r#"{"title": "Anders", "description": "text"}"#,
        );
        let content2 = resolve_content(&media2, "de");
        assert_eq!(content2.title, "Anders");
    }

    #[test]
    fn test_malformed_json_falls_through() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "clip.mp4", "");
        write(temp.path(), "en_prompt_results_bad.json", "{not json");
        write(
            temp.path(),
            "clip.json",
            r#"{"title": "Fallback", "description": "ok"}"#,
        );

        let content = resolve_content(&media, "en");
        assert_eq!(content.title, "Fallback");
    }

    #[test]
    fn test_placeholder_when_nothing_matches() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "mountain_view.jpg", "");

        let content = resolve_content(&media, "en");
        assert_eq!(content.title, "mountain view");
        assert!(content.description.is_empty());
        assert_eq!(content.media_type, MediaType::Image);
        assert!(content.metadata_path.is_none());
    }

    #[test]
    fn test_batch_preferred_over_single() {
        let temp = TempDir::new().unwrap();
        let media = write(temp.path(), "clip.mp4", "");
        write(
            temp.path(),
            "en_prompt_results_all.json",
            r#"{"clip.mp4": {"title": "Batch", "description": "from batch"}}"#,
        );
        write(
            temp.path(),
            "clip.json",
            r#"{"title": "Single", "description": "from single"}"#,
        );

        let content = resolve_content(&media, "en");
        assert_eq!(content.title, "Batch");
    }
}
