//! Version bookkeeping: recording superseded content, paging history,
//! comparing snapshots and preparing restores.
//!
//! Every accepted content change appends exactly one [`Version`] holding the
//! state being replaced, numbered with the document's `current_version`
//! before it is incremented. That keeps `current_version - 1 == versions.len()`
//! after every committed write.

use crate::diff::word_diff;
use chrono::{DateTime, Utc};
use coedit_core::prelude::*;
use coedit_store::compute_hash;
use serde::{Deserialize, Serialize};

/// A requested change to a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub change_type: ChangeType,
    pub summary: String,
    pub is_auto_save: bool,
}

impl EditRequest {
    /// Replace the content
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Rename only
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_change_type(mut self, change_type: ChangeType) -> Self {
        self.change_type = change_type;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Mark as an autosave (always a minor change)
    pub fn auto_save(mut self) -> Self {
        self.is_auto_save = true;
        self.change_type = ChangeType::Minor;
        self
    }
}

/// What an edit did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// New content accepted, one version recorded
    ContentChanged,
    /// Only the title changed; history untouched
    TitleOnly,
    /// Nothing differed from the stored document
    Unchanged,
}

/// Mutation applied in memory, before persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedEdit {
    pub kind: EditKind,
    pub title_changed: bool,
    /// Number of the version record created for the superseded content
    pub recorded_version: Option<u64>,
}

/// A page of history, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPage {
    pub versions: Vec<Version>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_more: bool,
}

/// Two snapshots and the word diff between them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub v1: Version,
    pub v2: Version,
    pub diff: VersionDiff,
}

/// Version operations over a single document
pub struct VersionManager;

impl VersionManager {
    /// Apply `request` to `document` in place.
    ///
    /// A version is recorded only when the content actually differs; a
    /// title-only edit renames without touching history.
    pub fn apply(
        document: &mut Document,
        editor: &UserRef,
        request: &EditRequest,
        now: DateTime<Utc>,
    ) -> AppliedEdit {
        let title_changed = match &request.title {
            Some(title) if *title != document.title => {
                document.title = title.clone();
                true
            }
            _ => false,
        };

        let recorded_version = match &request.content {
            Some(content) if *content != document.content => {
                Some(Self::supersede(document, editor, content, request, now))
            }
            _ => None,
        };

        let kind = match (recorded_version, title_changed) {
            (Some(_), _) => EditKind::ContentChanged,
            (None, true) => EditKind::TitleOnly,
            (None, false) => EditKind::Unchanged,
        };
        if kind != EditKind::Unchanged {
            document.updated_at = now;
        }

        AppliedEdit {
            kind,
            title_changed,
            recorded_version,
        }
    }

    /// Retire the current content into a version record and install the new
    /// content. Returns the recorded version number.
    fn supersede(
        document: &mut Document,
        editor: &UserRef,
        new_content: &str,
        request: &EditRequest,
        now: DateTime<Utc>,
    ) -> u64 {
        let previous = std::mem::replace(&mut document.content, new_content.to_string());
        let previous_stats = DocumentStats::from_content(&previous);
        let version_number = document.current_version;

        document.versions.push(Version {
            version_number,
            content_hash: compute_hash(&previous),
            diff: word_diff(&previous, new_content),
            content: previous,
            edited_by: editor.clone(),
            edited_at: now,
            change_type: request.change_type,
            changes: request.summary.clone(),
            is_auto_save: request.is_auto_save,
            word_count: previous_stats.word_count,
            character_count: previous_stats.character_count,
        });
        document.current_version += 1;
        document.stats = DocumentStats::from_content(&document.content);

        version_number
    }

    /// Page through history sorted by version number, newest first.
    /// Pages are 1-based; `page_size` is clamped to `max_page_size`.
    pub fn page(
        document: &Document,
        page: usize,
        page_size: usize,
        max_page_size: usize,
    ) -> Result<VersionPage> {
        if page == 0 {
            return Err(Error::validation_error("page numbers start at 1"));
        }
        if page_size == 0 {
            return Err(Error::validation_error("page_size must be positive"));
        }

        let page_size = page_size.min(max_page_size);
        let total = document.versions.len();
        let start = (page - 1).saturating_mul(page_size);

        let mut ordered: Vec<&Version> = document.versions.iter().collect();
        ordered.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        let versions: Vec<Version> = ordered
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Ok(VersionPage {
            has_more: start.saturating_add(versions.len()) < total,
            versions,
            page,
            page_size,
            total,
        })
    }

    pub fn get(document: &Document, version_number: u64) -> Result<Version> {
        document
            .version(version_number)
            .cloned()
            .ok_or_else(|| Error::version_not_found(&document.id, version_number))
    }

    /// Compare two recorded versions. The live content is not a version.
    pub fn compare(document: &Document, v1: u64, v2: u64) -> Result<VersionComparison> {
        let first = Self::get(document, v1)?;
        let second = Self::get(document, v2)?;
        let diff = word_diff(&first.content, &second.content);
        Ok(VersionComparison {
            v1: first,
            v2: second,
            diff,
        })
    }

    /// Build the edit that brings a historic version's content back.
    pub fn restore_request(
        document: &Document,
        version_number: u64,
        note: Option<&str>,
    ) -> Result<EditRequest> {
        let target = document
            .version(version_number)
            .ok_or_else(|| Error::version_not_found(&document.id, version_number))?;

        let summary = match note {
            Some(note) if !note.trim().is_empty() => note.to_string(),
            _ => format!("Restored to version {}", version_number),
        };

        Ok(EditRequest::content(target.content.clone())
            .with_change_type(ChangeType::Major)
            .with_summary(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn editor() -> UserRef {
        UserRef::new("a", "Alice")
    }

    fn doc(content: &str) -> Document {
        Document::with_id(DocumentId::from("d"), "Title", content, t0())
    }

    #[test]
    fn test_scenario_single_edit() {
        let mut d = doc("a b c");
        let applied = VersionManager::apply(&mut d, &editor(), &EditRequest::content("a b d"), t0());

        assert_eq!(applied.kind, EditKind::ContentChanged);
        assert_eq!(applied.recorded_version, Some(1));
        assert_eq!(d.current_version, 2);
        assert_eq!(d.content, "a b d");

        let v1 = &d.versions[0];
        assert_eq!(v1.version_number, 1);
        assert_eq!(v1.content, "a b c");
        assert_eq!(v1.diff.added, vec!["d"]);
        assert_eq!(v1.diff.removed, vec!["c"]);
        assert_eq!(v1.word_count, 3);
        assert_eq!(v1.character_count, 5);
        assert_eq!(v1.content_hash, compute_hash("a b c"));
        d.check_invariants().unwrap();
    }

    #[test]
    fn test_unchanged_content_records_nothing() {
        let mut d = doc("same");
        let request = EditRequest::content("same").auto_save();
        let applied = VersionManager::apply(&mut d, &editor(), &request, t0());

        assert_eq!(applied.kind, EditKind::Unchanged);
        assert_eq!(d.current_version, 1);
        assert!(d.versions.is_empty());
    }

    #[test]
    fn test_title_only_edit_leaves_history() {
        let mut d = doc("body");
        let applied = VersionManager::apply(&mut d, &editor(), &EditRequest::title("New"), t0());

        assert_eq!(applied.kind, EditKind::TitleOnly);
        assert_eq!(d.title, "New");
        assert_eq!(d.current_version, 1);
        assert!(d.versions.is_empty());
    }

    #[test]
    fn test_title_and_content_together() {
        let mut d = doc("body");
        let request = EditRequest::content("new body").with_title("Renamed");
        let applied = VersionManager::apply(&mut d, &editor(), &request, t0());

        assert_eq!(applied.kind, EditKind::ContentChanged);
        assert!(applied.title_changed);
        assert_eq!(d.title, "Renamed");
    }

    #[test]
    fn test_empty_content_is_accepted() {
        let mut d = doc("x y");
        VersionManager::apply(&mut d, &editor(), &EditRequest::content(""), t0());

        assert_eq!(d.stats.word_count, 0);
        assert_eq!(d.versions[0].diff.removed, vec!["x", "y"]);
        assert!(d.versions[0].diff.added.is_empty());
    }

    #[test]
    fn test_metadata_is_recorded() {
        let mut d = doc("one");
        let request = EditRequest::content("two")
            .with_change_type(ChangeType::Patch)
            .with_summary("typo");
        VersionManager::apply(&mut d, &editor(), &request, t0());

        let v = &d.versions[0];
        assert_eq!(v.change_type, ChangeType::Patch);
        assert_eq!(v.changes, "typo");
        assert_eq!(v.edited_by, editor());
        assert_eq!(v.edited_at, t0());
        assert!(!v.is_auto_save);
    }

    fn doc_with_versions(n: usize) -> Document {
        let mut d = doc("v0");
        for i in 1..=n {
            VersionManager::apply(&mut d, &editor(), &EditRequest::content(format!("v{}", i)), t0());
        }
        d
    }

    #[test]
    fn test_paging_newest_first() {
        let d = doc_with_versions(5);

        let first = VersionManager::page(&d, 1, 2, 100).unwrap();
        let numbers: Vec<u64> = first.versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![5, 4]);
        assert_eq!(first.total, 5);
        assert!(first.has_more);

        let last = VersionManager::page(&d, 3, 2, 100).unwrap();
        assert_eq!(last.versions.len(), 1);
        assert_eq!(last.versions[0].version_number, 1);
        assert!(!last.has_more);

        let beyond = VersionManager::page(&d, 9, 2, 100).unwrap();
        assert!(beyond.versions.is_empty());
        assert!(!beyond.has_more);
    }

    #[test]
    fn test_paging_validation_and_clamp() {
        let d = doc_with_versions(3);
        assert!(VersionManager::page(&d, 0, 10, 100).is_err());
        assert!(VersionManager::page(&d, 1, 0, 100).is_err());

        let clamped = VersionManager::page(&d, 1, 50, 2).unwrap();
        assert_eq!(clamped.page_size, 2);
        assert_eq!(clamped.versions.len(), 2);
    }

    #[test]
    fn test_compare_matches_recorded_diff() {
        let mut d = doc("a b c");
        VersionManager::apply(&mut d, &editor(), &EditRequest::content("a b d"), t0());
        VersionManager::apply(&mut d, &editor(), &EditRequest::content("z b d"), t0());

        let cmp = VersionManager::compare(&d, 1, 2).unwrap();
        assert_eq!(cmp.v1.content, "a b c");
        assert_eq!(cmp.v2.content, "a b d");
        assert_eq!(cmp.diff, d.versions[0].diff);
    }

    #[test]
    fn test_compare_missing_version() {
        let d = doc_with_versions(1);
        let err = VersionManager::compare(&d, 1, 2).unwrap_err();
        assert!(matches!(err, Error::VersionNotFound { version: 2, .. }));
    }

    #[test]
    fn test_restore_request() {
        let d = doc_with_versions(3);
        let request = VersionManager::restore_request(&d, 2, None).unwrap();
        assert_eq!(request.content.as_deref(), Some("v1"));
        assert_eq!(request.change_type, ChangeType::Major);
        assert_eq!(request.summary, "Restored to version 2");

        let noted = VersionManager::restore_request(&d, 2, Some("rollback")).unwrap();
        assert_eq!(noted.summary, "rollback");

        assert!(VersionManager::restore_request(&d, 42, None).is_err());
    }

    proptest! {
        #[test]
        fn prop_invariant_holds_after_any_edit_sequence(
            edits in prop::collection::vec(
                (prop::option::of("[ab ]{0,6}"), prop::option::of("[xy]{1,3}")),
                0..30,
            )
        ) {
            let mut d = doc("");
            for (content, title) in edits {
                let request = EditRequest { content, title, ..EditRequest::default() };
                let before = d.current_version;
                let applied = VersionManager::apply(&mut d, &editor(), &request, t0());
                let expected = if applied.kind == EditKind::ContentChanged { before + 1 } else { before };
                prop_assert_eq!(d.current_version, expected);
                prop_assert!(d.check_invariants().is_ok());
            }
        }
    }
}
