//! Attachment slots for file-bearing form fields
//!
//! A slot keeps the references the server already stores (`existing`) apart
//! from the local files picked during this session (`staged`). Removing an
//! existing reference records a deletion marker; removing a staged file
//! leaves no trace, since nothing was ever persisted for it.

use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by attachment bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentError {
    #[error("operation requires a single-file slot")]
    NotSingle,
    #[error("operation requires a multi-file slot")]
    NotMulti,
    #[error("no attachment at position {index} (slot holds {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("attachment at position {0} is already stored; its description is read-only")]
    StoredEntry(usize),
}

/// A file chosen locally and not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Session-local identity; two picks of the same path stay distinct
    pub id: Uuid,
    pub path: PathBuf,
    pub name: String,
    pub description: String,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: Uuid::new_v4(),
            path,
            name,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An opaque reference to a file the server already stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub url: String,
    pub description: String,
}

impl RemoteRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: String::new(),
        }
    }

    /// Read a stored reference from a record value.
    ///
    /// Accepts a bare URL string or an object carrying `file` (or `url`)
    /// and an optional `description`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) if !url.is_empty() => Some(Self::new(url.clone())),
            Value::Object(map) => {
                let url = map
                    .get("file")
                    .or_else(|| map.get("url"))
                    .and_then(Value::as_str)
                    .filter(|u| !u.is_empty())?;
                let description = map
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(Self {
                    url: url.to_string(),
                    description: description.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// One item of a slot's combined display sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentEntry<'a> {
    Existing(&'a RemoteRef),
    Staged(&'a LocalFile),
}

impl AttachmentEntry<'_> {
    pub fn display_name(&self) -> &str {
        match self {
            AttachmentEntry::Existing(remote) => remote
                .url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or(&remote.url),
            AttachmentEntry::Staged(file) => &file.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            AttachmentEntry::Existing(remote) => &remote.description,
            AttachmentEntry::Staged(file) => &file.description,
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self, AttachmentEntry::Staged(_))
    }
}

/// What `remove_at` took out of a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovedAttachment {
    Existing(RemoteRef),
    Staged(LocalFile),
}

/// Deletion request sent alongside a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionMarker {
    /// Single-file field: drop the stored file
    Flag,
    /// Multi-file field: drop exactly these stored files
    Urls(Vec<String>),
}

/// Single-file slot state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleSlot {
    baseline: Option<RemoteRef>,
    existing: Option<RemoteRef>,
    staged: Option<LocalFile>,
    marked_for_deletion: bool,
}

/// Multi-file slot state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSlot {
    baseline: Vec<RemoteRef>,
    existing: Vec<RemoteRef>,
    staged: Vec<LocalFile>,
    deleted: Vec<RemoteRef>,
}

/// Lifecycle container for one file-bearing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSlot {
    Single(SingleSlot),
    Multi(MultiSlot),
}

impl AttachmentSlot {
    /// Single-file slot, optionally seeded with the stored reference
    pub fn single(existing: Option<RemoteRef>) -> Self {
        AttachmentSlot::Single(SingleSlot {
            baseline: existing.clone(),
            existing,
            staged: None,
            marked_for_deletion: false,
        })
    }

    /// Multi-file slot seeded with the stored references, in server order
    pub fn multi(existing: Vec<RemoteRef>) -> Self {
        AttachmentSlot::Multi(MultiSlot {
            baseline: existing.clone(),
            existing,
            staged: Vec::new(),
            deleted: Vec::new(),
        })
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, AttachmentSlot::Multi(_))
    }

    /// Replace the staged file of a single-file slot.
    ///
    /// The stored reference is left alone; the server reconciles it at submit.
    pub fn set_single(&mut self, file: LocalFile) -> Result<(), AttachmentError> {
        match self {
            AttachmentSlot::Single(slot) => {
                slot.staged = Some(file);
                Ok(())
            }
            AttachmentSlot::Multi(_) => Err(AttachmentError::NotSingle),
        }
    }

    /// Append local files to a multi-file slot, keeping pick order.
    pub fn add_many(
        &mut self,
        files: impl IntoIterator<Item = LocalFile>,
    ) -> Result<(), AttachmentError> {
        match self {
            AttachmentSlot::Multi(slot) => {
                slot.staged.extend(files);
                Ok(())
            }
            AttachmentSlot::Single(_) => Err(AttachmentError::NotMulti),
        }
    }

    /// Remove an item by its position in the combined sequence
    /// (`existing` first, then `staged`).
    pub fn remove_at(&mut self, index: usize) -> Result<RemovedAttachment, AttachmentError> {
        let len = self.len();
        if index >= len {
            return Err(AttachmentError::OutOfRange { index, len });
        }
        match self {
            AttachmentSlot::Single(slot) => match (index, slot.existing.is_some()) {
                (0, true) => {
                    let removed = slot.existing.take().ok_or(AttachmentError::OutOfRange {
                        index,
                        len,
                    })?;
                    slot.marked_for_deletion = true;
                    Ok(RemovedAttachment::Existing(removed))
                }
                _ => slot
                    .staged
                    .take()
                    .map(RemovedAttachment::Staged)
                    .ok_or(AttachmentError::OutOfRange { index, len }),
            },
            AttachmentSlot::Multi(slot) => {
                if index < slot.existing.len() {
                    let removed = slot.existing.remove(index);
                    slot.deleted.push(removed.clone());
                    Ok(RemovedAttachment::Existing(removed))
                } else {
                    let removed = slot.staged.remove(index - slot.existing.len());
                    Ok(RemovedAttachment::Staged(removed))
                }
            }
        }
    }

    /// Set the description of a staged entry in the combined sequence.
    ///
    /// Stored references keep the description the server holds.
    pub fn set_description(
        &mut self,
        index: usize,
        description: impl Into<String>,
    ) -> Result<(), AttachmentError> {
        let len = self.len();
        match self.combined().get(index) {
            None => return Err(AttachmentError::OutOfRange { index, len }),
            Some(AttachmentEntry::Existing(_)) => return Err(AttachmentError::StoredEntry(index)),
            Some(AttachmentEntry::Staged(_)) => {}
        }
        let staged = match self {
            AttachmentSlot::Single(slot) => slot.staged.as_mut(),
            AttachmentSlot::Multi(slot) => {
                let offset = index - slot.existing.len();
                slot.staged.get_mut(offset)
            }
        };
        let staged = staged.ok_or(AttachmentError::OutOfRange { index, len })?;
        staged.description = description.into();
        Ok(())
    }

    /// Combined display sequence: existing references, then staged files
    pub fn combined(&self) -> Vec<AttachmentEntry<'_>> {
        match self {
            AttachmentSlot::Single(slot) => slot
                .existing
                .iter()
                .map(AttachmentEntry::Existing)
                .chain(slot.staged.iter().map(AttachmentEntry::Staged))
                .collect(),
            AttachmentSlot::Multi(slot) => slot
                .existing
                .iter()
                .map(AttachmentEntry::Existing)
                .chain(slot.staged.iter().map(AttachmentEntry::Staged))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttachmentSlot::Single(slot) => {
                usize::from(slot.existing.is_some()) + usize::from(slot.staged.is_some())
            }
            AttachmentSlot::Multi(slot) => slot.existing.len() + slot.staged.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Files to upload at submit time
    pub fn staged_files(&self) -> Vec<&LocalFile> {
        match self {
            AttachmentSlot::Single(slot) => slot.staged.iter().collect(),
            AttachmentSlot::Multi(slot) => slot.staged.iter().collect(),
        }
    }

    /// The deletion request this slot contributes, if any
    pub fn deletion_marker(&self) -> Option<DeletionMarker> {
        match self {
            AttachmentSlot::Single(slot) if slot.marked_for_deletion => Some(DeletionMarker::Flag),
            AttachmentSlot::Single(_) => None,
            AttachmentSlot::Multi(slot) if slot.deleted.is_empty() => None,
            AttachmentSlot::Multi(slot) => Some(DeletionMarker::Urls(
                slot.deleted.iter().map(|r| r.url.clone()).collect(),
            )),
        }
    }

    /// Find a deletion that does not trace back to a stored reference.
    ///
    /// Returns the offending URL. A well-used slot never has one.
    pub fn integrity_breach(&self) -> Option<&str> {
        match self {
            AttachmentSlot::Single(slot) => match (&slot.baseline, slot.marked_for_deletion) {
                (None, true) => Some("<no stored file>"),
                (Some(stored), true) if slot.existing.is_some() => Some(stored.url.as_str()),
                _ => None,
            },
            AttachmentSlot::Multi(slot) => slot
                .deleted
                .iter()
                .find(|gone| {
                    !slot.baseline.iter().any(|b| b.url == gone.url)
                        || slot.existing.iter().any(|e| e.url == gone.url)
                })
                .map(|gone| gone.url.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn refs(urls: &[&str]) -> Vec<RemoteRef> {
        urls.iter().map(|u| RemoteRef::new(*u)).collect()
    }

    mod single {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_set_single_keeps_existing() {
            let mut slot = AttachmentSlot::single(Some(RemoteRef::new("https://x/titre.pdf")));
            slot.set_single(LocalFile::new("/tmp/nouveau.pdf")).unwrap();

            let names: Vec<_> = slot
                .combined()
                .iter()
                .map(|e| e.display_name().to_string())
                .collect();
            assert_eq!(names, vec!["titre.pdf", "nouveau.pdf"]);
            assert!(slot.deletion_marker().is_none());
        }

        #[test]
        fn test_set_single_replaces_staged() {
            let mut slot = AttachmentSlot::single(None);
            slot.set_single(LocalFile::new("/tmp/a.pdf")).unwrap();
            slot.set_single(LocalFile::new("/tmp/b.pdf")).unwrap();
            assert_eq!(slot.len(), 1);
            assert_eq!(slot.staged_files()[0].name, "b.pdf");
        }

        #[test]
        fn test_removing_existing_marks_deletion() {
            let mut slot = AttachmentSlot::single(Some(RemoteRef::new("https://x/plan.png")));
            let removed = slot.remove_at(0).unwrap();
            assert_eq!(removed, RemovedAttachment::Existing(RemoteRef::new("https://x/plan.png")));
            assert!(slot.is_empty());
            assert_eq!(slot.deletion_marker(), Some(DeletionMarker::Flag));
        }

        #[test]
        fn test_removing_staged_leaves_no_marker() {
            let mut slot = AttachmentSlot::single(Some(RemoteRef::new("https://x/plan.png")));
            slot.set_single(LocalFile::new("/tmp/plan2.png")).unwrap();
            let removed = slot.remove_at(1).unwrap();
            assert!(matches!(removed, RemovedAttachment::Staged(_)));
            assert!(slot.deletion_marker().is_none());
            assert_eq!(slot.len(), 1);
        }

        #[test]
        fn test_add_many_rejected() {
            let mut slot = AttachmentSlot::single(None);
            let err = slot.add_many(vec![LocalFile::new("/tmp/a")]).unwrap_err();
            assert_eq!(err, AttachmentError::NotMulti);
        }
    }

    mod multi {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_add_many_keeps_order_and_duplicates() {
            let mut slot = AttachmentSlot::multi(vec![]);
            slot.add_many(vec![LocalFile::new("/a/scan.pdf"), LocalFile::new("/b/scan.pdf")])
                .unwrap();
            slot.add_many(vec![LocalFile::new("/c/other.pdf")]).unwrap();

            let staged = slot.staged_files();
            assert_eq!(staged.len(), 3);
            assert_eq!(staged[0].path, PathBuf::from("/a/scan.pdf"));
            assert_eq!(staged[1].path, PathBuf::from("/b/scan.pdf"));
            assert_ne!(staged[0].id, staged[1].id);
        }

        #[test]
        fn test_remove_existing_then_add() {
            let mut slot = AttachmentSlot::multi(refs(&["https://x/a.pdf", "https://x/b.pdf"]));
            slot.remove_at(0).unwrap();
            slot.add_many(vec![LocalFile::new("/tmp/c.pdf")]).unwrap();

            let combined = slot.combined();
            assert_eq!(combined.len(), 2);
            assert_eq!(combined[0], AttachmentEntry::Existing(&RemoteRef::new("https://x/b.pdf")));
            assert!(combined[1].is_staged());
            assert_eq!(
                slot.deletion_marker(),
                Some(DeletionMarker::Urls(vec!["https://x/a.pdf".to_string()]))
            );
        }

        #[test]
        fn test_removed_url_never_resurfaces() {
            let mut slot = AttachmentSlot::multi(refs(&[
                "https://x/a.pdf",
                "https://x/b.pdf",
                "https://x/c.pdf",
            ]));
            slot.remove_at(1).unwrap();
            let shown: Vec<_> = slot
                .combined()
                .iter()
                .map(|e| e.display_name().to_string())
                .collect();
            assert_eq!(shown, vec!["a.pdf", "c.pdf"]);
            match slot.deletion_marker() {
                Some(DeletionMarker::Urls(urls)) => {
                    assert_eq!(urls.iter().filter(|u| *u == "https://x/b.pdf").count(), 1)
                }
                other => panic!("unexpected marker {other:?}"),
            }
        }

        #[test]
        fn test_remove_staged_index_after_existing() {
            let mut slot = AttachmentSlot::multi(refs(&["https://x/a.pdf"]));
            slot.add_many(vec![LocalFile::new("/tmp/b.pdf"), LocalFile::new("/tmp/c.pdf")])
                .unwrap();
            let removed = slot.remove_at(1).unwrap();
            match removed {
                RemovedAttachment::Staged(file) => assert_eq!(file.name, "b.pdf"),
                other => panic!("expected staged file, got {other:?}"),
            }
            assert!(slot.deletion_marker().is_none());
        }

        #[test]
        fn test_remove_out_of_range() {
            let mut slot = AttachmentSlot::multi(refs(&["https://x/a.pdf"]));
            assert_eq!(
                slot.remove_at(3).unwrap_err(),
                AttachmentError::OutOfRange { index: 3, len: 1 }
            );
        }

        #[test]
        fn test_set_description_on_staged() {
            let mut slot = AttachmentSlot::multi(refs(&["https://x/a.jpg"]));
            slot.add_many(vec![LocalFile::new("/tmp/b.jpg")]).unwrap();
            slot.set_description(1, "Vue de la borne nord").unwrap();
            assert_eq!(slot.staged_files()[0].description, "Vue de la borne nord");
        }

        #[test]
        fn test_stored_description_is_read_only() {
            let mut slot = AttachmentSlot::multi(refs(&["https://x/a.jpg"]));
            assert_eq!(
                slot.set_description(0, "Nouvelle légende").unwrap_err(),
                AttachmentError::StoredEntry(0)
            );
            assert_eq!(slot.combined()[0].description(), "");
        }

        #[test]
        fn test_integrity_holds_for_normal_use() {
            let mut slot = AttachmentSlot::multi(refs(&["https://x/a.pdf", "https://x/b.pdf"]));
            slot.remove_at(0).unwrap();
            slot.remove_at(0).unwrap();
            assert!(slot.integrity_breach().is_none());
        }

        #[test]
        fn test_integrity_breach_detected() {
            let slot = AttachmentSlot::Multi(MultiSlot {
                baseline: refs(&["https://x/a.pdf"]),
                existing: refs(&["https://x/a.pdf"]),
                staged: vec![],
                deleted: refs(&["https://x/ghost.pdf"]),
            });
            assert_eq!(slot.integrity_breach(), Some("https://x/ghost.pdf"));
        }
    }

    mod remote_ref {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_from_string() {
            assert_eq!(
                RemoteRef::from_value(&json!("https://x/a.pdf")),
                Some(RemoteRef::new("https://x/a.pdf"))
            );
        }

        #[test]
        fn test_from_object_with_description() {
            let parsed = RemoteRef::from_value(&json!({
                "file": "https://x/photo.jpg",
                "description": "Borne"
            }))
            .unwrap();
            assert_eq!(parsed.url, "https://x/photo.jpg");
            assert_eq!(parsed.description, "Borne");
        }

        #[test]
        fn test_rejects_empty_and_other_shapes() {
            assert!(RemoteRef::from_value(&json!("")).is_none());
            assert!(RemoteRef::from_value(&json!(42)).is_none());
            assert!(RemoteRef::from_value(&json!({"description": "x"})).is_none());
        }
    }
}
