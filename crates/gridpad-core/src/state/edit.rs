use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::position::CellPosition;
use crate::store::CellStore;

/// State of the in-place cell editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditSession {
    #[default]
    Idle,
    Editing { position: CellPosition, draft: String },
}

impl EditSession {
    pub fn new() -> Self {
        Self::Idle
    }

    /// Open the editor on `position`, replacing any session in progress.
    /// Returns the replaced session's position and draft, if any.
    pub fn start(
        &mut self,
        position: CellPosition,
        initial: impl Into<String>,
    ) -> Option<(CellPosition, String)> {
        let previous = std::mem::replace(
            self,
            EditSession::Editing {
                position,
                draft: initial.into(),
            },
        );
        match previous {
            EditSession::Idle => None,
            EditSession::Editing { position, draft } => Some((position, draft)),
        }
    }

    pub fn update_draft(&mut self, value: impl Into<String>) -> Result<()> {
        match self {
            EditSession::Idle => Err(GridError::NotEditing),
            EditSession::Editing { draft, .. } => {
                *draft = value.into();
                Ok(())
            }
        }
    }

    /// Close the editor and write the draft to `store`.
    ///
    /// An empty draft over a cell that holds no value is dropped so that
    /// opening and closing the editor on empty space leaves no record behind.
    /// Returns the position written, `None` if nothing was written.
    pub fn commit(&mut self, store: &mut CellStore) -> Option<CellPosition> {
        let EditSession::Editing { position, draft } = std::mem::take(self) else {
            return None;
        };
        write_draft(store, position, draft)
    }

    /// Close the editor without writing. Returns the discarded draft.
    pub fn cancel(&mut self) -> Option<String> {
        match std::mem::take(self) {
            EditSession::Idle => None,
            EditSession::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing { .. })
    }

    pub fn is_editing_at(&self, pos: CellPosition) -> bool {
        self.position() == Some(pos)
    }

    pub fn position(&self) -> Option<CellPosition> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { position, .. } => Some(*position),
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { draft, .. } => Some(draft),
        }
    }
}

/// Store a confirmed draft, skipping empty drafts over value-less cells
pub(crate) fn write_draft(
    store: &mut CellStore,
    position: CellPosition,
    draft: String,
) -> Option<CellPosition> {
    if draft.is_empty() && store.get(position.row, position.col).is_none() {
        return None;
    }
    store.set(position.row, position.col, draft);
    Some(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let session = EditSession::default();
        assert_eq!(session, EditSession::Idle);
        assert!(!session.is_editing());
        assert_eq!(session.position(), None);
        assert_eq!(session.draft(), None);
    }

    #[test]
    fn test_start_editing() {
        let mut session = EditSession::new();
        let pos = CellPosition::new(3, 5);
        assert_eq!(session.start(pos, "initial"), None);

        assert!(session.is_editing());
        assert!(session.is_editing_at(pos));
        assert!(!session.is_editing_at(CellPosition::new(3, 6)));
        assert_eq!(session.draft(), Some("initial"));
    }

    #[test]
    fn test_update_draft() {
        let mut session = EditSession::new();
        session.start(CellPosition::origin(), "old");
        session.update_draft("new").unwrap();
        assert_eq!(session.draft(), Some("new"));
    }

    #[test]
    fn test_update_draft_while_idle() {
        let mut session = EditSession::new();
        let err = session.update_draft("new").unwrap_err();
        assert!(matches!(err, GridError::NotEditing));
        assert_eq!(session, EditSession::Idle);
    }

    #[test]
    fn test_commit_writes_draft() {
        let mut store = CellStore::new();
        let mut session = EditSession::new();
        let pos = CellPosition::new(5, 10);
        session.start(pos, "");
        session.update_draft("typed").unwrap();

        assert_eq!(session.commit(&mut store), Some(pos));
        assert_eq!(store.get(5, 10), Some("typed"));
        assert!(!session.is_editing());
    }

    #[test]
    fn test_commit_empty_draft_on_empty_cell_is_discarded() {
        let mut store = CellStore::new();
        let mut session = EditSession::new();
        session.start(CellPosition::new(2, 2), "");

        assert_eq!(session.commit(&mut store), None);
        assert!(!store.has_record(2, 2));
        assert!(!session.is_editing());
    }

    #[test]
    fn test_commit_empty_draft_overwrites_existing_value() {
        let mut store = CellStore::new();
        store.set(2, 2, "keep?");
        let mut session = EditSession::new();
        session.start(CellPosition::new(2, 2), "keep?");
        session.update_draft("").unwrap();

        assert_eq!(session.commit(&mut store), Some(CellPosition::new(2, 2)));
        assert_eq!(store.get(2, 2), Some(""));
    }

    #[test]
    fn test_commit_while_idle() {
        let mut store = CellStore::new();
        let mut session = EditSession::new();
        assert_eq!(session.commit(&mut store), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_cancel_discards() {
        let mut store = CellStore::new();
        store.set(0, 0, "original");
        let mut session = EditSession::new();
        session.start(CellPosition::origin(), "original");
        session.update_draft("modified").unwrap();

        assert_eq!(session.cancel(), Some("modified".to_string()));
        assert!(!session.is_editing());
        assert_eq!(store.get(0, 0), Some("original"));
        assert_eq!(session.cancel(), None);
    }

    #[test]
    fn test_start_elsewhere_replaces_session() {
        let mut session = EditSession::new();
        session.start(CellPosition::new(0, 0), "");
        session.update_draft("lost").unwrap();

        let replaced = session.start(CellPosition::new(1, 1), "b");

        assert_eq!(replaced, Some((CellPosition::new(0, 0), "lost".to_string())));
        assert!(session.is_editing_at(CellPosition::new(1, 1)));
        assert_eq!(session.draft(), Some("b"));
    }

    #[test]
    fn test_serialization() {
        let mut session = EditSession::new();
        session.start(CellPosition::new(5, 10), "test content");

        let serialized = serde_json::to_string(&session).unwrap();
        let deserialized: EditSession = serde_json::from_str(&serialized).unwrap();
        assert_eq!(session, deserialized);
    }
}
