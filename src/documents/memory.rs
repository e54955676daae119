use super::{
    NotesStore, SavedNote, SubTodoUpdate, TodoCard, TodoStore, Whiteboard, WhiteboardElement,
    WhiteboardStore,
};
use crate::session::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

/// Process-local backing for every workspace document. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    whiteboard: RwLock<Option<Whiteboard>>,
    /// Newest first.
    cards: RwLock<Vec<TodoCard>>,
    /// Newest first.
    notes: RwLock<Vec<SavedNote>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `edit` to one card and return its new state.
    async fn edit_card<F>(&self, card_id: &str, edit: F) -> Result<TodoCard, StoreError>
    where
        F: FnOnce(&mut TodoCard) -> Result<(), StoreError> + Send,
    {
        let mut cards = self.cards.write().await;
        let card = cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| card_not_found(card_id))?;
        edit(&mut *card)?;
        Ok(card.clone())
    }
}

fn card_not_found(card_id: &str) -> StoreError {
    StoreError::NotFound(format!("todo card {}", card_id))
}

#[async_trait]
impl WhiteboardStore for InMemoryDocumentStore {
    async fn load_whiteboard(&self) -> Result<Whiteboard, StoreError> {
        let mut guard = self.whiteboard.write().await;
        Ok(guard.get_or_insert_with(|| Whiteboard::new(Vec::new())).clone())
    }

    async fn save_whiteboard(&self, elements: Vec<WhiteboardElement>) -> Result<Whiteboard, StoreError> {
        let mut guard = self.whiteboard.write().await;
        let board = match guard.as_mut() {
            Some(board) => {
                board.elements = elements;
                board.updated_at = Utc::now();
                board.clone()
            }
            None => {
                let board = Whiteboard::new(elements);
                *guard = Some(board.clone());
                board
            }
        };
        Ok(board)
    }

    async fn clear_whiteboard(&self) -> Result<usize, StoreError> {
        let mut guard = self.whiteboard.write().await;
        Ok(match guard.as_mut() {
            Some(board) => {
                let removed = board.elements.len();
                board.elements.clear();
                board.updated_at = Utc::now();
                removed
            }
            None => 0,
        })
    }
}

#[async_trait]
impl TodoStore for InMemoryDocumentStore {
    async fn list_cards(&self) -> Result<Vec<TodoCard>, StoreError> {
        Ok(self.cards.read().await.clone())
    }

    async fn create_card(&self, title: &str) -> Result<TodoCard, StoreError> {
        let card = TodoCard::new(title);
        self.cards.write().await.insert(0, card.clone());
        Ok(card)
    }

    async fn rename_card(&self, card_id: &str, title: &str) -> Result<TodoCard, StoreError> {
        let title = title.to_string();
        self.edit_card(card_id, move |card| {
            card.title = title;
            card.updated_at = Utc::now();
            Ok(())
        })
        .await
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), StoreError> {
        let mut cards = self.cards.write().await;
        let before = cards.len();
        cards.retain(|c| c.id != card_id);
        if cards.len() == before {
            return Err(card_not_found(card_id));
        }
        Ok(())
    }

    async fn add_sub_todo(&self, card_id: &str, text: &str) -> Result<TodoCard, StoreError> {
        let text = text.to_string();
        self.edit_card(card_id, move |card| {
            card.add_sub_todo(text);
            Ok(())
        })
        .await
    }

    async fn update_sub_todo(
        &self,
        card_id: &str,
        sub_id: &str,
        update: SubTodoUpdate,
    ) -> Result<TodoCard, StoreError> {
        self.edit_card(card_id, |card| card.update_sub_todo(sub_id, &update))
            .await
    }

    async fn delete_sub_todo(&self, card_id: &str, sub_id: &str) -> Result<TodoCard, StoreError> {
        self.edit_card(card_id, |card| card.remove_sub_todo(sub_id))
            .await
    }
}

#[async_trait]
impl NotesStore for InMemoryDocumentStore {
    async fn list_notes(&self) -> Result<Vec<SavedNote>, StoreError> {
        Ok(self.notes.read().await.clone())
    }

    async fn save_note(&self, note: SavedNote) -> Result<SavedNote, StoreError> {
        self.notes.write().await.insert(0, note.clone());
        Ok(note)
    }

    async fn delete_note(&self, note_id: &str) -> Result<(), StoreError> {
        let mut notes = self.notes.write().await;
        let before = notes.len();
        notes.retain(|n| n.id != note_id);
        if notes.len() == before {
            return Err(StoreError::NotFound(format!("note {}", note_id)));
        }
        Ok(())
    }
}
