use crate::errors::{AppError, AppResult};
use crate::models::{
    AcknowledgementSet, Alert, EventMarker, Note, NoteBook, Task, TaskStatus,
};
use chrono::Utc;
use uuid::Uuid;

/// User-generated follow-up state: tasks, keyed notes, calendar markers, and
/// the acknowledgement set. Mutations validate locally and never touch the
/// other collections.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    pub tasks: Vec<Task>,
    pub notes: NoteBook,
    pub events: Vec<EventMarker>,
    pub acknowledged: AcknowledgementSet,
}

impl AnnotationStore {
    pub fn create_task_from_alert(&mut self, alert: Alert) -> Task {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: format!("{} spike", alert.metric.as_str()),
            details: alert,
            status: TaskStatus::Open,
            created_at: Utc::now(),
        };
        self.tasks.insert(0, task.clone());
        task
    }

    pub fn toggle_task(&mut self, id: &str) -> AppResult<Task> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No task with id {id}")))?;
        task.status = match task.status {
            TaskStatus::Open => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Open,
        };
        Ok(task.clone())
    }

    pub fn remove_task(&mut self, id: &str) -> AppResult<Task> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No task with id {id}")))?;
        Ok(self.tasks.remove(index))
    }

    /// Idempotent: re-acknowledging an identity key is a no-op. Returns
    /// whether the key was newly inserted.
    pub fn acknowledge(&mut self, alert: &Alert) -> bool {
        self.acknowledged.insert(alert.identity_key())
    }

    pub fn add_note(&mut self, key: &str, text: &str) -> AppResult<Note> {
        if key.trim().is_empty() || text.trim().is_empty() {
            return Err(AppError::Validation(
                "Provide both a note key and note text".to_string(),
            ));
        }
        let note = Note {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            ts: Utc::now(),
        };
        self.notes
            .entry(key.to_string())
            .or_default()
            .push(note.clone());
        Ok(note)
    }

    pub fn add_event(&mut self, date: &str, label: &str) -> AppResult<EventMarker> {
        if date.trim().is_empty() || label.trim().is_empty() {
            return Err(AppError::Validation(
                "Select a date and add a label".to_string(),
            ));
        }
        let event = EventMarker {
            id: Uuid::new_v4().to_string(),
            date: date.to_string(),
            label: label.to_string(),
        };
        self.events.insert(0, event.clone());
        Ok(event)
    }

    pub fn remove_event(&mut self, id: &str) -> AppResult<EventMarker> {
        let index = self
            .events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No event with id {id}")))?;
        Ok(self.events.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::AnnotationStore;
    use crate::models::{Alert, MetricKind, TaskStatus};

    fn alert() -> Alert {
        Alert {
            date: "2025-03-01".to_string(),
            department: "Dyeing".to_string(),
            machine: "Machine 1".to_string(),
            metric: MetricKind::Energy,
            value: 200.0,
            message: "High energy usage".to_string(),
        }
    }

    #[test]
    fn task_ids_are_unique_under_rapid_creation() {
        let mut store = AnnotationStore::default();
        let first = store.create_task_from_alert(alert());
        let second = store.create_task_from_alert(alert());
        assert_ne!(first.id, second.id);
        assert_eq!(store.tasks.len(), 2);
        assert_eq!(first.title, "energy spike");
        assert_eq!(first.status, TaskStatus::Open);
    }

    #[test]
    fn toggle_flips_open_and_done() {
        let mut store = AnnotationStore::default();
        let task = store.create_task_from_alert(alert());
        assert_eq!(store.toggle_task(&task.id).expect("toggle").status, TaskStatus::Done);
        assert_eq!(store.toggle_task(&task.id).expect("toggle").status, TaskStatus::Open);
    }

    #[test]
    fn toggle_unknown_task_is_not_found() {
        let mut store = AnnotationStore::default();
        assert!(store.toggle_task("missing").is_err());
    }

    #[test]
    fn acknowledging_twice_changes_nothing() {
        let mut store = AnnotationStore::default();
        assert!(store.acknowledge(&alert()));
        let snapshot = store.acknowledged.clone();
        assert!(!store.acknowledge(&alert()));
        assert_eq!(store.acknowledged, snapshot);
    }

    #[test]
    fn notes_append_under_their_key() {
        let mut store = AnnotationStore::default();
        store.add_note("2025-03-01", "first").expect("note");
        store.add_note("2025-03-01", "second").expect("note");
        let notes = &store.notes["2025-03-01"];
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].text, "first");
        assert_eq!(notes[1].text, "second");
    }

    #[test]
    fn blank_note_input_is_rejected_without_mutation() {
        let mut store = AnnotationStore::default();
        assert!(store.add_note("  ", "text").is_err());
        assert!(store.add_note("key", "").is_err());
        assert!(store.notes.is_empty());
    }

    #[test]
    fn blank_event_input_is_rejected_without_mutation() {
        let mut store = AnnotationStore::default();
        assert!(store.add_event("", "Maintenance").is_err());
        assert!(store.add_event("2025-03-01", " ").is_err());
        assert!(store.events.is_empty());
    }

    #[test]
    fn events_add_and_remove_by_id() {
        let mut store = AnnotationStore::default();
        let event = store.add_event("2025-03-01", "Audit visit").expect("event");
        let removed = store.remove_event(&event.id).expect("remove");
        assert_eq!(removed.label, "Audit visit");
        assert!(store.events.is_empty());
        assert!(store.remove_event(&event.id).is_err());
    }
}
