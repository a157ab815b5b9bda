use std::sync::Arc;

use super::gate::SessionEvent;
use super::identity::Identity;
use crate::io::persist::{BackgroundPersister, Persister, SyncPersister};
use crate::io::store::SnapshotStore;
use crate::model::category::{Category, CategoryCollection};
use crate::model::ids::IdGenerator;
use crate::ops::stats::{self, Summary};
use crate::ops::task_ops::Direction;
use crate::ops::{category_ops, task_ops};

/// The live state of one signed-in session.
///
/// All reads and writes of the in-memory snapshot go through this value.
/// Each mutating method applies the operation to the snapshot first, then
/// hands the new snapshot to the persister. Methods return whether the
/// snapshot changed; invalid input and unknown ids return `false`.
pub struct Session {
    identity: Option<Identity>,
    categories: CategoryCollection,
    ids: IdGenerator,
    persister: Box<dyn Persister>,
}

impl Session {
    /// Start a session from whatever the store currently holds.
    pub fn open(
        identity: Option<Identity>,
        store: &dyn SnapshotStore,
        persister: Box<dyn Persister>,
    ) -> Self {
        let categories = store.load();
        Session::with_snapshot(identity, categories, persister)
    }

    pub fn with_snapshot(
        identity: Option<Identity>,
        categories: CategoryCollection,
        persister: Box<dyn Persister>,
    ) -> Self {
        let ids = IdGenerator::seeded(&categories);
        Session {
            identity,
            categories,
            ids,
            persister,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        category_ops::find_category(&self.categories, key)
    }

    /// Derived figures for the current snapshot.
    pub fn summary(&self) -> Summary {
        stats::summarize(&self.categories)
    }

    // -----------------------------------------------------------------------
    // Category operations
    // -----------------------------------------------------------------------

    /// Returns the new category's id when one was added.
    pub fn add_category(&mut self, name: &str, color: &str) -> Option<String> {
        let next = category_ops::add_category(&self.categories, name, color, &mut self.ids);
        if next.len() == self.categories.len() {
            return None;
        }
        let id = next.last().map(|c| c.id.clone());
        self.commit(next);
        id
    }

    pub fn update_category(&mut self, updated: Category) -> bool {
        let next = category_ops::update_category(&self.categories, updated);
        self.commit(next)
    }

    /// Remove a category. The caller must have confirmed with the user.
    /// Returns the removed category.
    pub fn delete_category(&mut self, category_id: &str) -> Option<Category> {
        let removed = self
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()?;
        let next = category_ops::delete_category(&self.categories, category_id);
        self.commit(next);
        Some(removed)
    }

    pub fn rename_category(&mut self, category_id: &str, name: &str) -> bool {
        self.update_with(category_id, |c, _| category_ops::rename_category(c, name))
    }

    pub fn recolor_category(&mut self, category_id: &str, color: &str) -> bool {
        self.update_with(category_id, |c, _| category_ops::recolor_category(c, color))
    }

    // -----------------------------------------------------------------------
    // Task operations
    // -----------------------------------------------------------------------

    /// Returns the new task's id when one was added.
    pub fn add_task(&mut self, category_id: &str, text: &str) -> Option<String> {
        let mut added = None;
        self.update_with(category_id, |c, ids| {
            let next = task_ops::add_task(c, text, ids);
            if next.tasks.len() > c.tasks.len() {
                added = next.tasks.last().map(|t| t.id.clone());
            }
            next
        });
        added
    }

    pub fn toggle_task(&mut self, category_id: &str, task_id: &str) -> bool {
        self.update_with(category_id, |c, _| task_ops::toggle_task(c, task_id))
    }

    pub fn delete_task(&mut self, category_id: &str, task_id: &str) -> bool {
        self.update_with(category_id, |c, _| task_ops::delete_task(c, task_id))
    }

    pub fn move_task(&mut self, category_id: &str, task_id: &str, direction: Direction) -> bool {
        self.update_with(category_id, |c, _| {
            task_ops::move_task(c, task_id, direction)
        })
    }

    pub fn edit_task(&mut self, category_id: &str, task_id: &str, text: &str) -> bool {
        self.update_with(category_id, |c, _| {
            task_ops::edit_task_text(c, task_id, text)
        })
    }

    /// Flush pending writes and drop the snapshot.
    pub fn close(mut self) {
        self.persister.flush();
        log::debug!("event=session_close module=session status=ok");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Apply a category-level transform and splice the result back.
    fn update_with(
        &mut self,
        category_id: &str,
        f: impl FnOnce(&Category, &mut IdGenerator) -> Category,
    ) -> bool {
        let Some(current) = self.categories.iter().find(|c| c.id == category_id) else {
            return false;
        };
        let updated = f(current, &mut self.ids);
        let next = category_ops::update_category(&self.categories, updated);
        self.commit(next)
    }

    /// Replace the snapshot, then persist it. Unchanged snapshots are not
    /// written, and an empty collection is never written over prior data.
    fn commit(&mut self, next: CategoryCollection) -> bool {
        if next == self.categories {
            return false;
        }
        self.categories = next;
        if self.categories.is_empty() {
            log::info!("event=snapshot_commit module=session status=skipped_empty");
        } else {
            self.persister.persist(&self.categories);
        }
        true
    }
}

/// How a host hands committed snapshots to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Write before the operation returns
    Immediate,
    /// Queue for a writer thread
    Background,
}

/// Owns at most one `Session` and follows sign-in/sign-out events.
pub struct SessionHost {
    store: Arc<dyn SnapshotStore>,
    mode: PersistMode,
    active: Option<Session>,
}

impl SessionHost {
    pub fn new(store: Arc<dyn SnapshotStore>, mode: PersistMode) -> Self {
        SessionHost {
            store,
            mode,
            active: None,
        }
    }

    /// Load a fresh snapshot for `identity`, replacing any active session.
    pub fn start(&mut self, identity: Option<Identity>) -> &mut Session {
        self.end();
        let persister: Box<dyn Persister> = match self.mode {
            PersistMode::Immediate => Box::new(SyncPersister::new(self.store.clone())),
            PersistMode::Background => Box::new(BackgroundPersister::spawn(self.store.clone())),
        };
        log::debug!("event=session_start module=session status=ok");
        self.active
            .insert(Session::open(identity, self.store.as_ref(), persister))
    }

    /// Discard the in-memory snapshot. The stored copy is left as is.
    pub fn end(&mut self) {
        if let Some(session) = self.active.take() {
            session.close();
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.active.as_mut()
    }

    pub fn handle_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::SignedIn(identity) => {
                self.start(Some(identity.clone()));
            }
            SessionEvent::SignedOut => self.end(),
        }
    }
}

impl Drop for SessionHost {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::{MemoryStore, StoreError};
    use crate::model::category::seed_categories;
    use crate::session::gate::{LocalSessionGate, SessionGate};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// A store whose writes always fail.
    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn slot(&self) -> &str {
            "broken"
        }
        fn read_slot(&self) -> Result<Option<CategoryCollection>, StoreError> {
            Err(StoreError::Unavailable("disk on fire".into()))
        }
        fn write_slot(&self, _: &[Category]) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk on fire".into()))
        }
    }

    /// A persister that drops everything.
    struct Discard;

    impl Persister for Discard {
        fn persist(&mut self, _: &[Category]) {}
    }

    fn memory_session(store: &MemoryStore) -> Session {
        Session::open(
            None,
            store,
            Box::new(SyncPersister::new(Arc::new(store.clone()))),
        )
    }

    #[test]
    fn test_first_open_sees_seed() {
        let store = MemoryStore::new("mem");
        let session = memory_session(&store);
        assert_eq!(session.categories(), seed_categories().as_slice());
        // Loading alone does not write
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_each_change_is_persisted() {
        let store = MemoryStore::new("mem");
        let mut session = memory_session(&store);

        let task_id = session.add_task("1", "Call client").unwrap();
        assert_eq!(store.write_count(), 1);
        assert!(session.toggle_task("1", &task_id));
        assert_eq!(store.write_count(), 2);

        let reloaded = store.load();
        assert_eq!(reloaded, session.categories());
        assert!(reloaded[0].tasks[0].completed);
    }

    #[test]
    fn test_noops_do_not_write() {
        let store = MemoryStore::new("mem");
        let mut session = memory_session(&store);

        assert_eq!(session.add_task("1", "   "), None);
        assert_eq!(session.add_task("missing", "x"), None);
        assert!(!session.toggle_task("1", "nope"));
        assert!(!session.move_task("1", "nope", Direction::Up));
        assert_eq!(session.add_category("", "#000000"), None);
        assert!(session.delete_category("nope").is_none());
        assert!(!session.rename_category("1", " "));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_new_ids_never_clash_with_loaded_ones() {
        let store = MemoryStore::new("mem");
        let mut far_future = seed_categories();
        far_future[0].id = "99999999999999".into();
        store.save(&far_future);

        let mut session = memory_session(&store);
        let id = session.add_category("Fitness", "#2ECC71").unwrap();
        assert!(id.parse::<i64>().unwrap() > 99_999_999_999_999);
    }

    #[test]
    fn test_in_memory_state_survives_failed_writes() {
        let mut session = Session::open(
            None,
            &BrokenStore,
            Box::new(SyncPersister::new(Arc::new(BrokenStore))),
        );
        // Unreadable store falls back to the seed
        assert_eq!(session.categories().len(), 6);

        let id = session.add_task("2", "Fix CRM").unwrap();
        assert!(session.toggle_task("2", &id));
        assert!(session.category("2").unwrap().tasks[0].completed);
    }

    #[test]
    fn test_in_memory_state_independent_of_dropped_writes() {
        let mut session = Session::with_snapshot(None, seed_categories(), Box::new(Discard));
        let a = session.add_task("5", "Read a chapter").unwrap();
        let b = session.add_task("5", "Take notes").unwrap();
        assert!(session.move_task("5", &b, Direction::Up));
        let order: Vec<_> = session
            .category("5")
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(session.summary().total, 2);
    }

    #[test]
    fn test_deleting_everything_keeps_last_snapshot() {
        let store = MemoryStore::new("mem");
        let mut session = memory_session(&store);
        let ids: Vec<String> = session.categories().iter().map(|c| c.id.clone()).collect();
        for id in &ids {
            assert!(session.delete_category(id).is_some());
        }
        assert!(session.categories().is_empty());
        // Five writes for five non-empty results; the empty one is skipped.
        assert_eq!(store.write_count(), 5);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_summary_tracks_changes() {
        let store = MemoryStore::new("mem");
        let mut session = memory_session(&store);
        assert_eq!(session.summary().percent, 0);
        let t1 = session.add_task("1", "a").unwrap();
        session.add_task("1", "b").unwrap();
        session.toggle_task("1", &t1);
        let summary = session.summary();
        assert_eq!((summary.completed, summary.total, summary.percent), (1, 2, 50));
    }

    #[test]
    fn test_rename_recolor_edit() {
        let store = MemoryStore::new("mem");
        let mut session = memory_session(&store);
        assert!(session.rename_category("3", "Web"));
        assert!(session.recolor_category("3", "#000000"));
        let id = session.add_task("3", "Landing page").unwrap();
        assert!(session.edit_task("3", &id, "Landing page v2"));
        let cat = session.category("3").unwrap();
        assert_eq!((cat.name.as_str(), cat.color.as_str()), ("Web", "#000000"));
        assert_eq!(cat.tasks[0].text, "Landing page v2");
    }

    #[test]
    fn test_update_category_replaces_by_id() {
        let store = MemoryStore::new("mem");
        let mut session = memory_session(&store);
        let mut replacement = session.category("4").unwrap().clone();
        replacement.name = "AI".into();
        assert!(session.update_category(replacement.clone()));
        assert!(!session.update_category(replacement));

        let stray = Category::new("nope".into(), "Ghost", "#000000");
        assert!(!session.update_category(stray));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_host_follows_gate_events() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new("mem");
        let host = Rc::new(RefCell::new(SessionHost::new(
            Arc::new(store.clone()),
            PersistMode::Immediate,
        )));

        let mut gate = LocalSessionGate::open(tmp.path());
        let listener = host.clone();
        gate.on_session_change(Box::new(move |e: &SessionEvent| {
            listener.borrow_mut().handle_event(e)
        }));

        assert!(host.borrow().session().is_none());
        gate.sign_up("Ada", "ada@example.com", "secret1").unwrap();
        {
            let mut h = host.borrow_mut();
            let session = h.session_mut().unwrap();
            assert_eq!(session.identity().unwrap().email, "ada@example.com");
            session.add_task("6", "Gym").unwrap();
        }

        gate.sign_out().unwrap();
        assert!(host.borrow().session().is_none());
        // Stored copy survives sign-out
        assert_eq!(store.load()[5].tasks.len(), 1);

        gate.sign_in("ada@example.com", "secret1").unwrap();
        let h = host.borrow();
        assert_eq!(h.session().unwrap().category("6").unwrap().tasks[0].text, "Gym");
    }

    #[test]
    fn test_background_host_flushes_on_end() {
        let store = MemoryStore::new("mem");
        let mut host = SessionHost::new(Arc::new(store.clone()), PersistMode::Background);
        let session = host.start(None);
        for i in 0..10 {
            session.add_task("4", &format!("step {}", i));
        }
        host.end();
        assert_eq!(store.load()[3].tasks.len(), 10);
    }
}
