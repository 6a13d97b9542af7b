//! A workspace bound to a persistence adapter
//!
//! Mutations run against a copy of the current state. Only when the
//! mutation succeeds and the copy has been saved does it become the current
//! state, so readers holding an older snapshot keep a consistent view.

use std::sync::Arc;
use tracing::debug;

use crate::store::Persistence;
use crate::{Config, Result, Workspace};

pub struct Session<P: Persistence> {
    state: Arc<Workspace>,
    store: P,
}

impl<P: Persistence> Session<P> {
    /// Load the workspace from `store` and apply the config.
    ///
    /// When `init_templates` is set the template board is (re)created and
    /// the result saved if that changed anything.
    pub fn open(mut store: P, config: &Config) -> Result<Self> {
        let mut workspace = store.load()?.unwrap_or_default();
        workspace.set_actor(&config.actor);
        workspace.set_board_prefix(&config.id_prefix);
        if config.init_templates && workspace.initialize_template_boards() {
            store.save(&workspace)?;
        }
        Ok(Self {
            state: Arc::new(workspace),
            store,
        })
    }

    /// Current state, shared; never changes underneath the caller
    pub fn snapshot(&self) -> Arc<Workspace> {
        Arc::clone(&self.state)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.state
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Apply one mutation, save, and commit.
    ///
    /// On any error the current state is left as it was.
    pub fn mutate<T>(&mut self, f: impl FnOnce(&mut Workspace) -> Result<T>) -> Result<T> {
        let mut next = Workspace::clone(&self.state);
        let out = f(&mut next)?;
        self.store.save(&next)?;
        self.state = Arc::new(next);
        debug!("mutation committed");
        Ok(out)
    }

    /// Replace the whole state, e.g. after a remote change notification.
    ///
    /// A workspace that breaks any invariant is rejected.
    pub fn replace(&mut self, mut workspace: Workspace) -> Result<()> {
        workspace.validate()?;
        workspace.set_actor(self.state.actor());
        workspace.set_board_prefix(self.state.board_prefix());
        self.store.save(&workspace)?;
        self.state = Arc::new(workspace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::{Error, TEMPLATE_BOARD_ID};
    use std::cell::Cell;

    /// Store whose saves can be switched to fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: Cell<bool>,
    }

    impl Persistence for FlakyStore {
        fn load(&self) -> Result<Option<Workspace>> {
            self.inner.load()
        }

        fn save(&mut self, workspace: &Workspace) -> Result<()> {
            if self.fail.get() {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(workspace)
        }
    }

    fn config() -> Config {
        Config {
            actor: "ana".into(),
            ..Config::default()
        }
    }

    #[test]
    fn test_open_initializes_template_once() {
        let session = Session::open(MemoryStore::new(), &config()).unwrap();
        assert_eq!(session.workspace().template_id(), Some(TEMPLATE_BOARD_ID));
        assert_eq!(session.store().saves(), 1);

        let store = session.store().clone();
        let session = Session::open(store, &config()).unwrap();
        assert_eq!(session.store().saves(), 1);
    }

    #[test]
    fn test_open_without_templates() {
        let config = Config {
            init_templates: false,
            ..config()
        };
        let session = Session::open(MemoryStore::new(), &config).unwrap();
        assert!(session.workspace().board_order().is_empty());
        assert_eq!(session.store().saves(), 0);
    }

    #[test]
    fn test_mutate_commits_and_saves() {
        let mut session = Session::open(MemoryStore::new(), &config()).unwrap();
        let before = session.snapshot();

        let board = session.mutate(|ws| Ok(ws.create_board("Campaign"))).unwrap();
        let card = session
            .mutate(|ws| ws.add_card(&board, "ideas", "Draft copy"))
            .unwrap();

        assert!(before.board(&board).is_none());
        let card = session.workspace().card(&board, &card).unwrap();
        assert_eq!(card.comments[0].author, "ana");
        assert_eq!(session.store().saves(), 3);

        let reloaded = session.store().load().unwrap().unwrap();
        assert!(reloaded.board(&board).is_some());
    }

    #[test]
    fn test_failed_mutation_leaves_state() {
        let mut session = Session::open(MemoryStore::new(), &config()).unwrap();
        let board = session.mutate(|ws| Ok(ws.create_board("Campaign"))).unwrap();
        let before = session.snapshot();
        let saves = session.store().saves();

        let result = session.mutate(|ws| {
            ws.add_card(&board, "ideas", "Draft copy")?;
            ws.add_card(&board, "nope", "Broken")
        });

        assert!(matches!(result, Err(Error::ListNotFound(_))));
        assert_eq!(*session.snapshot(), *before);
        assert_eq!(session.store().saves(), saves);
    }

    #[test]
    fn test_replace_keeps_actor() {
        let mut session = Session::open(MemoryStore::new(), &config()).unwrap();
        let mut remote = Workspace::new();
        let board = remote.create_board("Remote");

        session.replace(remote).unwrap();

        assert_eq!(session.workspace().actor(), "ana");
        assert!(session.workspace().board(&board).is_some());
    }

    #[test]
    fn test_failed_save_leaves_state() {
        let mut session = Session::open(FlakyStore::default(), &config()).unwrap();
        let before = session.snapshot();
        session.store().fail.set(true);

        let result = session.mutate(|ws| Ok(ws.create_board("Campaign")));

        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(*session.snapshot(), *before);
        assert_eq!(session.store().inner.saves(), 1);

        session.store().fail.set(false);
        let board = session.mutate(|ws| Ok(ws.create_board("Campaign"))).unwrap();
        assert!(session.workspace().board(&board).is_some());
    }

    #[test]
    fn test_replace_rejects_inconsistent_workspace() {
        let mut session = Session::open(MemoryStore::new(), &config()).unwrap();
        let before = session.snapshot();

        let mut remote = Workspace::new();
        let board = remote.create_board("Remote");
        let mut doc = serde_json::to_value(&remote).unwrap();
        doc["boards"][&board]["lists"]["ideas"]["position"] = serde_json::json!(7);
        let remote: Workspace = serde_json::from_value(doc).unwrap();

        assert!(matches!(session.replace(remote), Err(Error::Invariant { .. })));
        assert_eq!(*session.snapshot(), *before);
    }

    #[test]
    fn test_open_applies_id_prefix() {
        let config = Config {
            id_prefix: "acme".into(),
            ..config()
        };
        let mut session = Session::open(MemoryStore::new(), &config).unwrap();
        let board = session.mutate(|ws| Ok(ws.create_board("Campaign"))).unwrap();
        assert!(board.starts_with("acme-"));
        assert_eq!(session.workspace().board_prefix(), "acme");
    }
}
