//! In-memory snapshot of the user table.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{Error, User, UserId, repositories::UserRepository};

#[derive(Default)]
struct Snapshot {
    by_id: HashMap<UserId, User>,
    by_login: HashMap<String, UserId>,
}

/// In-memory snapshot of all user accounts, keyed by id and by login name.
///
/// The snapshot only changes through [`IdentityStore::load_all`], which
/// replaces both lookup indices inside one exclusive region; a lookup never
/// observes a half-applied reload. There are no incremental updates: an
/// account change made through an external path requires a full reload to
/// become visible.
pub struct IdentityStore {
    snapshot: RwLock<Snapshot>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    /// Replace the whole snapshot from the persistent user table.
    ///
    /// The bulk scan runs before the lock is taken; a storage fault leaves
    /// the previous snapshot intact.
    ///
    /// # Returns
    ///
    /// The number of accounts loaded.
    pub async fn load_all<R: UserRepository>(&self, repo: &R) -> Result<usize, Error> {
        let users = repo.all().await?;

        let mut fresh = Snapshot {
            by_id: HashMap::with_capacity(users.len()),
            by_login: HashMap::with_capacity(users.len()),
        };
        for user in users {
            fresh.by_login.insert(user.login.clone(), user.id);
            fresh.by_id.insert(user.id, user);
        }
        let count = fresh.by_id.len();

        *self.write() = fresh;
        tracing::debug!(count, "Reloaded identity store snapshot");
        Ok(count)
    }

    /// Look up an account by id.
    pub fn by_id(&self, id: UserId) -> Option<User> {
        self.read().by_id.get(&id).cloned()
    }

    /// Look up an account by login name.
    pub fn by_login(&self, login: &str) -> Option<User> {
        let snapshot = self.read();
        let id = snapshot.by_login.get(login)?;
        snapshot.by_id.get(id).cloned()
    }

    /// Number of accounts in the current snapshot.
    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}
