//! Repository trait for the user table.

use async_trait::async_trait;

use crate::{Error, User};

/// Bulk access to the persistent user table.
///
/// The [`IdentityStore`](crate::IdentityStore) only ever reloads in full, so
/// a single bulk scan is the whole contract. Account creation and updates
/// happen through an external path.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Fetch every account record.
    async fn all(&self) -> Result<Vec<User>, Error>;
}
