pub mod local;
pub mod remote;
pub mod storage;


use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::{Playlist, Song};

pub use local::LocalPlaylistStore;
pub use remote::RemotePlaylistStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

/// The authoritative playlist collection.
///
/// Every operation returns the full collection as it stands afterwards, so
/// callers replace their view wholesale instead of patching it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// All playlists visible to the token holder
    async fn list_playlists(&self, token: &str) -> StoreResult<Vec<Playlist>>;

    /// Insert `songs` at the front of the playlist, keeping their order.
    /// Nothing is deduplicated.
    async fn add_songs(
        &self,
        token: &str,
        playlist_id: &str,
        songs: &[Song],
    ) -> StoreResult<Vec<Playlist>>;

    /// Optional capability: backends without it return the collection unchanged
    async fn create_playlist(&self, token: &str, name: &str) -> StoreResult<Vec<Playlist>>;
}

/// Reject empty tokens before any I/O happens. Tokens are opaque otherwise.
pub(crate) fn require_token(token: &str) -> StoreResult<()> {
    if token.is_empty() {
        return Err(StoreError::Unauthorized);
    }
    Ok(())
}

/// Songs first, then whatever the playlist already held
pub(crate) fn prepend_songs(playlist: &mut Playlist, songs: &[Song]) {
    playlist.songs.splice(0..0, songs.iter().cloned());
}
