use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::storage::KeyValueStorage;
use super::{PlaylistStore, prepend_songs, require_token};
use crate::error::{StoreError, StoreResult};
use crate::models::{Playlist, PlaylistType, Song};

/// Storage key holding the whole collection. Bump the suffix to start over.
pub const DB_KEY: &str = "playlists_db_v1";

/// Delay applied before every operation unless configured otherwise
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(600);

/// Playlist store backed by one JSON document in key-value storage.
///
/// Each operation reads the full document, changes it in memory and writes
/// it back. There is no locking: two writers sharing the same storage will
/// overwrite each other's changes.
pub struct LocalPlaylistStore<S: KeyValueStorage> {
    storage: S,
    latency: Duration,
}

impl<S: KeyValueStorage> LocalPlaylistStore<S> {
    pub fn new(storage: S) -> Self {
        LocalPlaylistStore {
            storage,
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Read the document, seeding and persisting it on first access
    fn load(&self) -> StoreResult<Vec<Playlist>> {
        match self.storage.get(DB_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StoreError::Storage(format!("Corrupt playlist document: {e}"))),
            None => {
                info!("No playlist document found, seeding initial data");
                let seed = seed_playlists();
                self.save(&seed)?;
                Ok(seed)
            }
        }
    }

    fn save(&self, playlists: &[Playlist]) -> StoreResult<()> {
        let raw = serde_json::to_string(playlists)
            .map_err(|e| StoreError::Storage(format!("Failed to encode playlists: {e}")))?;
        self.storage.set(DB_KEY, &raw)
    }
}

#[async_trait]
impl<S: KeyValueStorage> PlaylistStore for LocalPlaylistStore<S> {
    async fn list_playlists(&self, token: &str) -> StoreResult<Vec<Playlist>> {
        require_token(token)?;
        self.simulate_latency().await;
        self.load()
    }

    async fn add_songs(
        &self,
        token: &str,
        playlist_id: &str,
        songs: &[Song],
    ) -> StoreResult<Vec<Playlist>> {
        require_token(token)?;
        self.simulate_latency().await;

        let mut playlists = self.load()?;
        let playlist = playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_else(|| StoreError::NotFound(playlist_id.to_string()))?;

        prepend_songs(playlist, songs);
        debug!(
            playlist = playlist_id,
            added = songs.len(),
            total = playlist.songs.len(),
            "Added songs to local playlist"
        );

        self.save(&playlists)?;
        Ok(playlists)
    }

    async fn create_playlist(&self, token: &str, name: &str) -> StoreResult<Vec<Playlist>> {
        require_token(token)?;
        self.simulate_latency().await;

        let mut playlists = self.load()?;
        let stamp = Utc::now().timestamp_millis();
        let id = unique_id(&playlists, &format!("pl-{stamp}"));

        let mut playlist = Playlist::new(id.clone(), name, PlaylistType::Playlist);
        playlist.cover_url = Some(format!("https://picsum.photos/seed/{stamp}/300/300"));
        playlists.push(playlist);

        info!(playlist = %id, name, "Created local playlist");
        self.save(&playlists)?;
        Ok(playlists)
    }
}

/// `base`, or `base-N` for the first N that is not taken yet
fn unique_id(playlists: &[Playlist], base: &str) -> String {
    let taken = |id: &str| playlists.iter().any(|p| p.id == id);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn seed_song(id: &str, title: &str, artist: &str, album: &str, duration: &str, cover: &str) -> Song {
    Song {
        id: id.to_string(),
        title: title.to_string(),
        artist: artist.to_string(),
        album: Some(album.to_string()),
        duration: Some(duration.to_string()),
        cover_url: Some(format!("https://picsum.photos/seed/{cover}/64/64")),
    }
}

fn seed_playlist(id: &str, name: &str, cover: &str) -> Playlist {
    let mut playlist = Playlist::new(id, name, PlaylistType::Playlist);
    playlist.cover_url = Some(format!("https://picsum.photos/seed/{cover}/300/300"));
    playlist
}

/// Initial collection for an empty store: one liked collection and three empty playlists
pub fn seed_playlists() -> Vec<Playlist> {
    let mut liked = Playlist::new("liked-songs", "שירים שאהבתי", PlaylistType::Liked);
    liked.is_pinned = Some(true);
    liked.songs = vec![
        seed_song("1", "חצי בן אדם", "Dudi Buzaglo", "Single", "3:20", "dudi"),
        seed_song("2", "עוד יום", "Full Trunk", "Molat", "3:45", "fulltrunk"),
    ];

    vec![
        liked,
        seed_playlist("techno-vibes", "Techno Vibes", "techno"),
        seed_playlist("road-trip", "Road Trip IL", "road"),
        seed_playlist("workout", "אימון כוח", "gym"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::{FileStorage, MemoryStorage};

    fn store() -> LocalPlaylistStore<MemoryStorage> {
        LocalPlaylistStore::new(MemoryStorage::new()).with_latency(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_first_read_persists_seed() {
        let store = store();
        assert!(store.storage().get(DB_KEY).unwrap().is_none());

        let playlists = store.list_playlists("tok").await.unwrap();

        let raw = store.storage().get(DB_KEY).unwrap().unwrap();
        let persisted: Vec<Playlist> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, playlists);
        assert_eq!(playlists, seed_playlists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_a_storage_error() {
        let store = store();
        store.storage().set(DB_KEY, "{not json").unwrap();

        let err = store.list_playlists("tok").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }

    #[tokio::test]
    async fn test_create_playlist_appends_empty_playlist() {
        let store = store();

        let playlists = store.create_playlist("tok", "Chill").await.unwrap();

        assert_eq!(playlists.len(), 5);
        let created = playlists.last().unwrap();
        assert_eq!(created.name, "Chill");
        assert_eq!(created.kind, PlaylistType::Playlist);
        assert!(created.songs.is_empty());
        assert!(created.id.starts_with("pl-"));
        assert!(created.cover_url.is_some());
    }

    #[tokio::test]
    async fn test_created_ids_stay_unique() {
        let store = store();

        store.create_playlist("tok", "One").await.unwrap();
        store.create_playlist("tok", "Two").await.unwrap();
        let playlists = store.create_playlist("tok", "Three").await.unwrap();

        let mut ids: Vec<_> = playlists.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), playlists.len());
    }

    #[test]
    fn test_unique_id_suffixes_taken_ids() {
        let playlists = vec![
            Playlist::new("pl-1", "a", PlaylistType::Playlist),
            Playlist::new("pl-1-2", "b", PlaylistType::Playlist),
        ];
        assert_eq!(unique_id(&playlists, "pl-1"), "pl-1-3");
        assert_eq!(unique_id(&playlists, "pl-9"), "pl-9");
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let song = Song::new("t-0", "X", "Y");

        {
            let store = LocalPlaylistStore::new(FileStorage::new(dir.path()))
                .with_latency(Duration::ZERO);
            store.add_songs("tok", "road-trip", &[song.clone()]).await.unwrap();
        }

        let reopened =
            LocalPlaylistStore::new(FileStorage::new(dir.path())).with_latency(Duration::ZERO);
        let playlists = reopened.list_playlists("tok").await.unwrap();
        let road_trip = playlists.iter().find(|p| p.id == "road-trip").unwrap();
        assert_eq!(road_trip.songs, vec![song]);
    }

    #[tokio::test]
    async fn test_latency_is_awaited() {
        let store = LocalPlaylistStore::new(MemoryStorage::new())
            .with_latency(Duration::from_millis(20));

        let started = std::time::Instant::now();
        store.list_playlists("tok").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
