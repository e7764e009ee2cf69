use async_trait::async_trait;
use tracing::{debug, warn};
use ureq::Agent;
use urlencoding::encode;

use super::{PlaylistStore, require_token};
use crate::error::{StoreError, StoreResult};
use crate::models::{AddSongsRequest, Playlist, PlaylistsResponse, Song};

/// Default base URL of the playlist backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Playlist store talking to the REST backend.
///
/// The write endpoint only reports per-song status, even for unknown ids.
/// Writes are preceded by a read that checks the target exists and
/// followed by a full re-read to return the authoritative collection.
pub struct RemotePlaylistStore {
    agent: Agent,
    base_url: String,
}

impl RemotePlaylistStore {
    pub fn new(base_url: &str) -> Self {
        RemotePlaylistStore {
            agent: Agent::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_playlists(&self, token: &str) -> StoreResult<Vec<Playlist>> {
        let agent = self.agent.clone();
        let url = format!("{}/music/playlists/personalized", self.base_url);
        let token = token.to_string();

        run_blocking(move || {
            debug!(url = %url, "Fetching playlists");
            let response = agent
                .get(&url)
                .set("Authorization", &token)
                .call()
                .map_err(|e| map_http_error(e, "fetch playlists", None))?;

            let parsed: PlaylistsResponse = response.into_json().map_err(|e| {
                StoreError::Transport(format!("Failed to parse playlists response: {e}"))
            })?;
            Ok(parsed.into_playlists())
        })
        .await
    }

    async fn post_songs(&self, token: &str, playlist_id: &str, songs: &[Song]) -> StoreResult<()> {
        let agent = self.agent.clone();
        let url = format!("{}/music/playlists/{}", self.base_url, encode(playlist_id));
        let token = token.to_string();
        let playlist_id = playlist_id.to_string();
        let body = AddSongsRequest {
            songs: songs.iter().map(Song::display_name).collect(),
        };

        run_blocking(move || {
            debug!(url = %url, count = body.songs.len(), "Adding songs to playlist");
            agent
                .post(&url)
                .set("Authorization", &token)
                .send_json(&body)
                .map_err(|e| map_http_error(e, "add songs", Some(&playlist_id)))?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl PlaylistStore for RemotePlaylistStore {
    async fn list_playlists(&self, token: &str) -> StoreResult<Vec<Playlist>> {
        require_token(token)?;
        self.fetch_playlists(token).await
    }

    async fn add_songs(
        &self,
        token: &str,
        playlist_id: &str,
        songs: &[Song],
    ) -> StoreResult<Vec<Playlist>> {
        require_token(token)?;
        // The backend answers 200 for unknown ids, so check before writing
        let current = self.fetch_playlists(token).await?;
        ensure_playlist(&current, playlist_id)?;

        self.post_songs(token, playlist_id, songs).await?;
        // The write reply is not the new state
        let playlists = self.fetch_playlists(token).await?;
        ensure_playlist(&playlists, playlist_id)?;
        Ok(playlists)
    }

    async fn create_playlist(&self, token: &str, name: &str) -> StoreResult<Vec<Playlist>> {
        require_token(token)?;
        warn!(name, "Creating playlists is not supported by the remote backend");
        self.fetch_playlists(token).await
    }
}

fn ensure_playlist(playlists: &[Playlist], playlist_id: &str) -> StoreResult<()> {
    if playlists.iter().any(|p| p.id == playlist_id) {
        Ok(())
    } else {
        Err(StoreError::NotFound(playlist_id.to_string()))
    }
}

/// Run a blocking HTTP exchange on tokio's blocking pool
async fn run_blocking<T, F>(exchange: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(exchange)
        .await
        .map_err(|e| StoreError::Transport(format!("HTTP worker failed: {e}")))?
}

fn map_http_error(error: ureq::Error, action: &str, playlist_id: Option<&str>) -> StoreError {
    match (error, playlist_id) {
        (ureq::Error::Status(401 | 403, _), _) => StoreError::Unauthorized,
        (ureq::Error::Status(404, _), Some(id)) => StoreError::NotFound(id.to_string()),
        (ureq::Error::Status(code, response), _) => StoreError::Transport(format!(
            "Failed to {action}: {code} {}",
            response.status_text()
        )),
        (ureq::Error::Transport(transport), _) => {
            StoreError::Transport(format!("Failed to {action}: {transport}"))
        }
    }
}
