use serde::{Deserialize, Serialize};
use std::fmt;

/// A song as stored in a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Free text, e.g. "3:45". Never parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl Song {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Song {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration: None,
            cover_url: None,
        }
    }

    /// Single display string ("title artist") the remote backend searches by
    pub fn display_name(&self) -> String {
        format!("{} {}", self.title, self.artist).trim().to_string()
    }
}

/// Closed set of playlist kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistType {
    #[default]
    Playlist,
    Artist,
    Album,
    Liked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Most recently added songs first
    #[serde(default)]
    pub songs: Vec<Song>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(rename = "type", default)]
    pub kind: PlaylistType,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: PlaylistType) -> Self {
        Playlist {
            id: id.into(),
            name: name.into(),
            description: None,
            songs: Vec::new(),
            cover_url: None,
            is_pinned: None,
            kind,
        }
    }

    pub fn pinned(&self) -> bool {
        self.is_pinned.unwrap_or(false)
    }
}

/// Token the demo login recognises
pub const DEMO_TOKEN: &str = "123";
const DEMO_USERNAME: &str = "Playlist Curator";
const DEFAULT_USERNAME: &str = "User";

/// A logged in user. The token is never validated beyond being non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub token: String,
}

impl User {
    /// Build a user from a raw login token, `None` when the token is blank
    pub fn from_token(raw: &str) -> Option<Self> {
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }
        let username = if token == DEMO_TOKEN {
            DEMO_USERNAME
        } else {
            DEFAULT_USERNAME
        };
        Some(User {
            username: username.to_string(),
            token: token.to_string(),
        })
    }
}

/// How raw input is turned into a generation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionMode {
    ByArtist,
    #[default]
    ByList,
}

impl fmt::Display for InsertionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertionMode::ByArtist => write!(f, "by-artist"),
            InsertionMode::ByList => write!(f, "by-list"),
        }
    }
}

/// One song as returned by the text-generation service.
/// All four fields are required and nothing else is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: String,
}

/// Transient client-side identity of an unsaved candidate.
/// Only unique within the batch that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A generated song waiting for the user to keep or drop it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: CandidateId,
    pub song: GeneratedSong,
    pub cover_url: String,
}

impl Candidate {
    /// Assign transient ids and placeholder covers to a freshly received batch
    pub fn assign(batch: Vec<GeneratedSong>, stamp: i64) -> Vec<Candidate> {
        batch
            .into_iter()
            .enumerate()
            .map(|(index, song)| Candidate {
                id: CandidateId(format!("{stamp}-{index}")),
                cover_url: placeholder_cover(&song.title, &song.artist),
                song,
            })
            .collect()
    }

    /// The song to persist. The transient id travels along as the song id.
    pub fn to_song(&self) -> Song {
        Song {
            id: self.id.0.clone(),
            title: self.song.title.clone(),
            artist: self.song.artist.clone(),
            album: Some(self.song.album.clone()),
            duration: Some(self.song.duration.clone()),
            cover_url: Some(self.cover_url.clone()),
        }
    }
}

/// Deterministic cover image for a title/artist pair
pub fn placeholder_cover(title: &str, artist: &str) -> String {
    let seed: String = title
        .chars()
        .chain(artist.chars())
        .filter(|c| !c.is_whitespace())
        .collect();
    format!(
        "https://picsum.photos/seed/{:x}/64/64",
        md5::compute(seed.as_bytes())
    )
}

/// Response of the remote playlists endpoint: either a bare array or `{ "playlists": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PlaylistsResponse {
    Wrapped { playlists: Vec<Playlist> },
    Bare(Vec<Playlist>),
}

impl PlaylistsResponse {
    pub fn into_playlists(self) -> Vec<Playlist> {
        match self {
            PlaylistsResponse::Wrapped { playlists } => playlists,
            PlaylistsResponse::Bare(playlists) => playlists,
        }
    }
}

/// Request body for adding songs on the remote backend
#[derive(Debug, Serialize)]
pub struct AddSongsRequest {
    /// One "title artist" string per song
    pub songs: Vec<String>,
}

/// Request body for Gemini `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

/// Response of Gemini `generateContent`
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseCandidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined. Empty when there is none.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(title: &str, artist: &str) -> GeneratedSong {
        GeneratedSong {
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Single".to_string(),
            duration: "3:00".to_string(),
        }
    }

    #[test]
    fn test_playlist_uses_wire_field_names() {
        let json = r#"{
            "id": "liked-songs",
            "name": "Liked",
            "type": "liked",
            "isPinned": true,
            "songs": [{"id": "1", "title": "A", "artist": "B", "coverUrl": "x"}]
        }"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();

        assert_eq!(playlist.kind, PlaylistType::Liked);
        assert!(playlist.pinned());
        assert_eq!(playlist.songs[0].cover_url.as_deref(), Some("x"));
        assert!(playlist.songs[0].album.is_none());

        let back = serde_json::to_value(&playlist).unwrap();
        assert_eq!(back["type"], "liked");
        assert_eq!(back["isPinned"], true);
        assert!(back.get("description").is_none());
    }

    #[test]
    fn test_playlist_defaults_missing_songs_and_type() {
        let playlist: Playlist = serde_json::from_str(r#"{"id": "p", "name": "P"}"#).unwrap();
        assert!(playlist.songs.is_empty());
        assert_eq!(playlist.kind, PlaylistType::Playlist);
        assert!(!playlist.pinned());
    }

    #[test]
    fn test_login_rules() {
        assert!(User::from_token("").is_none());
        assert!(User::from_token("   ").is_none());

        let demo = User::from_token(" 123 ").unwrap();
        assert_eq!(demo.username, "Playlist Curator");
        assert_eq!(demo.token, "123");

        let other = User::from_token("abc").unwrap();
        assert_eq!(other.username, "User");
    }

    #[test]
    fn test_generated_song_rejects_extra_and_missing_fields() {
        let extra = r#"{"title":"a","artist":"b","album":"c","duration":"d","year":"1999"}"#;
        assert!(serde_json::from_str::<GeneratedSong>(extra).is_err());

        let missing = r#"{"title":"a","artist":"b","album":"c"}"#;
        assert!(serde_json::from_str::<GeneratedSong>(missing).is_err());
    }

    #[test]
    fn test_candidates_get_batch_ids_and_stable_covers() {
        let batch = vec![generated("Hey Jude", "The Beatles"), generated("Let It Be", "The Beatles")];
        let candidates = Candidate::assign(batch, 42);

        assert_eq!(candidates[0].id, CandidateId("42-0".to_string()));
        assert_eq!(candidates[1].id, CandidateId("42-1".to_string()));
        assert_eq!(
            candidates[0].cover_url,
            placeholder_cover("HeyJude", "TheBeatles")
        );
        assert_ne!(candidates[0].cover_url, candidates[1].cover_url);
        assert!(candidates[0].cover_url.starts_with("https://picsum.photos/seed/"));
    }

    #[test]
    fn test_candidate_to_song_carries_everything() {
        let candidate = Candidate::assign(vec![generated("X", "Y")], 7).remove(0);
        let song = candidate.to_song();

        assert_eq!(song.id, "7-0");
        assert_eq!(song.album.as_deref(), Some("Single"));
        assert_eq!(song.duration.as_deref(), Some("3:00"));
        assert_eq!(song.display_name(), "X Y");
    }

    #[test]
    fn test_playlists_response_accepts_both_shapes() {
        let bare = r#"[{"id": "a", "name": "A"}]"#;
        let wrapped = r#"{"playlists": [{"id": "a", "name": "A"}]}"#;

        let from_bare = serde_json::from_str::<PlaylistsResponse>(bare).unwrap().into_playlists();
        let from_wrapped = serde_json::from_str::<PlaylistsResponse>(wrapped)
            .unwrap()
            .into_playlists();

        assert_eq!(from_bare, from_wrapped);
        assert_eq!(from_bare[0].id, "a");
    }

    #[test]
    fn test_generate_content_text_joins_parts() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "[{"}, {"text": "}]"}]}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "[{}]");

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn test_display_name_trims_missing_artist() {
        assert_eq!(Song::new("1", "Solo", "").display_name(), "Solo");
    }
}
