pub mod gemini;


use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::{GeneratedSong, InsertionMode};

pub use gemini::GeminiClient;

/// Number of songs requested when generating by artist
pub const DEFAULT_ARTIST_BATCH_SIZE: usize = 10;

/// A single text-completion call whose output is constrained to a JSON schema
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str, response_schema: &Value)
    -> Result<String, GenerationError>;
}

/// Produces song candidates from user input.
///
/// An empty result means "no candidates"; it may also hide a failed call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SongGenerator: Send + Sync {
    async fn generate(&self, mode: InsertionMode, input: &str) -> Vec<GeneratedSong>;
}

/// Builds prompts, calls the completion service and validates its answer
pub struct SongGenerationAdapter<C: TextCompletion> {
    completion: C,
    artist_batch_size: usize,
}

impl<C: TextCompletion> SongGenerationAdapter<C> {
    pub fn new(completion: C) -> Self {
        SongGenerationAdapter {
            completion,
            artist_batch_size: DEFAULT_ARTIST_BATCH_SIZE,
        }
    }

    pub fn with_artist_batch_size(mut self, size: usize) -> Self {
        self.artist_batch_size = size;
        self
    }

    pub fn prompt_for(&self, mode: InsertionMode, input: &str) -> String {
        match mode {
            InsertionMode::ByArtist => format!(
                "List {} popular songs by the artist \"{}\". Provide the title, album, and an \
                 approximate duration (e.g. \"3:45\"). Ensure the artist name is consistent.",
                self.artist_batch_size, input
            ),
            InsertionMode::ByList => format!(
                "Parse the following text into a structured list of songs. Attempt to identify \
                 title and artist. If no artist is found, use \"Unknown Artist\". If no album is \
                 found, use \"Single\". Estimate duration if unknown. Text: \"{input}\""
            ),
        }
    }

    /// Like [`SongGenerator::generate`] but keeps failures distinguishable from no results
    pub async fn try_generate(
        &self,
        mode: InsertionMode,
        input: &str,
    ) -> Result<Vec<GeneratedSong>, GenerationError> {
        let prompt = self.prompt_for(mode, input);
        debug!(%mode, "Requesting song candidates");
        let text = self.completion.complete(&prompt, &song_list_schema()).await?;
        parse_song_list(&text)
    }
}

#[async_trait]
impl<C: TextCompletion> SongGenerator for SongGenerationAdapter<C> {
    async fn generate(&self, mode: InsertionMode, input: &str) -> Vec<GeneratedSong> {
        match self.try_generate(mode, input).await {
            Ok(songs) => {
                debug!(%mode, count = songs.len(), "Received song candidates");
                songs
            }
            Err(e) => {
                warn!(%mode, error = %e, "Song generation failed, returning no candidates");
                Vec::new()
            }
        }
    }
}

/// Response schema: an array of `{title, artist, album, duration}`, all required strings
pub fn song_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "artist": { "type": "STRING" },
                "album": { "type": "STRING" },
                "duration": { "type": "STRING" }
            },
            "required": ["title", "artist", "album", "duration"]
        }
    })
}

/// Strictly decode the service's answer. Blank text is an empty list.
pub fn parse_song_list(text: &str) -> Result<Vec<GeneratedSong>, GenerationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| GenerationError::SchemaViolation(e.to_string()))
}
