use chrono::Utc;
use tracing::info;

use crate::error::SessionError;
use crate::generation::SongGenerator;
use crate::models::{CandidateId, Playlist, User};
use crate::store::PlaylistStore;
use crate::workflow::Workflow;

/// A logged in user working against one store and one generator.
///
/// The session owns everything it talks to; nothing is shared globally.
pub struct CurationSession {
    user: User,
    store: Box<dyn PlaylistStore>,
    generator: Box<dyn SongGenerator>,
    workflow: Workflow,
}

impl CurationSession {
    /// Any non-blank token is accepted here; the store checks it on first use
    pub fn login(
        token: &str,
        store: Box<dyn PlaylistStore>,
        generator: Box<dyn SongGenerator>,
    ) -> Result<Self, SessionError> {
        let user = User::from_token(token).ok_or(SessionError::EmptyToken)?;
        info!(username = %user.username, "Logged in");
        Ok(CurationSession {
            user,
            store,
            generator,
            workflow: Workflow::new(),
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn workflow_mut(&mut self) -> &mut Workflow {
        &mut self.workflow
    }

    /// Re-read the whole collection from the store
    pub async fn refresh(&mut self) -> Result<&[Playlist], SessionError> {
        let playlists = self.store.list_playlists(&self.user.token).await?;
        self.workflow.set_playlists(playlists);
        Ok(self.workflow.playlists())
    }

    /// Run one generation for the current input, returning how many
    /// candidates are now presented
    pub async fn generate(&mut self) -> Result<usize, SessionError> {
        let ticket = self.workflow.begin_generation()?;
        let songs = self.generator.generate(ticket.mode, &ticket.input).await;
        self.workflow
            .finish_generation(&ticket, songs, Utc::now().timestamp_millis());
        Ok(self.workflow.candidates().len())
    }

    pub fn toggle(&mut self, id: &CandidateId) -> Result<bool, SessionError> {
        Ok(self.workflow.toggle(id)?)
    }

    pub fn deselect(&mut self, id: &CandidateId) -> Result<(), SessionError> {
        Ok(self.workflow.deselect(id)?)
    }

    /// Write the selected candidates to the target playlist
    pub async fn commit(&mut self) -> Result<&[Playlist], SessionError> {
        let ticket = self.workflow.begin_commit()?;
        let result = self
            .store
            .add_songs(&self.user.token, &ticket.playlist_id, &ticket.songs)
            .await;
        self.workflow.finish_commit(result)?;
        Ok(self.workflow.playlists())
    }

    pub async fn create_playlist(&mut self, name: &str) -> Result<&[Playlist], SessionError> {
        let playlists = self.store.create_playlist(&self.user.token, name).await?;
        self.workflow.set_playlists(playlists);
        Ok(self.workflow.playlists())
    }

    /// Forget the user. Nothing is invalidated server side.
    pub fn logout(self) {
        info!(username = %self.user.username, "Logged out");
    }
}
