use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::{StoreError, WorkflowError};
use crate::models::{Candidate, CandidateId, GeneratedSong, InsertionMode, Playlist, Song};

/// Where the current generation cycle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
    Presented,
    Committing,
}

/// Handed out when generation starts; its result is only accepted while the
/// ticket is still current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    epoch: u64,
    pub mode: InsertionMode,
    pub input: String,
}

/// What to write when a commit starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    pub playlist_id: String,
    pub songs: Vec<Song>,
}

/// Selection/generation state machine:
/// `Idle -> Generating -> Presented -> Committing -> Idle`.
///
/// The playlist collection held here is only ever replaced with what a store
/// returned, never edited in place.
#[derive(Debug, Clone)]
pub struct Workflow {
    mode: InsertionMode,
    target: Option<String>,
    input: String,
    phase: Phase,
    candidates: Vec<Candidate>,
    selected: HashSet<CandidateId>,
    epoch: u64,
    playlists: Vec<Playlist>,
    notice: Option<String>,
    last_error: Option<String>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Workflow {
            mode: InsertionMode::default(),
            target: None,
            input: String::new(),
            phase: Phase::Idle,
            candidates: Vec::new(),
            selected: HashSet::new(),
            epoch: 0,
            playlists: Vec::new(),
            notice: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> InsertionMode {
        self.mode
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn target_playlist(&self) -> Option<&Playlist> {
        let target = self.target.as_deref()?;
        self.playlists.iter().find(|p| p.id == target)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_selected(&self, id: &CandidateId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Informational message from the last cycle, e.g. no candidates found
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// User-visible error from the last failed commit
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Replace the playlist view, keeping the target if it still exists
    pub fn set_playlists(&mut self, playlists: Vec<Playlist>) {
        self.playlists = playlists;
        let target_exists = self
            .target
            .as_deref()
            .is_some_and(|id| self.playlists.iter().any(|p| p.id == id));
        if !target_exists {
            self.target = self.playlists.first().map(|p| p.id.clone());
        }
    }

    /// Switching mode abandons any unsaved candidates
    pub fn select_mode(&mut self, mode: InsertionMode) -> Result<(), WorkflowError> {
        self.ensure_not_committing()?;
        if self.mode != mode {
            self.mode = mode;
            self.reset();
        }
        Ok(())
    }

    /// Switching target playlist abandons any unsaved candidates
    pub fn select_target(&mut self, playlist_id: &str) -> Result<(), WorkflowError> {
        self.ensure_not_committing()?;
        if self.target.as_deref() != Some(playlist_id) {
            self.target = Some(playlist_id.to_string());
            self.reset();
        }
        Ok(())
    }

    pub fn begin_generation(&mut self) -> Result<GenerationTicket, WorkflowError> {
        match self.phase {
            Phase::Generating => return Err(WorkflowError::Busy("generation")),
            Phase::Committing => return Err(WorkflowError::Busy("commit")),
            Phase::Idle | Phase::Presented => {}
        }
        let input = self.input.trim();
        if input.is_empty() {
            return Err(WorkflowError::EmptyInput);
        }
        let input = input.to_string();

        self.epoch += 1;
        self.candidates.clear();
        self.selected.clear();
        self.notice = None;
        self.last_error = None;
        self.phase = Phase::Generating;
        debug!(mode = %self.mode, epoch = self.epoch, "Generation started");

        Ok(GenerationTicket {
            epoch: self.epoch,
            mode: self.mode,
            input,
        })
    }

    /// Present a generation result. Returns false when the ticket went stale
    /// (context switched meanwhile) and the result was dropped.
    pub fn finish_generation(
        &mut self,
        ticket: &GenerationTicket,
        songs: Vec<GeneratedSong>,
        stamp: i64,
    ) -> bool {
        if self.phase != Phase::Generating || ticket.epoch != self.epoch {
            debug!(epoch = ticket.epoch, "Discarding stale generation result");
            return false;
        }

        self.candidates = Candidate::assign(songs, stamp);
        if self.candidates.is_empty() {
            self.phase = Phase::Idle;
            self.notice = Some("No candidates found".to_string());
            return true;
        }

        self.selected = self.candidates.iter().map(|c| c.id.clone()).collect();
        self.phase = Phase::Presented;
        info!(count = self.candidates.len(), "Presenting candidates");
        true
    }

    /// Flip one candidate's selection, returning whether it is now selected
    pub fn toggle(&mut self, id: &CandidateId) -> Result<bool, WorkflowError> {
        if self.phase != Phase::Presented {
            return Err(WorkflowError::NotPresented);
        }
        if !self.candidates.iter().any(|c| &c.id == id) {
            return Err(WorkflowError::UnknownCandidate(id.clone()));
        }
        if self.selected.remove(id) {
            Ok(false)
        } else {
            self.selected.insert(id.clone());
            Ok(true)
        }
    }

    /// Drop one candidate from the selection. Deselecting twice is a no-op.
    pub fn deselect(&mut self, id: &CandidateId) -> Result<(), WorkflowError> {
        if self.phase != Phase::Presented {
            return Err(WorkflowError::NotPresented);
        }
        if !self.candidates.iter().any(|c| &c.id == id) {
            return Err(WorkflowError::UnknownCandidate(id.clone()));
        }
        self.selected.remove(id);
        Ok(())
    }

    pub fn begin_commit(&mut self) -> Result<CommitTicket, WorkflowError> {
        match self.phase {
            Phase::Presented => {}
            Phase::Committing => return Err(WorkflowError::Busy("commit")),
            Phase::Idle | Phase::Generating => return Err(WorkflowError::NotPresented),
        }
        let playlist_id = self.target.clone().ok_or(WorkflowError::NoTargetPlaylist)?;
        if self.selected.is_empty() {
            return Err(WorkflowError::NothingSelected);
        }

        // Presentation order, not selection order
        let songs: Vec<Song> = self
            .candidates
            .iter()
            .filter(|c| self.selected.contains(&c.id))
            .map(Candidate::to_song)
            .collect();

        self.last_error = None;
        self.phase = Phase::Committing;
        debug!(playlist = %playlist_id, count = songs.len(), "Commit started");

        Ok(CommitTicket { playlist_id, songs })
    }

    /// Apply the store's answer. Failures go back to `Presented` with the
    /// selection intact so the commit can be retried.
    pub fn finish_commit(
        &mut self,
        result: Result<Vec<Playlist>, StoreError>,
    ) -> Result<(), StoreError> {
        match result {
            Ok(playlists) => {
                self.set_playlists(playlists);
                self.candidates.clear();
                self.selected.clear();
                self.input.clear();
                self.phase = Phase::Idle;
                info!("Commit succeeded");
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Presented;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn ensure_not_committing(&self) -> Result<(), WorkflowError> {
        if self.phase == Phase::Committing {
            return Err(WorkflowError::Busy("commit"));
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.epoch += 1;
        self.phase = Phase::Idle;
        self.candidates.clear();
        self.selected.clear();
        self.input.clear();
        self.notice = None;
        self.last_error = None;
    }
}
