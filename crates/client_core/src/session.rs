//! The operator workflow: catalog → selection → form → submission.
//!
//! `OperatorSession` is owned by whoever drives the UI loop. It performs no
//! I/O; callers fetch metadata for the tickets it hands out and feed the
//! results back.

use shared::{
    domain::{Item, ItemMetadata},
    protocol::SubmissionPayload,
};
use tracing::debug;

use crate::{
    error::{ClientError, Result},
    form::{build_submission, ParameterForm},
    gallery::Gallery,
    selection::{ActiveSelection, SelectionOutcome, SelectionState, SelectionTicket},
};

#[derive(Debug, Clone, Default)]
pub struct OperatorSession {
    gallery: Gallery,
    selection: SelectionState,
    form: ParameterForm,
}

impl OperatorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the gallery. Tile indices change meaning, so any selection
    /// and form built against the previous catalog are dropped.
    pub fn load_catalog(&mut self, items: Vec<Item>) {
        self.gallery = Gallery::from_catalog(items);
        self.selection.reset();
        self.form = ParameterForm::default();
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Starts selecting the item on `tile`. The returned ticket must
    /// accompany the metadata response.
    pub fn select_tile(&mut self, tile: usize) -> Option<Result<SelectionTicket>> {
        let item = self.gallery.get(tile)?.clone();
        Some(self.selection.begin(tile, item))
    }

    pub fn apply_metadata(
        &mut self,
        ticket: &SelectionTicket,
        metadata: ItemMetadata,
    ) -> SelectionOutcome {
        let outcome = self.selection.complete(ticket, metadata);
        match outcome {
            SelectionOutcome::Applied => {
                if let Some(active) = self.selection.active() {
                    self.form = ParameterForm::from_metadata(active.metadata());
                }
            }
            SelectionOutcome::Stale => debug!(
                generation = ticket.generation(),
                item = %ticket.item().name,
                "discarding stale metadata response"
            ),
        }
        outcome
    }

    pub fn reject_metadata(&mut self, ticket: &SelectionTicket) -> SelectionOutcome {
        self.selection.abandon(ticket)
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.selection.is_current(ticket)
    }

    pub fn highlighted_tile(&self) -> Option<usize> {
        self.selection.highlighted_tile()
    }

    pub fn is_highlighted(&self, tile: usize) -> bool {
        self.highlighted_tile() == Some(tile)
    }

    pub fn is_loading(&self) -> bool {
        self.selection.pending().is_some()
    }

    pub fn active(&self) -> Option<&ActiveSelection> {
        self.selection.active()
    }

    pub fn form(&self) -> &ParameterForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ParameterForm {
        &mut self.form
    }

    /// Builds the `/submit` body. Refused with `NoSelection` when nothing is
    /// selected and with `SelectionPending` while a newer click is loading,
    /// since the highlighted tile would not be the item sent.
    pub fn send_data(&self) -> Result<SubmissionPayload> {
        if let Some(pending) = self.selection.pending() {
            return Err(ClientError::SelectionPending {
                item: pending.item().name.clone(),
            });
        }
        let active = self.selection.active().ok_or(ClientError::NoSelection)?;
        Ok(build_submission(active, &self.form))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
