//! Selection state with generation-tagged metadata requests.
//!
//! Every click starts a new generation. A metadata response is only applied
//! when its ticket still carries the latest generation, so a slow response
//! for an earlier click can never overwrite the form of a later one.

use shared::domain::{Item, ItemMetadata};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    generation: u64,
    tile: usize,
    item: Item,
}

impl SelectionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn item(&self) -> &Item {
        &self.item
    }
}

/// The selected item together with the metadata that was fetched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSelection {
    tile: usize,
    item: Item,
    metadata: ItemMetadata,
}

impl ActiveSelection {
    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    generation: u64,
    pending: Option<SelectionTicket>,
    active: Option<ActiveSelection>,
}

impl SelectionState {
    pub fn begin(&mut self, tile: usize, item: Item) -> Result<SelectionTicket> {
        if item.name.trim().is_empty() {
            return Err(ClientError::EmptyItemName);
        }
        self.generation = self.generation.wrapping_add(1);
        let ticket = SelectionTicket {
            generation: self.generation,
            tile,
            item,
        };
        self.pending = Some(ticket.clone());
        Ok(ticket)
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation)
    }

    pub fn complete(
        &mut self,
        ticket: &SelectionTicket,
        metadata: ItemMetadata,
    ) -> SelectionOutcome {
        if !self.is_current(ticket) {
            return SelectionOutcome::Stale;
        }
        self.pending = None;
        self.active = Some(ActiveSelection {
            tile: ticket.tile,
            item: ticket.item.clone(),
            metadata,
        });
        SelectionOutcome::Applied
    }

    /// Drops a failed request. The active selection is left as it was.
    pub fn abandon(&mut self, ticket: &SelectionTicket) -> SelectionOutcome {
        if !self.is_current(ticket) {
            return SelectionOutcome::Stale;
        }
        self.pending = None;
        SelectionOutcome::Applied
    }

    /// Forgets the selection. The generation keeps counting, so tickets
    /// issued before the reset can never match a later click.
    pub fn reset(&mut self) {
        self.pending = None;
        self.active = None;
    }

    pub fn active(&self) -> Option<&ActiveSelection> {
        self.active.as_ref()
    }

    pub fn pending(&self) -> Option<&SelectionTicket> {
        self.pending.as_ref()
    }

    /// The tile that carries the selected mark: the in-flight click if any,
    /// otherwise the active selection.
    pub fn highlighted_tile(&self) -> Option<usize> {
        self.pending
            .as_ref()
            .map(SelectionTicket::tile)
            .or_else(|| self.active.as_ref().map(ActiveSelection::tile))
    }
}
