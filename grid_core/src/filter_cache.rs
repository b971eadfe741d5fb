//! Pending filter edits, held back until the user explicitly applies them.
//!
//! The table would otherwise re-filter on every keystroke. Widgets only ever emit
//! [`FilterCommand`]s, [`FilterController`] reduces them against the applied
//! [`FilterState`] and the [`DeferredFilterApplyCache`].

use std::collections::{BTreeMap, HashMap};

use log::{debug, trace, warn};

use crate::error::ConfigurationError;
use crate::filter::{
    CommitFn, FieldFilterState, FilterState, FilterValue, MatchMode, Operator, commit_value,
};
use crate::spec::ModelSpec;

/// Position of a pending edit within one field. The operator commits first and match modes
/// before values, so a value is applied under the mode it was typed for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Operator,
    MatchMode(usize),
    Value(usize),
}

impl Slot {
    fn index(&self) -> usize {
        match self {
            Slot::Operator => 0,
            Slot::MatchMode(index) | Slot::Value(index) => *index,
        }
    }
}

#[derive(Clone, Debug)]
pub enum PendingFilterEdit {
    Value { value: FilterValue, commit: CommitFn },
    MatchMode(MatchMode),
    Operator(Operator),
}

/// field -> slot -> latest uncommitted edit
#[derive(Default)]
pub struct DeferredFilterApplyCache {
    cache: HashMap<String, BTreeMap<Slot, PendingFilterEdit>>,
}

impl DeferredFilterApplyCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, field: &str, slot: Slot, edit: PendingFilterEdit) {
        trace!("pending filter edit {field} {slot:?} = {edit:?}");
        self.cache.entry(field.to_string()).or_default().insert(slot, edit);
    }

    /// Overwrites any earlier pending edit for the same slot.
    pub fn record(&mut self, field: &str, index: usize, value: FilterValue, commit: CommitFn) {
        self.insert(field, Slot::Value(index), PendingFilterEdit::Value { value, commit });
    }

    pub fn record_match_mode(&mut self, field: &str, index: usize, match_mode: MatchMode) {
        self.insert(field, Slot::MatchMode(index), PendingFilterEdit::MatchMode(match_mode));
    }

    pub fn record_operator(&mut self, field: &str, operator: Operator) {
        self.insert(field, Slot::Operator, PendingFilterEdit::Operator(operator));
    }

    /// Runs every stored commit of `field` once against `state`, in slot order. Entries stay
    /// cached, applying again without new edits writes the same values.
    pub fn apply(&self, field: &str, state: &mut FieldFilterState) -> usize {
        let Some(edits) = self.cache.get(field) else {
            return 0;
        };
        for (slot, edit) in edits {
            let index = slot.index();
            match edit {
                PendingFilterEdit::Value { value, commit } => commit(state, value.clone(), index),
                PendingFilterEdit::MatchMode(match_mode) => {
                    state.set_match_mode(index, *match_mode);
                }
                PendingFilterEdit::Operator(operator) => state.set_operator(*operator),
            }
        }
        edits.len()
    }

    pub fn discard(&mut self, field: &str) {
        if self.cache.remove(field).is_some() {
            trace!("discarded pending filter edits of {field}");
        }
    }

    pub fn discard_all(&mut self) {
        self.cache.clear();
    }

    fn get(&self, field: &str, slot: Slot) -> Option<&PendingFilterEdit> {
        self.cache.get(field)?.get(&slot)
    }

    pub fn pending(&self, field: &str, index: usize) -> Option<&FilterValue> {
        match self.get(field, Slot::Value(index))? {
            PendingFilterEdit::Value { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn pending_match_mode(&self, field: &str, index: usize) -> Option<MatchMode> {
        match self.get(field, Slot::MatchMode(index))? {
            PendingFilterEdit::MatchMode(match_mode) => Some(*match_mode),
            _ => None,
        }
    }

    pub fn pending_operator(&self, field: &str) -> Option<Operator> {
        match self.get(field, Slot::Operator)? {
            PendingFilterEdit::Operator(operator) => Some(*operator),
            _ => None,
        }
    }

    pub fn has_pending(&self, field: &str) -> bool {
        self.cache.get(field).is_some_and(|e| !e.is_empty())
    }
}

/// Message emitted by filter widgets and toolbar controls.
#[derive(Clone, Debug)]
pub enum FilterCommand {
    Edit {
        field: String,
        index: usize,
        value: FilterValue,
        commit: CommitFn,
    },
    EditMatchMode {
        field: String,
        index: usize,
        match_mode: MatchMode,
    },
    EditOperator {
        field: String,
        operator: Operator,
    },
    Apply {
        field: String,
    },
    /// Column "clear": drop pending edits and restore the field's default.
    Clear {
        field: String,
    },
    SetGlobal(String),
    ClearAll,
}

impl FilterCommand {
    /// Edit with the standard value commit.
    pub fn edit(field: impl AsRef<str>, index: usize, value: FilterValue) -> Self {
        FilterCommand::Edit {
            field: field.as_ref().to_string(),
            index,
            value,
            commit: commit_value,
        }
    }

    pub fn apply(field: impl AsRef<str>) -> Self {
        FilterCommand::Apply {
            field: field.as_ref().to_string(),
        }
    }

    pub fn clear(field: impl AsRef<str>) -> Self {
        FilterCommand::Clear {
            field: field.as_ref().to_string(),
        }
    }
}

/// Applied state plus pending edits of one grid.
pub struct FilterController {
    state: FilterState,
    pending: DeferredFilterApplyCache,
}

impl FilterController {
    pub fn new(spec: &ModelSpec) -> Result<Self, ConfigurationError> {
        Ok(FilterController {
            state: FilterState::new(spec)?,
            pending: DeferredFilterApplyCache::new(),
        })
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn pending(&self) -> &DeferredFilterApplyCache {
        &self.pending
    }

    /// Returns true when the applied state may have changed and rows need re-filtering.
    pub fn handle(&mut self, command: FilterCommand) -> bool {
        match command {
            FilterCommand::Edit {
                field,
                index,
                value,
                commit,
            } => {
                self.pending.record(&field, index, value, commit);
                false
            }
            FilterCommand::EditMatchMode {
                field,
                index,
                match_mode,
            } => {
                self.pending.record_match_mode(&field, index, match_mode);
                false
            }
            FilterCommand::EditOperator { field, operator } => {
                self.pending.record_operator(&field, operator);
                false
            }
            FilterCommand::Apply { field } => {
                let pending = &self.pending;
                let applied = self
                    .state
                    .update_field(&field, |state| pending.apply(&field, state))
                    .unwrap_or(0);
                debug!("applied {applied} pending edit(s) to {field}");
                applied > 0
            }
            FilterCommand::Clear { field } => {
                self.pending.discard(&field);
                if let Err(e) = self.state.reset_field(&field) {
                    warn!("clear filter: {e}");
                    return false;
                }
                true
            }
            FilterCommand::SetGlobal(text) => {
                self.state.set_global(text);
                true
            }
            FilterCommand::ClearAll => {
                self.pending.discard_all();
                self.state.clear_all();
                true
            }
        }
    }
}
