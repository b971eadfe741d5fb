use std::collections::HashMap;

use grid_core::{ColumnUid, RowUid};

use super::filter_widgets::FilterDrafts;

#[derive(Default)]
pub(super) struct State {
    pub(super) row_heights: HashMap<RowUid, f32>,
    pub(super) filter_drafts: FilterDrafts,
    /// Column whose filter panel is open.
    pub(super) open_filter: Option<ColumnUid>,
    /// Row waiting for the delete confirmation.
    pub(super) delete_confirm: Option<RowUid>,
}

impl State {
    /// Everything tied to the previous row or column set.
    pub(super) fn reset(&mut self) {
        self.row_heights.clear();
        self.filter_drafts.clear();
        self.open_filter = None;
        self.delete_confirm = None;
    }
}
