use crate::dispatch::ColumnWidgets;
use crate::filter_cache::{FilterCommand, FilterController};
use crate::record::Record;
use crate::sort::SortBy;
use crate::sync::ImportResult;
use crate::value::Value;
use crate::{CellCoord, ColumnUid, RowUid};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VisualRowIdx(pub usize);

pub trait TableBackend {
    /// Drop all records and load them again from the service.
    fn reload(&mut self) {}
    /// Clear all row data from memory, but leave the columns' info.
    fn clear(&mut self);

    fn persistent_flags(&self) -> &PersistentFlags;
    /// Returns one shot flags with 1 frame delay, so that user code gets a change to react to
    /// flag changes.
    fn one_shot_flags(&self) -> &OneShotFlags;
    /// Returns one shot flags without delay, only to be used in TableView, cleared when show is
    /// called.
    fn one_shot_flags_internal(&self) -> &OneShotFlags;
    /// Called in TableView::show() to copy current flags to the ones that will be returned via
    /// one_shot_flags()
    fn one_shot_flags_archive(&mut self);
    fn one_shot_flags_mut(&mut self) -> &mut OneShotFlags;

    /// Pick up finished requests. Must be called periodically, for example each frame.
    /// Should not block or take too long on each run.
    fn poll(&mut self) {}

    /// Returns all non-hidden columns in spec order.
    fn available_columns(&self) -> impl Iterator<Item = ColumnUid>;
    /// Returns columns in display order.
    fn used_columns(&self) -> impl Iterator<Item = ColumnUid>;
    fn column_info(&self, col_uid: ColumnUid) -> Option<&ColumnWidgets>;

    /// Returns row count, with filters applied.
    fn row_count(&self) -> usize;
    /// Map index from [0..row_count) range to unique row id, applying sort order in the process.
    fn row_uid(&self, row_idx: VisualRowIdx) -> Option<RowUid>;

    fn get(&self, coord: CellCoord) -> Option<&Value>;
    fn record(&self, row_uid: RowUid) -> Option<&Record>;

    /// Create when the record has no data key value, update otherwise.
    /// The cache changes only once the service confirms.
    fn save_record(&mut self, record: Record);
    /// Delete on the service, the row goes away once confirmed.
    fn remove_row(&mut self, row_uid: RowUid);

    fn filters(&self) -> &FilterController;
    fn handle_filter(&mut self, command: FilterCommand);

    fn sort(&self) -> Option<&SortBy>;
    fn cycle_sort(&mut self, field: &str);

    /// Run the batch import job, reload when it is done.
    fn trigger_import(&mut self) {}
    fn last_import(&self) -> Option<&ImportResult> {
        None
    }

    /// Last failed request, cleared by the next successful one.
    fn last_error(&self) -> Option<&str> {
        None
    }
}

#[derive(Default)]
pub struct PersistentFlags {
    // Persistent flags: value is kept across poll() calls
    /// True when data should not be modified
    pub is_read_only: bool,
    /// True when column information is available.
    pub column_info_present: bool,
    /// True when full row uid set is available
    pub row_set_present: bool,
    /// True while a request is in flight
    pub cells_loading: bool,
    /// True after the first load came back empty, until the next load returns rows.
    pub is_import_recommended: bool,
    /// True while the import job runs
    pub import_running: bool,
}

/// One shot flags: all flags are reset to false after poll() call
#[derive(Default, Copy, Clone)]
pub struct OneShotFlags {
    /// Set once data backend is created
    pub first_pass: bool,
    /// Set once reload() finished with a fresh record set
    pub reloaded: bool,
    /// Set once column set was built
    pub columns_reset: bool,
    /// Set once after row uid set was loaded or changed
    pub row_set_updated: bool,
    /// Set once when visible row set was changed (after filtering or sorting)
    pub visible_row_vec_updated: bool,
    /// Set once when clear() is called.
    pub cleared: bool,
    /// Set once when a save was confirmed by the service.
    pub record_saved: Option<RowUid>,
    /// Set once when the import job reported back.
    pub import_finished: bool,
    /// Set once when a request failed.
    pub request_failed: bool,
}
