use std::future::Future;
use std::sync::Arc;

use egui::{Id, Response, Ui};
use egui_extras::Column as TableColumnConfig;
use grid_core::backend::{OneShotFlags, PersistentFlags, TableBackend, VisualRowIdx};
use grid_core::dispatch::{ColumnWidgets, REM};
use grid_core::sort::SortBy;
use grid_core::sync::{ImportResult, RecordSyncController};
use grid_core::transport::{HttpTransport, Transport};
use grid_core::{
    CellCoord, ColumnUid, ConfigurationError, FilterCommand, FilterController, GridModel,
    ModelSpec, Record, RowUid, SyncError, Value,
};
use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::frontend::TableFrontend;
use crate::table_view::{cell_edit, cell_view};

/// Columns without an explicit width start this wide.
pub const DEFAULT_COLUMN_WIDTH: f32 = 14.0 * REM;

/// Table backed by the remote CRUD service. Requests run on the provided tokio runtime,
/// results are picked up in [`TableBackend::poll`] and only then touch the cached records.
pub struct RemoteBackend<T: Transport + 'static = HttpTransport> {
    grid: GridModel,
    spec: Arc<ModelSpec>,
    sync: Arc<RecordSyncController<T>>,
    runtime: Handle,
    tx: UnboundedSender<Tagged>,
    rx: UnboundedReceiver<Tagged>,
    /// Bumped whenever the model spec changes, older results are dropped.
    generation: u64,
    /// Bumped on every reload, only the latest load is applied.
    load_seq: u64,
    in_flight: usize,
    row_edit: Option<(RowUid, Record)>,
    last_error: Option<String>,
    last_import: Option<ImportResult>,
    persistent_flags: PersistentFlags,
    one_shot_flags: OneShotFlags,
    one_shot_flags_delay: OneShotFlags,
}

struct Tagged {
    generation: u64,
    outcome: Outcome,
}

enum Outcome {
    Loaded {
        seq: u64,
        result: Result<Vec<Record>, SyncError>,
    },
    Saved(Result<Record, SyncError>),
    Removed {
        id: String,
        result: Result<(), SyncError>,
    },
    Imported(Result<ImportResult, SyncError>),
}

impl<T: Transport + 'static> RemoteBackend<T> {
    /// Starts loading all records right away.
    pub fn new(
        spec: ModelSpec,
        sync: RecordSyncController<T>,
        runtime: Handle,
    ) -> Result<Self, ConfigurationError> {
        let grid = GridModel::new(spec.clone())?;
        let (tx, rx) = unbounded_channel();
        let mut backend = RemoteBackend {
            grid,
            spec: Arc::new(spec),
            sync: Arc::new(sync),
            runtime,
            tx,
            rx,
            generation: 0,
            load_seq: 0,
            in_flight: 0,
            row_edit: None,
            last_error: None,
            last_import: None,
            persistent_flags: PersistentFlags {
                is_read_only: false,
                column_info_present: true,
                ..Default::default()
            },
            one_shot_flags: OneShotFlags {
                first_pass: true,
                columns_reset: true,
                ..Default::default()
            },
            one_shot_flags_delay: Default::default(),
        };
        backend.reload();
        Ok(backend)
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    /// Switch to another entity. Requests still in flight for the previous one are ignored
    /// when they come back.
    pub fn set_spec(&mut self, spec: ModelSpec) -> Result<(), ConfigurationError> {
        self.grid = GridModel::new(spec.clone())?;
        self.spec = Arc::new(spec);
        self.generation += 1;
        self.in_flight = 0;
        self.row_edit = None;
        self.last_error = None;
        self.persistent_flags.row_set_present = false;
        self.persistent_flags.import_running = false;
        self.one_shot_flags.columns_reset = true;
        self.one_shot_flags.row_set_updated = true;
        self.reload();
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        let generation = self.generation;
        self.in_flight += 1;
        self.persistent_flags.cells_loading = true;
        self.runtime.spawn(async move {
            let outcome = task.await;
            if tx.send(Tagged { generation, outcome }).is_err() {
                debug!("table dropped before the request finished");
            }
        });
    }

    fn key_of(&self, row_uid: RowUid) -> Option<String> {
        let record = self.grid.record(row_uid)?;
        record.key(self.grid.key_field()).map(Value::to_string)
    }

    fn request_failed(&mut self, e: SyncError) {
        self.last_error = Some(e.to_string());
        self.one_shot_flags.request_failed = true;
    }

    fn request_succeeded(&mut self) {
        self.last_error = None;
    }

    fn rows_changed(&mut self) {
        self.one_shot_flags.row_set_updated = true;
        self.one_shot_flags.visible_row_vec_updated = true;
    }

    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Loaded { seq, result } => {
                if seq != self.load_seq {
                    debug!("dropping load #{seq}, #{} is newer", self.load_seq);
                    return;
                }
                match result {
                    Ok(records) => {
                        self.persistent_flags.is_import_recommended = records.is_empty();
                        self.grid.replace_records(records);
                        self.persistent_flags.row_set_present = true;
                        self.one_shot_flags.reloaded = true;
                        self.rows_changed();
                        self.request_succeeded();
                    }
                    Err(e) => self.request_failed(e),
                }
            }
            Outcome::Saved(Ok(record)) => {
                let row_uid = self.grid.apply_saved(record);
                self.one_shot_flags.record_saved = Some(row_uid);
                self.persistent_flags.is_import_recommended = false;
                self.rows_changed();
                self.request_succeeded();
            }
            Outcome::Removed { id, result: Ok(()) } => {
                if self.grid.apply_removed(&id).is_none() {
                    warn!("deleted record {id} was not cached");
                }
                self.rows_changed();
                self.request_succeeded();
            }
            Outcome::Imported(result) => {
                self.persistent_flags.import_running = false;
                self.one_shot_flags.import_finished = true;
                match result {
                    Ok(report) => {
                        self.last_import = Some(report);
                        self.request_succeeded();
                        self.reload();
                    }
                    Err(e) => self.request_failed(e),
                }
            }
            Outcome::Saved(Err(e)) | Outcome::Removed { result: Err(e), .. } => {
                self.request_failed(e)
            }
        }
    }
}

impl<T: Transport + 'static> TableBackend for RemoteBackend<T> {
    fn reload(&mut self) {
        self.load_seq += 1;
        let seq = self.load_seq;
        let sync = self.sync.clone();
        let spec = self.spec.clone();
        debug!("loading {} (#{seq})", self.spec.data_key_of().unwrap_or("?"));
        self.spawn(async move {
            Outcome::Loaded {
                seq,
                result: sync.fetch_all(&spec).await,
            }
        });
    }

    fn clear(&mut self) {
        self.grid.clear();
        self.row_edit = None;
        self.one_shot_flags.cleared = true;
        self.rows_changed();
    }

    fn persistent_flags(&self) -> &PersistentFlags {
        &self.persistent_flags
    }

    fn one_shot_flags(&self) -> &OneShotFlags {
        &self.one_shot_flags_delay
    }

    fn one_shot_flags_internal(&self) -> &OneShotFlags {
        &self.one_shot_flags
    }

    fn one_shot_flags_archive(&mut self) {
        self.one_shot_flags_delay = self.one_shot_flags;
    }

    fn one_shot_flags_mut(&mut self) -> &mut OneShotFlags {
        &mut self.one_shot_flags
    }

    fn poll(&mut self) {
        while let Ok(Tagged {
            generation,
            outcome,
        }) = self.rx.try_recv()
        {
            if generation == self.generation {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.handle_outcome(outcome);
            } else {
                debug!("dropping response for a previous model (gen {generation})");
            }
        }
        self.persistent_flags.cells_loading = self.in_flight > 0;
    }

    fn available_columns(&self) -> impl Iterator<Item = ColumnUid> {
        self.grid.columns().iter().map(|(col_uid, _)| col_uid)
    }

    fn used_columns(&self) -> impl Iterator<Item = ColumnUid> {
        self.grid.columns().ordered(true).into_iter()
    }

    fn column_info(&self, col_uid: ColumnUid) -> Option<&ColumnWidgets> {
        self.grid.columns().get(col_uid)
    }

    fn row_count(&self) -> usize {
        self.grid.visible_rows().len()
    }

    fn row_uid(&self, row_idx: VisualRowIdx) -> Option<RowUid> {
        self.grid.visible_rows().get(row_idx.0).copied()
    }

    fn get(&self, coord: CellCoord) -> Option<&Value> {
        self.grid.cell(coord)
    }

    fn record(&self, row_uid: RowUid) -> Option<&Record> {
        self.grid.record(row_uid)
    }

    fn save_record(&mut self, record: Record) {
        let sync = self.sync.clone();
        let spec = self.spec.clone();
        self.spawn(async move { Outcome::Saved(sync.save(&spec, record).await) });
    }

    fn remove_row(&mut self, row_uid: RowUid) {
        let Some(id) = self.key_of(row_uid) else {
            warn!("row {row_uid:?} has no key, nothing to delete");
            return;
        };
        if self.row_edit.as_ref().is_some_and(|(uid, _)| *uid == row_uid) {
            self.row_edit = None;
        }
        let sync = self.sync.clone();
        let spec = self.spec.clone();
        self.spawn(async move {
            let result = sync.remove(&spec, &id).await;
            Outcome::Removed { id, result }
        });
    }

    fn filters(&self) -> &FilterController {
        self.grid.filters()
    }

    fn handle_filter(&mut self, command: FilterCommand) {
        if self.grid.handle_filter(command) {
            self.one_shot_flags.visible_row_vec_updated = true;
        }
    }

    fn sort(&self) -> Option<&SortBy> {
        self.grid.sort()
    }

    fn cycle_sort(&mut self, field: &str) {
        self.grid.cycle_sort(field);
        self.one_shot_flags.visible_row_vec_updated = true;
    }

    fn trigger_import(&mut self) {
        if self.persistent_flags.import_running {
            return;
        }
        self.persistent_flags.import_running = true;
        let sync = self.sync.clone();
        self.spawn(async move { Outcome::Imported(sync.trigger_import().await) });
    }

    fn last_import(&self) -> Option<&ImportResult> {
        self.last_import.as_ref()
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl<T: Transport + 'static> TableFrontend for RemoteBackend<T> {
    fn show_cell_view(&self, coord: CellCoord, ui: &mut Ui, _id: Id) {
        let Some(column) = self.grid.columns().get(coord.col_uid) else {
            return;
        };
        let value = self.grid.cell(coord).unwrap_or(&Value::Null);
        cell_view::show_cell(ui, &column.formatter, value);
    }

    fn show_cell_editor(&mut self, coord: CellCoord, ui: &mut Ui, id: Id) -> Option<Response> {
        let column = self.grid.columns().get(coord.col_uid)?;
        let (row_uid, draft) = self.row_edit.as_mut()?;
        if *row_uid != coord.row_uid {
            return None;
        }
        let value = draft.value_mut(&column.field);
        match &column.editor {
            Some(editor) => Some(cell_edit::show_value_editor(editor, value, ui, id)),
            None => {
                cell_view::show_cell(ui, &column.formatter, value);
                None
            }
        }
    }

    fn column_render_config(&mut self, col_uid: ColumnUid) -> TableColumnConfig {
        let width = self
            .grid
            .columns()
            .get(col_uid)
            .and_then(|c| c.width)
            .unwrap_or(DEFAULT_COLUMN_WIDTH);
        TableColumnConfig::initial(width)
            .at_least(3.0 * REM)
            .resizable(true)
            .clip(true)
    }

    fn row_edit(&self) -> Option<RowUid> {
        self.row_edit.as_ref().map(|(row_uid, _)| *row_uid)
    }

    fn start_row_edit(&mut self, row_uid: RowUid) {
        if let Some(record) = self.grid.record(row_uid) {
            self.row_edit = Some((row_uid, record.clone()));
        }
    }

    fn commit_row_edit(&mut self) {
        if let Some((_, record)) = self.row_edit.take() {
            self.save_record(record);
        }
    }

    fn cancel_row_edit(&mut self) {
        self.row_edit = None;
    }
}
