use egui::{Id, Ui};
use egui_extras::Column as TableColumnConfig;
use grid_core::{CellCoord, ColumnUid, RowUid};

pub trait TableFrontend {
    fn show_cell_view(&self, coord: CellCoord, ui: &mut Ui, id: Id);
    /// Editor of one cell of the row currently being edited.
    fn show_cell_editor(&mut self, coord: CellCoord, ui: &mut Ui, id: Id)
        -> Option<egui::Response>;

    /// Returns the rendering configuration for the column.
    fn column_render_config(&mut self, col_uid: ColumnUid) -> TableColumnConfig {
        let _ = col_uid;
        TableColumnConfig::auto().resizable(true)
    }

    /// Row whose cells are shown with editors.
    fn row_edit(&self) -> Option<RowUid> {
        None
    }
    fn start_row_edit(&mut self, row_uid: RowUid) {
        let _ = row_uid;
    }
    /// Send the edited row to the service.
    fn commit_row_edit(&mut self) {}
    fn cancel_row_edit(&mut self) {}
}
