use egui::Ui;
use grid_core::backend::TableBackend;
use grid_core::RowUid;

use crate::frontend::TableFrontend;

/// Edit / delete buttons of one row, save / cancel while the row is being edited.
/// Returns the row to ask a delete confirmation for.
pub(super) fn tool_column_ui<T: TableFrontend + TableBackend>(
    ui: &mut Ui,
    table: &mut T,
    row_uid: RowUid,
) -> Option<RowUid> {
    let busy = table.persistent_flags().import_running;
    if table.row_edit() == Some(row_uid) {
        if ui.small_button("✔").on_hover_text("Save").clicked() {
            table.commit_row_edit();
        }
        if ui.small_button("✖").on_hover_text("Cancel").clicked() {
            table.cancel_row_edit();
        }
        return None;
    }
    let mut delete = None;
    ui.add_enabled_ui(!busy, |ui| {
        if ui.small_button("✏").on_hover_text("Edit").clicked() {
            table.start_row_edit(row_uid);
        }
        if ui.small_button("🗑").on_hover_text("Delete").clicked() {
            delete = Some(row_uid);
        }
    });
    delete
}
