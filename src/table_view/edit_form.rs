use egui::{Grid, Id, Ui};
use grid_core::dispatch::ColumnWidgets;
use grid_core::Record;

use super::cell_edit::show_value_editor;

/// Label + editor per editable column, read-only columns are left out.
pub(crate) fn record_form_ui<'a>(
    columns: impl Iterator<Item = &'a ColumnWidgets>,
    draft: &mut Record,
    ui: &mut Ui,
    id: Id,
) {
    Grid::new(id.with("record_form"))
        .num_columns(2)
        .spacing([12.0, 6.0])
        .striped(true)
        .show(ui, |ui| {
            for column in columns {
                let Some(editor) = &column.editor else {
                    continue;
                };
                ui.label(column.header.as_str());
                let value = draft.value_mut(&column.field);
                show_value_editor(editor, value, ui, id.with(column.field.as_str()));
                ui.end_row();
            }
        });
}
