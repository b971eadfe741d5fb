use egui::{Label, Ui, Widget};
use grid_core::dispatch::CellFormatter;
use grid_core::Value;

/// Formatted, single line. Elided text shows in full on hover.
pub(crate) fn show_cell(ui: &mut Ui, formatter: &CellFormatter, value: &Value) {
    let text = formatter.format(value);
    if text.is_empty() {
        return;
    }
    Label::new(text).truncate().selectable(false).ui(ui);
}
