use std::collections::HashMap;

use egui::{Color32, ComboBox, Id, TextEdit, Ui, Widget};
use grid_core::dispatch::{ColumnWidgets, FilterWidgetKind, REM};
use grid_core::filter::FilterValue;
use grid_core::{FilterCommand, FilterController, MatchMode, Operator, SelectItem, Value};
use strum::IntoEnumIterator;

use super::cell_edit::date_time_edit;

/// Text typed into filter inputs, keyed by field and slot. Seeded from the pending or applied
/// value the first time an input is shown, forgotten on apply and clear.
#[derive(Default)]
pub(crate) struct FilterDrafts {
    text: HashMap<(String, usize), String>,
}

impl FilterDrafts {
    fn text_mut(&mut self, field: &str, slot: usize, seed: impl FnOnce() -> String) -> &mut String {
        self.text
            .entry((field.to_string(), slot))
            .or_insert_with(seed)
    }

    pub(crate) fn forget(&mut self, field: &str) {
        self.text.retain(|(f, _), _| f != field);
    }

    pub(crate) fn clear(&mut self) {
        self.text.clear();
    }
}

/// What the user asked for this frame.
#[derive(Default)]
pub(crate) struct FilterPanelOutput {
    pub(crate) commands: Vec<FilterCommand>,
    pub(crate) close: bool,
}

/// Pending edit when there is one, applied value otherwise.
fn shown_value<'a>(
    filters: &'a FilterController,
    field: &str,
    index: usize,
) -> Option<&'a FilterValue> {
    filters
        .pending()
        .pending(field, index)
        .or_else(|| filters.state().field(field)?.value(index))
}

fn number_text(n: f64) -> String {
    if n.is_finite() {
        Value::Number(n).to_string()
    } else {
        String::new()
    }
}

/// Empty input is `None`, unparsable or non-finite input is `Err`.
fn parse_number(s: &str) -> Result<Option<f64>, ()> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    match s.replace(',', "").parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(()),
    }
}

pub(crate) fn filter_panel_ui(
    column: &ColumnWidgets,
    filters: &FilterController,
    drafts: &mut FilterDrafts,
    ui: &mut Ui,
    id: Id,
) -> FilterPanelOutput {
    let field = column.field.as_str();
    let mut out = FilterPanelOutput::default();

    match &column.filter {
        FilterWidgetKind::Numeric { range: true } => {
            let (min, max) = match shown_value(filters, field, 0) {
                Some(FilterValue::Range(min, max)) => (*min, *max),
                _ => (f64::NEG_INFINITY, f64::INFINITY),
            };
            let mut edited = false;
            ui.horizontal(|ui| {
                edited |= number_input(drafts.text_mut(field, 0, || number_text(min)), "Min", ui);
                ui.label("to");
                edited |= number_input(drafts.text_mut(field, 1, || number_text(max)), "Max", ui);
            });
            if edited {
                let min = parse_number(drafts.text_mut(field, 0, String::new));
                let max = parse_number(drafts.text_mut(field, 1, String::new));
                if let (Ok(min), Ok(max)) = (min, max) {
                    out.commands
                        .push(FilterCommand::edit(field, 0, FilterValue::range(min, max)));
                }
            }
        }
        FilterWidgetKind::Numeric { range: false } => {
            let seed = match shown_value(filters, field, 0) {
                Some(FilterValue::Number(n)) => number_text(*n),
                _ => String::new(),
            };
            if number_input(drafts.text_mut(field, 0, || seed), "Equals", ui) {
                if let Ok(n) = parse_number(drafts.text_mut(field, 0, String::new)) {
                    let value = n.map(FilterValue::Number).unwrap_or_default();
                    out.commands.push(FilterCommand::edit(field, 0, value));
                }
            }
        }
        FilterWidgetKind::Text => {
            let applied = filters
                .state()
                .field(field)
                .and_then(|f| f.constraints().first())
                .map(|c| c.match_mode);
            let shown = filters.pending().pending_match_mode(field, 0).or(applied);
            if let Some(current) = shown {
                match_mode_ui(&column.filter, field, current, &mut out, ui, id);
            }
            let seed = match shown_value(filters, field, 0) {
                Some(FilterValue::Text(s)) => s.clone(),
                _ => String::new(),
            };
            let text = drafts.text_mut(field, 0, || seed);
            let resp = TextEdit::singleline(&mut *text)
                .hint_text("Search")
                .desired_width(12.0 * REM)
                .ui(ui);
            if resp.changed() {
                let value = if text.is_empty() {
                    FilterValue::Empty
                } else {
                    FilterValue::Text(text.clone())
                };
                out.commands.push(FilterCommand::edit(field, 0, value));
            }
            if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                out.commands.push(FilterCommand::apply(field));
                out.close = true;
            }
        }
        FilterWidgetKind::DateRange => {
            let applied = filters.state().field(field).map(|f| f.operator());
            if let Some(operator) = filters.pending().pending_operator(field).or(applied) {
                operator_ui(field, operator, &mut out, ui, id);
            }
            for (index, label) in [(0, "After"), (1, "Before")] {
                let current = match shown_value(filters, field, index) {
                    Some(FilterValue::Date(d)) => Some(*d),
                    _ => None,
                };
                ui.horizontal(|ui| {
                    ui.label(label);
                    let (_, next) = date_time_edit(current, "Any", ui, id.with(index));
                    if let Some(next) = next {
                        out.commands
                            .push(FilterCommand::edit(field, index, FilterValue::Date(next)));
                    }
                    if current.is_some() && ui.small_button("✖").clicked() {
                        out.commands
                            .push(FilterCommand::edit(field, index, FilterValue::Empty));
                    }
                });
            }
        }
        FilterWidgetKind::Dropdown(items) => {
            let current = match shown_value(filters, field, 0) {
                Some(FilterValue::Item(v)) => Some(v),
                _ => None,
            };
            if let Some(next) = dropdown_ui(items, current, ui, id) {
                out.commands.push(FilterCommand::edit(field, 0, next));
            }
        }
        FilterWidgetKind::Multiselect(items) => {
            let mut selected = match shown_value(filters, field, 0) {
                Some(FilterValue::Items(values)) => values.clone(),
                _ => vec![],
            };
            let mut changed = false;
            for item in items {
                let mut checked = selected.contains(&item.value);
                if ui.checkbox(&mut checked, item.label.as_str()).changed() {
                    changed = true;
                    if checked {
                        selected.push(item.value.clone());
                    } else {
                        selected.retain(|v| v != &item.value);
                    }
                }
            }
            if changed {
                let value = if selected.is_empty() {
                    FilterValue::Empty
                } else {
                    FilterValue::Items(selected)
                };
                out.commands.push(FilterCommand::edit(field, 0, value));
            }
        }
    }

    ui.separator();
    ui.horizontal(|ui| {
        let has_pending = filters.pending().has_pending(field);
        if ui
            .add_enabled(has_pending, egui::Button::new("Apply"))
            .clicked()
        {
            out.commands.push(FilterCommand::apply(field));
            out.close = true;
        }
        if ui.button("Clear").clicked() {
            out.commands.push(FilterCommand::clear(field));
            out.close = true;
        }
    });
    if out.close {
        drafts.forget(field);
    }
    out
}

/// Returns true when the text changed.
fn number_input(text: &mut String, hint: &str, ui: &mut Ui) -> bool {
    let valid = parse_number(text).is_ok();
    let mut edit = TextEdit::singleline(text)
        .hint_text(hint)
        .desired_width(6.0 * REM);
    if !valid {
        edit = edit.text_color(Color32::LIGHT_RED);
    }
    edit.ui(ui).changed()
}

fn match_mode_ui(
    kind: &FilterWidgetKind,
    field: &str,
    current: MatchMode,
    out: &mut FilterPanelOutput,
    ui: &mut Ui,
    id: Id,
) {
    let modes = kind.match_modes();
    if modes.is_empty() {
        return;
    }
    let mut selected = current;
    ComboBox::from_id_salt(id.with("match_mode"))
        .selected_text(selected.to_string())
        .show_ui(ui, |ui| {
            for mode in modes {
                ui.selectable_value(&mut selected, *mode, mode.to_string());
            }
        });
    if selected != current {
        out.commands.push(FilterCommand::EditMatchMode {
            field: field.to_string(),
            index: 0,
            match_mode: selected,
        });
    }
}

fn operator_ui(field: &str, current: Operator, out: &mut FilterPanelOutput, ui: &mut Ui, id: Id) {
    let mut selected = current;
    ComboBox::from_id_salt(id.with("operator"))
        .selected_text(selected.to_string())
        .show_ui(ui, |ui| {
            for operator in Operator::iter() {
                ui.selectable_value(&mut selected, operator, operator.to_string());
            }
        });
    if selected != current {
        out.commands.push(FilterCommand::EditOperator {
            field: field.to_string(),
            operator: selected,
        });
    }
}

/// `Any` clears the constraint.
fn dropdown_ui(
    items: &[SelectItem],
    current: Option<&Value>,
    ui: &mut Ui,
    id: Id,
) -> Option<FilterValue> {
    let selected_text = current
        .and_then(|v| items.iter().find(|item| &item.value == v))
        .map(|item| item.label.as_str())
        .unwrap_or("Any");
    let mut next = None;
    ComboBox::from_id_salt(id.with("dropdown"))
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            if ui.selectable_label(current.is_none(), "Any").clicked() {
                next = Some(FilterValue::Empty);
            }
            for item in items {
                if ui
                    .selectable_label(current == Some(&item.value), item.label.as_str())
                    .clicked()
                {
                    next = Some(FilterValue::Item(item.value.clone()));
                }
            }
        });
    next
}
