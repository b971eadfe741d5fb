use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use egui::{ComboBox, DragValue, Id, Response, TextEdit, Ui, Widget};
use egui_extras::DatePickerButton;
use grid_core::dispatch::{format, EditorKind};
use grid_core::{SelectItem, Value};

const NUMBER_DRAG_SPEED: f64 = 0.1;

/// Edits `value` in place, the caller decides when the draft is sent.
pub(crate) fn show_value_editor(
    editor: &EditorKind,
    value: &mut Value,
    ui: &mut Ui,
    id: Id,
) -> Response {
    match editor {
        EditorKind::Numeric { decimals } => {
            let mut n = value.as_f64().unwrap_or(0.0);
            let resp = ui.add(
                DragValue::new(&mut n)
                    .speed(NUMBER_DRAG_SPEED)
                    .max_decimals(*decimals),
            );
            if resp.changed() {
                *value = Value::Number(n);
            }
            resp
        }
        EditorKind::Text => {
            let mut text = value.to_string();
            let resp = TextEdit::singleline(&mut text)
                .desired_width(f32::INFINITY)
                .ui(ui);
            if resp.changed() {
                *value = if text.is_empty() {
                    Value::Null
                } else {
                    Value::Text(text)
                };
            }
            resp
        }
        EditorKind::DateTime => {
            let current = value.as_date();
            let (resp, next) = date_time_edit(current, "Not set", ui, id);
            if let Some(next) = next {
                *value = Value::Date(next);
            }
            resp
        }
        EditorKind::Checkbox => {
            let mut checked = value.as_bool().unwrap_or(false);
            let resp = ui.checkbox(&mut checked, "");
            if resp.changed() {
                *value = Value::Bool(checked);
            }
            resp
        }
        EditorKind::Dropdown(items) => single_select(items, value, ui, id),
        EditorKind::Multiselect(items) => multi_select(items, value, ui, id),
    }
}

/// Midnight UTC of the day `now` falls on, the first value offered for an unset date.
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Date picker plus hour and minute, all in UTC. An unset date shows `placeholder` until it is
/// clicked. Returns the new value once anything changed.
pub(crate) fn date_time_edit(
    current: Option<DateTime<Utc>>,
    placeholder: &str,
    ui: &mut Ui,
    id: Id,
) -> (Response, Option<DateTime<Utc>>) {
    let Some(base) = current else {
        let resp = ui.button(placeholder).on_hover_text("Pick a date");
        let next = resp.clicked().then(|| start_of_day(Utc::now()));
        return (resp, next);
    };
    let mut date: NaiveDate = base.date_naive();
    let mut hour = base.hour();
    let mut minute = base.minute();
    let salt = format!("{:?}", id.with("date"));
    let inner = ui.horizontal(|ui| {
        let mut changed = ui
            .add(DatePickerButton::new(&mut date).id_salt(&salt))
            .changed();
        changed |= ui.add(DragValue::new(&mut hour).range(0..=23)).changed();
        ui.label(":");
        changed |= ui.add(DragValue::new(&mut minute).range(0..=59)).changed();
        changed
    });
    let next = if inner.inner {
        NaiveTime::from_hms_opt(hour, minute, base.second())
            .map(|time| date.and_time(time).and_utc())
    } else {
        None
    };
    (inner.response, next)
}

fn single_select(items: &[SelectItem], value: &mut Value, ui: &mut Ui, id: Id) -> Response {
    ComboBox::from_id_salt(id.with("single_select"))
        .selected_text(format::select_label(items, value))
        .show_ui(ui, |ui| {
            for item in items {
                if ui
                    .selectable_label(*value == item.value, item.label.as_str())
                    .clicked()
                {
                    *value = item.value.clone();
                }
            }
        })
        .response
}

fn multi_select(items: &[SelectItem], value: &mut Value, ui: &mut Ui, id: Id) -> Response {
    let mut selected = match &*value {
        Value::List(list) => list.clone(),
        Value::Null => vec![],
        other => vec![other.clone()],
    };
    let resp = ComboBox::from_id_salt(id.with("multi_select"))
        .selected_text(format::select_label(items, &Value::List(selected.clone())))
        .show_ui(ui, |ui| {
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
            changed
        });
    if resp.inner == Some(true) {
        *value = Value::List(selected);
    }
    resp.response
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unset_dates_start_at_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 42).unwrap();
        assert_eq!(
            start_of_day(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }
}
