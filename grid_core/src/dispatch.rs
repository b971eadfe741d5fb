//! Semantic kind -> (filter widget, cell formatter, editor) table.
//!
//! Built once per ModelSpec and never mutated afterwards. The UI crate matches on the kinds
//! declared here, it never looks at FieldSpec directly when rendering.

use crate::ColumnUid;
use crate::filter::MatchMode;
use crate::spec::{FieldKind, FieldSpec, ModelSpec, SelectItem};
use crate::value::Value;

/// One `rem` in points, widths in the entity specs are written in rems.
pub const REM: f32 = 16.0;

#[derive(Clone, Debug, PartialEq)]
pub enum FilterWidgetKind {
    /// `range`: min/max drafts composed into `[min, max]`, otherwise one exact value.
    Numeric { range: bool },
    Text,
    /// After/before endpoints, each recorded at its own constraint index.
    DateRange,
    Dropdown(Vec<SelectItem>),
    Multiselect(Vec<SelectItem>),
}

impl FilterWidgetKind {
    /// Match modes the user may switch between, empty when the mode is fixed.
    pub fn match_modes(&self) -> &'static [MatchMode] {
        match self {
            FilterWidgetKind::Text => &[MatchMode::Contains, MatchMode::Equals],
            _ => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellFormatter {
    Number { decimals: usize, suffix: String },
    Date,
    YesNo,
    SelectLabel(Vec<SelectItem>),
    Plain,
}

impl CellFormatter {
    pub fn format(&self, value: &Value) -> String {
        match self {
            CellFormatter::Number { decimals, suffix } => format::number(value, *decimals, suffix),
            CellFormatter::Date => format::date(value),
            CellFormatter::YesNo => format::yes_no(value).to_string(),
            CellFormatter::SelectLabel(items) => format::select_label(items, value),
            CellFormatter::Plain => value.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditorKind {
    Numeric { decimals: usize },
    Text,
    DateTime,
    Checkbox,
    Dropdown(Vec<SelectItem>),
    Multiselect(Vec<SelectItem>),
}

/// Everything needed to render one column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnWidgets {
    pub field: String,
    pub header: String,
    pub width: Option<f32>,
    pub frozen: bool,
    pub filter: FilterWidgetKind,
    pub formatter: CellFormatter,
    /// None for read-only columns and the data key, which the service assigns.
    pub editor: Option<EditorKind>,
}

pub fn yes_no_items() -> Vec<SelectItem> {
    vec![SelectItem::new("Yes", true), SelectItem::new("No", false)]
}

/// Widget triple of one field, hidden fields get nothing.
pub fn widgets_for(field: &str, spec: &FieldSpec) -> Option<ColumnWidgets> {
    if spec.is_hidden {
        return None;
    }
    let decimals = spec.decimal_places.unwrap_or(0);
    let (filter, formatter, editor) = match spec.kind {
        FieldKind::Id | FieldKind::Number => (
            FilterWidgetKind::Numeric {
                range: spec.kind == FieldKind::Number,
            },
            CellFormatter::Number {
                decimals,
                suffix: spec.display_suffix.clone().unwrap_or_default(),
            },
            EditorKind::Numeric { decimals },
        ),
        FieldKind::Text => (FilterWidgetKind::Text, CellFormatter::Plain, EditorKind::Text),
        FieldKind::Date => (
            FilterWidgetKind::DateRange,
            CellFormatter::Date,
            EditorKind::DateTime,
        ),
        FieldKind::Boolean => (
            FilterWidgetKind::Dropdown(yes_no_items()),
            CellFormatter::YesNo,
            EditorKind::Checkbox,
        ),
        FieldKind::Dropdown => (
            FilterWidgetKind::Dropdown(spec.select_items.clone()),
            CellFormatter::SelectLabel(spec.select_items.clone()),
            EditorKind::Dropdown(spec.select_items.clone()),
        ),
        FieldKind::Multiselect => (
            FilterWidgetKind::Multiselect(spec.select_items.clone()),
            CellFormatter::SelectLabel(spec.select_items.clone()),
            EditorKind::Multiselect(spec.select_items.clone()),
        ),
    };
    Some(ColumnWidgets {
        field: field.to_string(),
        header: ModelSpec::header_text(field),
        width: spec.width,
        frozen: spec.frozen,
        filter,
        formatter,
        editor: (!spec.is_read_only && !spec.is_data_key).then_some(editor),
    })
}

/// Rendered columns of one ModelSpec, keyed by the field position in the spec.
#[derive(Clone, Debug, Default)]
pub struct ColumnSet {
    columns: Vec<(ColumnUid, ColumnWidgets)>,
}

impl ColumnSet {
    pub fn new(spec: &ModelSpec) -> Self {
        let columns = spec
            .fields()
            .enumerate()
            .filter_map(|(idx, (field, field_spec))| {
                widgets_for(field, field_spec).map(|w| (ColumnUid(idx as u32), w))
            })
            .collect();
        ColumnSet { columns }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnUid, &ColumnWidgets)> {
        self.columns.iter().map(|(uid, w)| (*uid, w))
    }

    pub fn get(&self, col_uid: ColumnUid) -> Option<&ColumnWidgets> {
        self.columns
            .iter()
            .find(|(uid, _)| *uid == col_uid)
            .map(|(_, w)| w)
    }

    pub fn by_field(&self, field: &str) -> Option<(ColumnUid, &ColumnWidgets)> {
        self.iter().find(|(_, w)| w.field == field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Display order, frozen columns first when `freeze` is set, spec order otherwise.
    pub fn ordered(&self, freeze: bool) -> Vec<ColumnUid> {
        let (mut frozen, rest): (Vec<_>, Vec<_>) = self
            .columns
            .iter()
            .partition(|(_, w)| freeze && w.frozen);
        frozen.extend(rest);
        frozen.into_iter().map(|(uid, _)| *uid).collect()
    }
}

/// Pure cell formatters.
pub mod format {
    use itertools::Itertools;

    use crate::spec::SelectItem;
    use crate::value::Value;

    pub const DATE_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

    /// en-US grouping, at most `decimals` fraction digits, trailing zeros dropped.
    pub fn number(value: &Value, decimals: usize, suffix: &str) -> String {
        let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
            return String::new();
        };
        let fixed = format!("{n:.decimals$}");
        let fixed = if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            fixed
        };
        let (negative, unsigned) = match fixed.strip_prefix('-') {
            Some(rest) => (rest.chars().any(|c| c != '0' && c != '.'), rest),
            None => (false, fixed.as_str()),
        };
        let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let digits = int.chars().collect::<Vec<_>>();
        let grouped = digits
            .rchunks(3)
            .rev()
            .map(|chunk| chunk.iter().collect::<String>())
            .join(",");
        let mut out = String::with_capacity(fixed.len() + suffix.len() + 4);
        if negative {
            out.push('-');
        }
        out.push_str(&grouped);
        if !frac.is_empty() {
            out.push('.');
            out.push_str(frac);
        }
        out.push_str(suffix);
        out
    }

    /// `yyyy-MM-dd HH:mm:ss` in UTC.
    pub fn date(value: &Value) -> String {
        value
            .as_date()
            .map(|d| d.format(DATE_PATTERN).to_string())
            .unwrap_or_default()
    }

    pub fn yes_no(value: &Value) -> &'static str {
        if value.as_bool() == Some(true) { "Y" } else { "N" }
    }

    /// Label of the matching item, the raw value when nothing matches.
    pub fn select_label(items: &[SelectItem], value: &Value) -> String {
        let label = |v: &Value| {
            items
                .iter()
                .find(|item| &item.value == v)
                .map(|item| item.label.clone())
                .unwrap_or_else(|| v.to_string())
        };
        match value {
            Value::List(values) => values.iter().map(label).join(", "),
            other => label(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::coerce;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(1234.5, 2, "", "1,234.5")]
    #[case(1234.567, 2, "", "1,234.57")]
    #[case(1_000_000.0, 0, "", "1,000,000")]
    #[case(950.0, 0, " km", "950 km")]
    #[case(-12345.0, 0, "", "-12,345")]
    #[case(0.4, 0, "", "0")]
    #[case(1.0, 1, "", "1")]
    fn number_formatting(
        #[case] n: f64,
        #[case] decimals: usize,
        #[case] suffix: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(format::number(&Value::Number(n), decimals, suffix), expected);
    }

    #[test]
    fn number_formatter_ignores_non_numbers() {
        assert_eq!(format::number(&Value::Null, 2, " km"), "");
        assert_eq!(format::number(&Value::from("unknown"), 2, ""), "");
    }

    #[test]
    fn date_round_trip() {
        let spec = FieldSpec::date();
        let value = coerce("created", &spec, &json!("2024-03-01T10:15:00Z")).unwrap();
        assert_eq!(format::date(&value), "2024-03-01 10:15:00");
    }

    #[test]
    fn select_label_falls_back_to_raw() {
        let items = vec![SelectItem::new("Starfighter", "sf")];
        assert_eq!(format::select_label(&items, &Value::from("sf")), "Starfighter");
        assert_eq!(format::select_label(&items, &Value::from("x")), "x");
        assert_eq!(
            format::select_label(&items, &Value::List(vec!["sf".into(), "x".into()])),
            "Starfighter, x"
        );
    }

    #[test]
    fn yes_no() {
        assert_eq!(format::yes_no(&Value::Bool(true)), "Y");
        assert_eq!(format::yes_no(&Value::Bool(false)), "N");
        assert_eq!(format::yes_no(&Value::Null), "N");
    }

    #[test]
    fn dispatch_per_kind() {
        let id = widgets_for("starship_id", &FieldSpec::id().data_key()).unwrap();
        assert_eq!(id.filter, FilterWidgetKind::Numeric { range: false });
        assert_eq!(id.header, "Starship Id");

        let length = widgets_for("length", &FieldSpec::number().decimals(2).suffix(" m")).unwrap();
        assert_eq!(length.filter, FilterWidgetKind::Numeric { range: true });
        assert_eq!(
            length.formatter,
            CellFormatter::Number {
                decimals: 2,
                suffix: " m".into()
            }
        );
        assert_eq!(length.editor, Some(EditorKind::Numeric { decimals: 2 }));

        let flag = widgets_for("active", &FieldSpec::boolean()).unwrap();
        assert_eq!(flag.filter, FilterWidgetKind::Dropdown(yes_no_items()));
        assert_eq!(flag.formatter, CellFormatter::YesNo);
        assert_eq!(flag.editor, Some(EditorKind::Checkbox));

        let created = widgets_for("created", &FieldSpec::date()).unwrap();
        assert_eq!(created.filter, FilterWidgetKind::DateRange);
        assert_eq!(created.editor, Some(EditorKind::DateTime));
    }

    #[test]
    fn read_only_columns_get_no_editor() {
        let w = widgets_for("edited", &FieldSpec::date().read_only()).unwrap();
        assert_eq!(w.editor, None);
    }

    #[test]
    fn data_key_is_never_editable() {
        let spec = ModelSpec::new([
            ("starship_id", FieldSpec::id().data_key()),
            ("name", FieldSpec::text()),
            ("length", FieldSpec::number().decimals(2)),
        ]);
        let columns = ColumnSet::new(&spec);
        let (_, key) = columns.by_field("starship_id").unwrap();
        assert_eq!(key.editor, None);
        let (_, name) = columns.by_field("name").unwrap();
        assert_eq!(name.editor, Some(EditorKind::Text));
    }

    #[test]
    fn hidden_fields_are_not_rendered() {
        let spec = ModelSpec::new([
            ("x_id", FieldSpec::id().data_key()),
            ("secret", FieldSpec::text().hidden()),
            ("name", FieldSpec::text()),
        ]);
        let columns = ColumnSet::new(&spec);
        assert_eq!(columns.len(), 2);
        assert!(columns.by_field("secret").is_none());
        assert_eq!(columns.by_field("name").map(|(uid, _)| uid), Some(ColumnUid(2)));
    }

    #[test]
    fn frozen_columns_come_first() {
        let spec = ModelSpec::new([
            ("x_id", FieldSpec::id().data_key()),
            ("model", FieldSpec::text()),
            ("name", FieldSpec::text().frozen()),
        ]);
        let columns = ColumnSet::new(&spec);
        assert_eq!(
            columns.ordered(true),
            vec![ColumnUid(2), ColumnUid(0), ColumnUid(1)]
        );
        assert_eq!(
            columns.ordered(false),
            vec![ColumnUid(0), ColumnUid(1), ColumnUid(2)]
        );
    }
}
