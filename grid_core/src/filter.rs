use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::record::Record;
use crate::spec::{FieldKind, FieldSpec, ModelSpec};
use crate::value::Value;

/// Key of the keyword search entry in the filter map.
pub const GLOBAL: &str = "global";

#[derive(
    strum::EnumIter,
    strum::Display,
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    #[strum(to_string = "Match All")]
    And,
    #[strum(to_string = "Match Any")]
    Or,
}

#[derive(
    strum::EnumIter,
    strum::Display,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    #[strum(to_string = "Equals")]
    Equals,
    #[strum(to_string = "Contains")]
    Contains,
    #[strum(to_string = "Between")]
    Between,
    #[strum(to_string = "In")]
    In,
    #[strum(to_string = "Date is after")]
    DateAfter,
    #[strum(to_string = "Date is before")]
    DateBefore,
}

/// Value side of a constraint.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FilterValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// Inclusive `[min, max]`, unbounded ends are infinities.
    Range(f64, f64),
    Date(DateTime<Utc>),
    Bool(bool),
    Item(Value),
    Items(Vec<Value>),
}

impl FilterValue {
    pub const UNBOUNDED: FilterValue = FilterValue::Range(f64::NEG_INFINITY, f64::INFINITY);

    /// Range from optional ends, missing ends become infinities.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FilterValue::Range(min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY))
    }

    /// Inactive values let every record through.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Empty => false,
            FilterValue::Text(s) => !s.is_empty(),
            FilterValue::Range(min, max) => min.is_finite() || max.is_finite(),
            FilterValue::Item(v) => !v.is_empty(),
            FilterValue::Items(items) => !items.is_empty(),
            FilterValue::Number(_) | FilterValue::Date(_) | FilterValue::Bool(_) => true,
        }
    }

    fn as_text(&self) -> String {
        match self {
            FilterValue::Empty => String::new(),
            FilterValue::Text(s) => s.clone(),
            FilterValue::Number(n) => Value::Number(*n).to_string(),
            FilterValue::Range(min, max) => format!("{min}..{max}"),
            FilterValue::Date(d) => Value::Date(*d).to_string(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Item(v) => v.to_string(),
            FilterValue::Items(items) => Value::List(items.clone()).to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterConstraint {
    pub value: FilterValue,
    pub match_mode: MatchMode,
}

impl FilterConstraint {
    pub fn new(value: FilterValue, match_mode: MatchMode) -> Self {
        FilterConstraint { value, match_mode }
    }

    pub fn empty(match_mode: MatchMode) -> Self {
        Self::new(FilterValue::Empty, match_mode)
    }

    pub fn is_active(&self) -> bool {
        self.value.is_active()
    }

    /// Whether `cell` passes this constraint. Inactive constraints always pass.
    pub fn matches(&self, cell: &Value) -> bool {
        if !self.is_active() {
            return true;
        }
        match self.match_mode {
            MatchMode::Equals => equals(&self.value, cell),
            MatchMode::Contains => {
                if cell.is_null() {
                    return false;
                }
                let needle = self.value.as_text().to_lowercase();
                cell.to_string().to_lowercase().contains(&needle)
            }
            MatchMode::Between => match (&self.value, cell) {
                (FilterValue::Range(min, max), Value::Number(c)) => *min <= *c && *c <= *max,
                (FilterValue::Number(n), Value::Number(c)) => n == c,
                _ => false,
            },
            MatchMode::In => {
                let items: &[Value] = match &self.value {
                    FilterValue::Items(items) => items,
                    FilterValue::Item(item) => std::slice::from_ref(item),
                    _ => return equals(&self.value, cell),
                };
                match cell {
                    Value::List(cell_items) => cell_items.iter().any(|c| items.contains(c)),
                    other => items.contains(other),
                }
            }
            MatchMode::DateAfter => match (&self.value, cell) {
                (FilterValue::Date(d), Value::Date(c)) => c > d,
                _ => false,
            },
            MatchMode::DateBefore => match (&self.value, cell) {
                (FilterValue::Date(d), Value::Date(c)) => c < d,
                _ => false,
            },
        }
    }
}

fn equals(filter: &FilterValue, cell: &Value) -> bool {
    match (filter, cell) {
        (_, Value::Null) => false,
        (FilterValue::Number(n), Value::Number(c)) => n == c,
        (FilterValue::Bool(b), Value::Bool(c)) => b == c,
        (FilterValue::Date(d), Value::Date(c)) => d == c,
        (FilterValue::Item(v), c) if v == c => true,
        (f, c) => f.as_text().to_lowercase() == c.to_string().to_lowercase(),
    }
}

/// Applied filter of one field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldFilterState {
    /// id, text, date
    Constraints {
        operator: Operator,
        constraints: Vec<FilterConstraint>,
    },
    /// number, dropdown, multiselect, boolean. The operator has no effect with a single
    /// constraint, it is kept so that both forms report one.
    Single {
        operator: Operator,
        constraint: FilterConstraint,
    },
}

impl FieldFilterState {
    pub fn operator(&self) -> Operator {
        match self {
            FieldFilterState::Constraints { operator, .. } => *operator,
            FieldFilterState::Single { operator, .. } => *operator,
        }
    }

    pub fn constraints(&self) -> &[FilterConstraint] {
        match self {
            FieldFilterState::Constraints { constraints, .. } => constraints,
            FieldFilterState::Single { constraint, .. } => std::slice::from_ref(constraint),
        }
    }

    pub fn constraint_mut(&mut self, index: usize) -> Option<&mut FilterConstraint> {
        match self {
            FieldFilterState::Constraints { constraints, .. } => constraints.get_mut(index),
            FieldFilterState::Single { constraint, .. } => Some(constraint),
        }
    }

    /// Value of constraint `index`, the single form ignores the index.
    pub fn value(&self, index: usize) -> Option<&FilterValue> {
        match self {
            FieldFilterState::Constraints { constraints, .. } => {
                constraints.get(index).map(|c| &c.value)
            }
            FieldFilterState::Single { constraint, .. } => Some(&constraint.value),
        }
    }

    pub fn set_match_mode(&mut self, index: usize, match_mode: MatchMode) {
        if let Some(constraint) = self.constraint_mut(index) {
            constraint.match_mode = match_mode;
        }
    }

    pub fn set_operator(&mut self, operator: Operator) {
        match self {
            FieldFilterState::Constraints { operator: op, .. }
            | FieldFilterState::Single { operator: op, .. } => *op = operator,
        }
    }

    pub fn is_active(&self) -> bool {
        self.constraints().iter().any(FilterConstraint::is_active)
    }

    pub fn matches(&self, cell: &Value) -> bool {
        let mut active = self.constraints().iter().filter(|c| c.is_active()).peekable();
        if active.peek().is_none() {
            return true;
        }
        match self.operator() {
            Operator::And => active.all(|c| c.matches(cell)),
            Operator::Or => active.any(|c| c.matches(cell)),
        }
    }
}

/// Commit function stored with a pending edit, writes the value into the applied state.
pub type CommitFn = fn(&mut FieldFilterState, FilterValue, usize);

/// Standard commit: replace the value of constraint `index`.
pub fn commit_value(state: &mut FieldFilterState, value: FilterValue, index: usize) {
    if let Some(constraint) = state.constraint_mut(index) {
        constraint.value = value;
    }
}

/// The complete filter map: keyword search plus one entry per field.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterMeta {
    pub global: FilterConstraint,
    pub fields: IndexMap<String, FieldFilterState>,
}

impl FilterMeta {
    pub fn get(&self, field: &str) -> Option<&FieldFilterState> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldFilterState> {
        self.fields.get_mut(field)
    }

    /// Number of entries including `global`.
    pub fn entry_count(&self) -> usize {
        self.fields.len() + 1
    }

    pub fn matches(&self, spec: &ModelSpec, record: &Record) -> bool {
        if self.global.is_active() {
            let hit = spec
                .global_filter_fields()
                .into_iter()
                .any(|field| self.global.matches(record.get_or_null(field)));
            if !hit {
                return false;
            }
        }
        self.fields
            .iter()
            .all(|(field, state)| state.matches(record.get_or_null(field)))
    }
}

/// Default constraint(s) for a kind, the date kind gets an after/before pair.
pub fn default_constraints(kind: FieldKind) -> Vec<FilterConstraint> {
    match kind {
        FieldKind::Id => vec![FilterConstraint::empty(MatchMode::Equals)],
        FieldKind::Text => vec![FilterConstraint::empty(MatchMode::Contains)],
        FieldKind::Number => vec![FilterConstraint::new(
            FilterValue::UNBOUNDED,
            MatchMode::Between,
        )],
        FieldKind::Date => vec![
            FilterConstraint::empty(MatchMode::DateAfter),
            FilterConstraint::empty(MatchMode::DateBefore),
        ],
        FieldKind::Dropdown => vec![FilterConstraint::empty(MatchMode::Equals)],
        FieldKind::Multiselect => vec![FilterConstraint::empty(MatchMode::In)],
        FieldKind::Boolean => vec![FilterConstraint::empty(MatchMode::Equals)],
    }
}

/// Dropdown and boolean default to OR, everything else to AND.
pub fn default_operator(kind: FieldKind) -> Operator {
    match kind {
        FieldKind::Dropdown | FieldKind::Boolean => Operator::Or,
        _ => Operator::And,
    }
}

fn default_field_state(spec: &FieldSpec) -> FieldFilterState {
    let operator = spec.operator_override.unwrap_or(default_operator(spec.kind));
    let mut constraints = default_constraints(spec.kind);
    if let (Some(mode), [single]) = (spec.match_mode_override, constraints.as_mut_slice()) {
        single.match_mode = mode;
    }
    match spec.kind {
        FieldKind::Id | FieldKind::Text | FieldKind::Date => FieldFilterState::Constraints {
            operator,
            constraints,
        },
        _ => FieldFilterState::Single {
            operator,
            constraint: constraints.remove(0),
        },
    }
}

/// Default filter map of a ModelSpec.
pub fn build_defaults(spec: &ModelSpec) -> Result<FilterMeta, ConfigurationError> {
    spec.data_key_of()?;
    let fields = spec
        .fields()
        .map(|(name, field_spec)| (name.to_string(), default_field_state(field_spec)))
        .collect();
    Ok(FilterMeta {
        global: FilterConstraint::empty(MatchMode::Contains),
        fields,
    })
}

/// Applied filter state of one grid.
#[derive(Clone, Debug)]
pub struct FilterState {
    defaults: FilterMeta,
    current: FilterMeta,
    global_text: String,
}

impl FilterState {
    pub fn new(spec: &ModelSpec) -> Result<Self, ConfigurationError> {
        let defaults = build_defaults(spec)?;
        Ok(FilterState {
            current: defaults.clone(),
            defaults,
            global_text: String::new(),
        })
    }

    pub fn current(&self) -> &FilterMeta {
        &self.current
    }

    pub fn defaults(&self) -> &FilterMeta {
        &self.defaults
    }

    pub fn global_text(&self) -> &str {
        &self.global_text
    }

    pub fn field(&self, field: &str) -> Option<&FieldFilterState> {
        self.current.get(field)
    }

    pub fn is_active(&self, field: &str) -> bool {
        self.current.get(field).is_some_and(FieldFilterState::is_active)
    }

    /// Replace the whole map, no merge.
    pub fn set_filter_state(&mut self, next: FilterMeta) {
        trace!("filters replaced ({} entries)", next.entry_count());
        self.current = next;
    }

    pub fn set_global(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        self.global_text = text.to_string();
        let mut next = self.current.clone();
        next.global.value = if text.is_empty() {
            FilterValue::Empty
        } else {
            FilterValue::Text(text.to_string())
        };
        self.set_filter_state(next);
    }

    /// Restore one field to its default, everything else is kept.
    pub fn reset_field(&mut self, field: &str) -> Result<(), ConfigurationError> {
        let default = self
            .defaults
            .get(field)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownField(field.to_string()))?;
        let mut next = self.current.clone();
        next.fields.insert(field.to_string(), default);
        self.set_filter_state(next);
        Ok(())
    }

    pub fn clear_all(&mut self) {
        debug!("clearing all filters");
        self.current = self.defaults.clone();
        self.global_text.clear();
    }

    /// Mutate the applied state of one field in place, `None` for unknown fields.
    pub(crate) fn update_field<R>(
        &mut self,
        field: &str,
        update: impl FnOnce(&mut FieldFilterState) -> R,
    ) -> Option<R> {
        self.current.get_mut(field).map(update)
    }

    pub fn matches(&self, spec: &ModelSpec, record: &Record) -> bool {
        self.current.matches(spec, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{FieldSpec, SelectItem};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn starship() -> ModelSpec {
        ModelSpec::new([
            ("starship_id", FieldSpec::id().data_key()),
            ("name", FieldSpec::text()),
            ("length", FieldSpec::number().decimals(2)),
        ])
    }

    fn all_kinds() -> ModelSpec {
        ModelSpec::new([
            ("thing_id", FieldSpec::id().data_key()),
            ("name", FieldSpec::text()),
            ("mass", FieldSpec::number()),
            ("created", FieldSpec::date()),
            ("active", FieldSpec::boolean()),
            ("class", FieldSpec::dropdown([SelectItem::new("A", "a")])),
            ("tags", FieldSpec::multiselect([SelectItem::new("X", "x")])),
        ])
    }

    #[test]
    fn starship_defaults() {
        let meta = build_defaults(&starship()).unwrap();
        assert_eq!(meta.global, FilterConstraint::empty(MatchMode::Contains));
        assert_eq!(
            meta.get("starship_id"),
            Some(&FieldFilterState::Constraints {
                operator: Operator::And,
                constraints: vec![FilterConstraint::empty(MatchMode::Equals)],
            })
        );
        assert_eq!(
            meta.get("name"),
            Some(&FieldFilterState::Constraints {
                operator: Operator::And,
                constraints: vec![FilterConstraint::empty(MatchMode::Contains)],
            })
        );
        assert_eq!(
            meta.get("length").unwrap().constraints(),
            &[FilterConstraint::new(FilterValue::UNBOUNDED, MatchMode::Between)]
        );
    }

    #[test]
    fn one_entry_per_field_plus_global() {
        let spec = all_kinds();
        let meta = build_defaults(&spec).unwrap();
        assert_eq!(meta.entry_count(), spec.len() + 1);
        assert!(spec.field_names().all(|f| meta.get(f).is_some()));
    }

    #[test]
    fn defaults_require_single_data_key() {
        let spec = ModelSpec::new([("name", FieldSpec::text())]);
        assert_eq!(build_defaults(&spec), Err(ConfigurationError::NoDataKey));
    }

    #[rstest]
    #[case("thing_id", Operator::And, 1)]
    #[case("name", Operator::And, 1)]
    #[case("created", Operator::And, 2)]
    #[case("class", Operator::Or, 1)]
    #[case("active", Operator::Or, 1)]
    #[case("tags", Operator::And, 1)]
    fn default_operator_and_constraint_count(
        #[case] field: &str,
        #[case] operator: Operator,
        #[case] count: usize,
    ) {
        let meta = build_defaults(&all_kinds()).unwrap();
        let state = meta.get(field).unwrap();
        assert_eq!(state.operator(), operator);
        assert_eq!(state.constraints().len(), count);
    }

    #[test]
    fn date_constraints_are_after_then_before() {
        let meta = build_defaults(&all_kinds()).unwrap();
        let modes = meta
            .get("created")
            .unwrap()
            .constraints()
            .iter()
            .map(|c| c.match_mode)
            .collect::<Vec<_>>();
        assert_eq!(modes, vec![MatchMode::DateAfter, MatchMode::DateBefore]);
    }

    #[test]
    fn overrides_replace_defaults() {
        let spec = ModelSpec::new([
            ("x_id", FieldSpec::id().data_key()),
            ("name", FieldSpec::text().operator(Operator::Or).match_mode(MatchMode::Equals)),
        ]);
        let meta = build_defaults(&spec).unwrap();
        assert_eq!(
            meta.get("name"),
            Some(&FieldFilterState::Constraints {
                operator: Operator::Or,
                constraints: vec![FilterConstraint::empty(MatchMode::Equals)],
            })
        );
    }

    #[test]
    fn clear_all_restores_defaults_and_global_text() {
        let spec = starship();
        let mut state = FilterState::new(&spec).unwrap();
        state.set_global("wing");
        state.update_field("length", |s| commit_value(s, FilterValue::range(Some(10.0), None), 0));
        assert!(state.is_active("length"));
        state.clear_all();
        assert_eq!(state.current(), state.defaults());
        assert_eq!(state.global_text(), "");
    }

    #[test]
    fn reset_field_keeps_other_fields() {
        let spec = starship();
        let mut state = FilterState::new(&spec).unwrap();
        state.update_field("name", |s| commit_value(s, FilterValue::Text("x".into()), 0));
        state.update_field("length", |s| commit_value(s, FilterValue::range(Some(1.0), None), 0));
        state.reset_field("length").unwrap();
        assert!(!state.is_active("length"));
        assert!(state.is_active("name"));
        assert_eq!(
            state.reset_field("nope"),
            Err(ConfigurationError::UnknownField("nope".into()))
        );
    }

    #[test]
    fn unbounded_range_is_inactive() {
        let c = FilterConstraint::new(FilterValue::UNBOUNDED, MatchMode::Between);
        assert!(!c.is_active());
        assert!(c.matches(&Value::Null));
        let c = FilterConstraint::new(FilterValue::range(Some(10.0), None), MatchMode::Between);
        assert!(c.matches(&Value::Number(10.0)));
        assert!(c.matches(&Value::Number(1e9)));
        assert!(!c.matches(&Value::Number(9.9)));
        assert!(!c.matches(&Value::Null));
    }

    #[test]
    fn text_contains_ignores_case() {
        let c = FilterConstraint::new(FilterValue::Text("WING".into()), MatchMode::Contains);
        assert!(c.matches(&Value::from("X-wing")));
        assert!(!c.matches(&Value::from("TIE Fighter")));
        assert!(!c.matches(&Value::Null));
    }

    #[test]
    fn id_equals_compares_numbers_and_text() {
        let c = FilterConstraint::new(FilterValue::Number(5.0), MatchMode::Equals);
        assert!(c.matches(&Value::Number(5.0)));
        assert!(!c.matches(&Value::Number(6.0)));
        let c = FilterConstraint::new(FilterValue::Text("5".into()), MatchMode::Equals);
        assert!(c.matches(&Value::Number(5.0)));
    }

    #[test]
    fn date_range_is_exclusive() {
        let d = |h| Value::Date(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap());
        let after = FilterConstraint::new(
            FilterValue::Date(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
            MatchMode::DateAfter,
        );
        assert!(after.matches(&d(11)));
        assert!(!after.matches(&d(10)));
    }

    #[test]
    fn in_matches_membership_and_lists() {
        let c = FilterConstraint::new(
            FilterValue::Items(vec!["x".into(), "y".into()]),
            MatchMode::In,
        );
        assert!(c.matches(&Value::from("x")));
        assert!(!c.matches(&Value::from("z")));
        assert!(c.matches(&Value::List(vec!["z".into(), "y".into()])));
    }

    #[test]
    fn operator_combines_active_constraints() {
        let state = FieldFilterState::Constraints {
            operator: Operator::Or,
            constraints: vec![
                FilterConstraint::new(FilterValue::Text("a".into()), MatchMode::Equals),
                FilterConstraint::new(FilterValue::Text("b".into()), MatchMode::Equals),
                FilterConstraint::empty(MatchMode::Equals),
            ],
        };
        assert!(state.matches(&Value::from("b")));
        assert!(!state.matches(&Value::from("c")));
        let state = FieldFilterState::Constraints {
            operator: Operator::And,
            constraints: vec![
                FilterConstraint::new(FilterValue::Text("a".into()), MatchMode::Contains),
                FilterConstraint::new(FilterValue::Text("b".into()), MatchMode::Contains),
            ],
        };
        assert!(state.matches(&Value::from("ab")));
        assert!(!state.matches(&Value::from("a")));
    }

    #[test]
    fn global_search_covers_text_and_id_fields() {
        let spec = starship();
        let mut state = FilterState::new(&spec).unwrap();
        let record = Record::from_iter([
            ("starship_id", Value::Number(12.0)),
            ("name", Value::from("Millennium Falcon")),
            ("length", Value::Number(34.37)),
        ]);
        state.set_global("falcon");
        assert!(state.matches(&spec, &record));
        state.set_global("12");
        assert!(state.matches(&spec, &record));
        state.set_global("34.37");
        assert!(!state.matches(&spec, &record));
    }
}
