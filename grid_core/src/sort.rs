use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::spec::ModelSpec;

/// Field sorted on first load, when the ModelSpec has it.
pub const DEFAULT_SORT_FIELD: &str = "name";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub ascending: bool,
}

impl SortBy {
    pub fn ascending(field: impl AsRef<str>) -> Self {
        SortBy {
            field: field.as_ref().to_string(),
            ascending: true,
        }
    }

    pub fn default_for(spec: &ModelSpec) -> Option<Self> {
        spec.spec_for(DEFAULT_SORT_FIELD)
            .map(|_| SortBy::ascending(DEFAULT_SORT_FIELD))
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let (va, vb) = (a.get_or_null(&self.field), b.get_or_null(&self.field));
        match (va.is_null(), vb.is_null()) {
            // nulls stay last in both directions
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ if self.ascending => va.sort_cmp(vb),
            _ => vb.sort_cmp(va),
        }
    }
}

/// Header click: ascending -> descending -> unsorted, another field starts ascending.
pub fn cycle(current: Option<&SortBy>, field: &str) -> Option<SortBy> {
    match current {
        Some(s) if s.field == field && s.ascending => Some(SortBy {
            field: field.to_string(),
            ascending: false,
        }),
        Some(s) if s.field == field => None,
        _ => Some(SortBy::ascending(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldSpec;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_clicks_cycle() {
        let asc = cycle(None, "name");
        assert_eq!(asc, Some(SortBy::ascending("name")));
        let desc = cycle(asc.as_ref(), "name");
        assert_eq!(desc.as_ref().map(|s| s.ascending), Some(false));
        assert_eq!(cycle(desc.as_ref(), "name"), None);
        assert_eq!(cycle(desc.as_ref(), "model"), Some(SortBy::ascending("model")));
    }

    #[test]
    fn default_sort_is_name_when_present() {
        let spec = ModelSpec::new([
            ("x_id", FieldSpec::id().data_key()),
            ("name", FieldSpec::text()),
        ]);
        assert_eq!(SortBy::default_for(&spec), Some(SortBy::ascending("name")));
        let spec = ModelSpec::new([("film_id", FieldSpec::id().data_key())]);
        assert_eq!(SortBy::default_for(&spec), None);
    }

    #[test]
    fn nulls_last_when_descending() {
        let r = |v: Value| Record::from_iter([("length", v)]);
        let mut rows = vec![r(Value::Null), r(Value::Number(1.0)), r(Value::Number(3.0))];
        let sort = SortBy {
            field: "length".into(),
            ascending: false,
        };
        rows.sort_by(|a, b| sort.compare(a, b));
        let values = rows
            .iter()
            .map(|r| r.get_or_null("length").clone())
            .collect::<Vec<_>>();
        assert_eq!(values, vec![Value::Number(3.0), Value::Number(1.0), Value::Null]);
    }
}
