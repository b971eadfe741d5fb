use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::filter::{MatchMode, Operator};
use crate::value::Value;

/// Semantic kind of a field, drives filter, formatter and editor selection.
#[derive(
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Id,
    Text,
    Number,
    Date,
    Boolean,
    Dropdown,
    Multiselect,
}

/// Declared wire data type, only consulted for date coercion.
#[derive(strum::Display, Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Numeric,
    Date,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub label: String,
    #[serde(with = "select_value")]
    pub value: Value,
}

impl SelectItem {
    pub fn new(label: impl AsRef<str>, value: impl Into<Value>) -> Self {
        SelectItem {
            label: label.as_ref().to_string(),
            value: value.into(),
        }
    }
}

mod select_value {
    use crate::value::Value;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Value, s: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&value.to_json(), s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
        let json = serde_json::Value::deserialize(d)?;
        Ok(Value::from_json(&json))
    }
}

/// Declarative description of one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    #[serde(default)]
    pub data_type: Option<DataType>,
    /// Column width in points, config default when absent.
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub decimal_places: Option<usize>,
    #[serde(default)]
    pub display_suffix: Option<String>,
    #[serde(default)]
    pub select_items: Vec<SelectItem>,
    #[serde(default)]
    pub operator_override: Option<Operator>,
    #[serde(default)]
    pub match_mode_override: Option<MatchMode>,
    #[serde(default)]
    pub is_data_key: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        FieldSpec {
            kind,
            data_type: None,
            width: None,
            frozen: false,
            decimal_places: None,
            display_suffix: None,
            select_items: vec![],
            operator_override: None,
            match_mode_override: None,
            is_data_key: false,
            is_read_only: false,
            is_hidden: false,
        }
    }

    pub fn id() -> Self {
        Self::new(FieldKind::Id)
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn dropdown(items: impl IntoIterator<Item = SelectItem>) -> Self {
        Self::new(FieldKind::Dropdown).select_items(items)
    }

    pub fn multiselect(items: impl IntoIterator<Item = SelectItem>) -> Self {
        Self::new(FieldKind::Multiselect).select_items(items)
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn decimals(mut self, decimal_places: usize) -> Self {
        self.decimal_places = Some(decimal_places);
        self
    }

    pub fn suffix(mut self, suffix: impl AsRef<str>) -> Self {
        self.display_suffix = Some(suffix.as_ref().to_string());
        self
    }

    pub fn select_items(mut self, items: impl IntoIterator<Item = SelectItem>) -> Self {
        self.select_items = items.into_iter().collect();
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator_override = Some(operator);
        self
    }

    pub fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode_override = Some(match_mode);
        self
    }

    pub fn data_key(mut self) -> Self {
        self.is_data_key = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// True for kinds or declared data types holding dates.
    pub fn is_date(&self) -> bool {
        self.kind == FieldKind::Date || self.data_type == Some(DataType::Date)
    }
}

/// Ordered field name -> FieldSpec map, insertion order is display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    fields: IndexMap<String, FieldSpec>,
}

impl ModelSpec {
    pub fn new(fields: impl IntoIterator<Item = (&'static str, FieldSpec)>) -> Self {
        ModelSpec {
            fields: fields
                .into_iter()
                .map(|(name, spec)| (name.to_string(), spec))
                .collect(),
        }
    }

    pub fn field(mut self, name: impl AsRef<str>, spec: FieldSpec) -> Self {
        self.fields.insert(name.as_ref().to_string(), spec);
        self
    }

    pub fn spec_for(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn field_at(&self, idx: usize) -> Option<(&str, &FieldSpec)> {
        self.fields
            .get_index(idx)
            .map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name of the single data key field.
    pub fn data_key_of(&self) -> Result<&str, ConfigurationError> {
        let keys = self
            .fields
            .iter()
            .filter(|(_, spec)| spec.is_data_key)
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        match keys.as_slice() {
            [] => Err(ConfigurationError::NoDataKey),
            [key] => Ok(key),
            many => Err(ConfigurationError::MultipleDataKeys(
                many.iter().map(|k| k.to_string()).collect(),
            )),
        }
    }

    /// Fields whose values travel as date strings on the wire.
    pub fn date_fields_of(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.is_date())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Fields searched by the keyword search box.
    pub fn global_filter_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, spec)| {
                !spec.is_hidden && matches!(spec.kind, FieldKind::Id | FieldKind::Text)
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Full setup check, fails fast on the first problem.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.data_key_of()?;
        for (name, spec) in &self.fields {
            if matches!(spec.kind, FieldKind::Dropdown | FieldKind::Multiselect)
                && spec.select_items.is_empty()
            {
                return Err(ConfigurationError::MissingSelectItems(name.clone()));
            }
        }
        Ok(())
    }

    /// `cost_in_credits` -> `Cost In Credits`
    pub fn header_text(field: &str) -> String {
        field
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn starship() -> ModelSpec {
        ModelSpec::new([
            ("starship_id", FieldSpec::id().data_key().read_only()),
            ("name", FieldSpec::text()),
            ("length", FieldSpec::number().decimals(2)),
            ("created", FieldSpec::date().read_only()),
            ("launched", FieldSpec::text().data_type(DataType::Date)),
        ])
    }

    #[test]
    fn data_key_is_found() {
        assert_eq!(starship().data_key_of(), Ok("starship_id"));
    }

    #[test]
    fn missing_data_key_is_a_configuration_error() {
        let spec = ModelSpec::new([("name", FieldSpec::text())]);
        assert_eq!(spec.data_key_of(), Err(ConfigurationError::NoDataKey));
    }

    #[test]
    fn duplicate_data_key_is_a_configuration_error() {
        let spec = ModelSpec::new([
            ("a_id", FieldSpec::id().data_key()),
            ("b_id", FieldSpec::id().data_key()),
        ]);
        assert_eq!(
            spec.data_key_of(),
            Err(ConfigurationError::MultipleDataKeys(vec![
                "a_id".into(),
                "b_id".into()
            ]))
        );
    }

    #[test]
    fn date_fields_include_declared_data_type() {
        assert_eq!(starship().date_fields_of(), vec!["created", "launched"]);
    }

    #[test]
    fn insertion_order_is_display_order() {
        let names = starship().field_names().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(names, ["starship_id", "name", "length", "created", "launched"]);
    }

    #[test]
    fn dropdown_without_items_fails_validation() {
        let spec = ModelSpec::new([
            ("x_id", FieldSpec::id().data_key()),
            ("class", FieldSpec::new(FieldKind::Dropdown)),
        ]);
        assert_eq!(
            spec.validate(),
            Err(ConfigurationError::MissingSelectItems("class".into()))
        );
    }

    #[test]
    fn header_text_capitalizes_words() {
        assert_eq!(ModelSpec::header_text("cost_in_credits"), "Cost In Credits");
        assert_eq!(ModelSpec::header_text("MGLT"), "MGLT");
    }

    #[test]
    fn global_fields_are_visible_text_and_id() {
        let spec = starship().field("secret", FieldSpec::text().hidden());
        assert_eq!(spec.global_filter_fields(), vec!["starship_id", "name", "launched"]);
    }
}
