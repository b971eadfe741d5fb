use indexmap::IndexMap;
use log::warn;
use serde_json::{Map, Value as Json};

use crate::RowUid;
use crate::error::ValidationError;
use crate::spec::{FieldKind, FieldSpec, ModelSpec};
use crate::value::{Value, parse_wire_date};

static NULL: Value = Value::Null;

/// Textual "no value" markers the service uses in numeric columns.
const NUMBER_PLACEHOLDERS: [&str; 3] = ["unknown", "n/a", "none"];

/// One entity instance, field name -> value in wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    values: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Missing fields read as Null.
    pub fn get_or_null(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl AsRef<str>, value: impl Into<Value>) {
        self.values.insert(field.as_ref().to_string(), value.into());
    }

    /// Editable slot of `field`, inserted as Null when missing.
    pub fn value_mut(&mut self, field: &str) -> &mut Value {
        self.values.entry(field.to_string()).or_insert(Value::Null)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.shift_remove(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-empty value of the data key field.
    pub fn key(&self, key_field: &str) -> Option<&Value> {
        self.values.get(key_field).filter(|v| !v.is_empty())
    }

    /// Validating conversion from one wire object.
    pub fn from_json(spec: &ModelSpec, json: &Json) -> Result<Record, ValidationError> {
        let Json::Object(object) = json else {
            return Err(ValidationError {
                field: String::new(),
                expected: "object",
                got: json.to_string(),
            });
        };
        let mut values = IndexMap::with_capacity(object.len());
        for (field, raw) in object {
            let value = match spec.spec_for(field) {
                Some(field_spec) => coerce(field, field_spec, raw)?,
                None => Value::from_json(raw),
            };
            values.insert(field.clone(), value);
        }
        Ok(Record { values })
    }

    pub fn to_json(&self) -> Json {
        let object: Map<String, Json> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Json::Object(object)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Record {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn mismatch(field: &str, expected: &'static str, raw: &Json) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        expected,
        got: raw.to_string(),
    }
}

/// Wire value -> typed value for the kind declared by `spec`.
pub fn coerce(field: &str, spec: &FieldSpec, raw: &Json) -> Result<Value, ValidationError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    // A declared date data type wins over the kind.
    let kind = if spec.is_date() {
        FieldKind::Date
    } else {
        spec.kind
    };
    match kind {
        FieldKind::Date => match raw {
            Json::String(s) if s.is_empty() => Ok(Value::Null),
            Json::String(s) => parse_wire_date(s)
                .map(Value::Date)
                .ok_or_else(|| mismatch(field, "date", raw)),
            _ => Err(mismatch(field, "date", raw)),
        },
        FieldKind::Id | FieldKind::Number => match raw {
            Json::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| mismatch(field, "number", raw)),
            Json::String(s)
                if s.trim().is_empty()
                    || NUMBER_PLACEHOLDERS.contains(&s.trim().to_lowercase().as_str()) =>
            {
                Ok(Value::Null)
            }
            Json::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| mismatch(field, "number", raw)),
            _ => Err(mismatch(field, "number", raw)),
        },
        FieldKind::Text => match raw {
            Json::String(s) => Ok(Value::Text(s.clone())),
            Json::Number(n) => Ok(Value::Text(n.to_string())),
            Json::Bool(b) => Ok(Value::Text(b.to_string())),
            _ => Err(mismatch(field, "text", raw)),
        },
        FieldKind::Boolean => match raw {
            Json::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(mismatch(field, "boolean", raw)),
        },
        FieldKind::Dropdown => match raw {
            Json::Array(_) | Json::Object(_) => Err(mismatch(field, "scalar", raw)),
            scalar => Ok(Value::from_json(scalar)),
        },
        FieldKind::Multiselect => match raw {
            Json::Array(_) => Ok(Value::from_json(raw)),
            _ => Err(mismatch(field, "array", raw)),
        },
    }
}

/// In-memory record set of one grid with locally assigned row ids.
#[derive(Default)]
pub struct RecordCache {
    rows: Vec<(RowUid, Record)>,
    next_row_uid: u32,
}

impl RecordCache {
    pub fn new() -> Self {
        RecordCache::default()
    }

    /// Full replacement, used by (re)loads only.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = Record>) {
        self.rows.clear();
        for record in records {
            self.push(record);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn push(&mut self, record: Record) -> RowUid {
        let row_uid = RowUid(self.next_row_uid);
        self.next_row_uid += 1;
        self.rows.push((row_uid, record));
        row_uid
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowUid, &Record)> {
        self.rows.iter().map(|(uid, r)| (*uid, r))
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().map(|(_, r)| r)
    }

    pub fn get(&self, row_uid: RowUid) -> Option<&Record> {
        self.rows
            .iter()
            .find(|(uid, _)| *uid == row_uid)
            .map(|(_, r)| r)
    }

    pub fn position_of_key(&self, key_field: &str, key: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|(_, r)| r.key(key_field) == Some(key))
    }

    /// Server-returned record replaces the cached one with the same key in place,
    /// otherwise it is appended.
    pub fn reconcile_upsert(&mut self, key_field: &str, record: Record) -> RowUid {
        let Some(key) = record.key(key_field).cloned() else {
            warn!("reconciliation mismatch: returned record has no `{key_field}`, appending");
            return self.push(record);
        };
        match self.position_of_key(key_field, &key) {
            Some(pos) => {
                let row_uid = self.rows[pos].0;
                self.rows[pos].1 = record;
                row_uid
            }
            None => self.push(record),
        }
    }

    /// Removes the first record whose key renders as `id`.
    pub fn reconcile_remove(&mut self, key_field: &str, id: &str) -> Option<Record> {
        let pos = self
            .rows
            .iter()
            .position(|(_, r)| r.key(key_field).is_some_and(|k| k.to_string() == id))?;
        Some(self.rows.remove(pos).1)
    }
}
