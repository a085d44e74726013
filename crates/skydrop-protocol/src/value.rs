//! The dynamic value model that application code reads and writes.
//!
//! The server never sends a schema, so every message lands in a [`Value`]:
//! a tagged union over the JSON shapes, with JSON objects split into two
//! variants:
//!
//! - [`Record`] — a named entity (`{"IsOk": true, "Message": "..."}`).
//! - [`Collection`] — an id → value dictionary (`{"order-1": {...}}`).
//!
//! Which one an object becomes is decided by the transcoder
//! (see [`crate::deserialize`]). Both keep their keys in wire order.
//!
//! Reading a field that is not there is not an error: [`Record::get`]
//! returns [`Value::Null`]. Reading a field as the wrong shape is, and the
//! typed accessors ([`Record::record`], [`Record::sequence`], ...) report it
//! as a [`TypeMismatch`].

use std::collections::HashMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::TypeMismatch;

/// Sentinel returned for absent fields.
static NULL: Value = Value::Null;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The shape of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Record,
    Collection,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Sequence => "sequence",
            Kind::Record => "record",
            Kind::Collection => "keyed collection",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A dynamically-shaped value decoded from (or destined for) the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON `null`, and the sentinel for absent record fields.
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// An ordered sequence (JSON array).
    Sequence(Vec<Value>),
    /// A named entity (JSON object).
    Record(Record),
    /// An id-keyed dictionary (JSON object).
    Collection(Collection),
}

impl Value {
    /// Returns the shape of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Sequence(_) => Kind::Sequence,
            Value::Record(_) => Kind::Record,
            Value::Collection(_) => Kind::Collection,
        }
    }

    /// Returns `true` for `null` (explicit or absent).
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Returns the key/value entries of a keyed collection.
    ///
    /// An empty object decodes as an empty record, so an empty record is
    /// accepted here as an empty collection.
    pub fn as_entries(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Collection(collection) => Some(collection.entries()),
            Value::Record(record) if record.is_empty() => Some(&[]),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&serde_json::Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(serde_json::Number::as_u64)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(serde_json::Number::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(serde_json::Number::as_f64)
    }

    /// Consumes the value as a record, or reports what it was instead.
    pub fn into_record(self, field: &str) -> Result<Record, TypeMismatch> {
        match self {
            Value::Record(record) => Ok(record),
            other => Err(TypeMismatch::new(field, Kind::Record, other.kind())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `null`.
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Collection> for Value {
    fn from(collection: Collection) -> Self {
        Value::Collection(collection)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Record(record) => record.serialize(serializer),
            Value::Collection(collection) => collection.serialize(serializer),
        }
    }
}

/// Collects entries in order; a repeated key overwrites the earlier value
/// in place. Linear in the number of entries.
fn collect_entries<I>(iter: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let iter = iter.into_iter();
    let mut entries: Vec<(String, Value)> = Vec::with_capacity(iter.size_hint().0);
    let mut index: HashMap<String, usize> = HashMap::with_capacity(iter.size_hint().0);
    for (key, value) in iter {
        match index.get(&key) {
            Some(&at) => entries[at].1 = value,
            None => {
                index.insert(key.clone(), entries.len());
                entries.push((key, value));
            }
        }
    }
    entries
}

fn serialize_entries<S: Serializer>(
    entries: &[(String, Value)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A named entity: field name → value, in insertion order.
///
/// Lookups are linear scans; bulk construction goes through
/// [`FromIterator`], which is linear overall.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    ///
    /// ```rust
    /// use skydrop_protocol::{Record, Value};
    ///
    /// let handshake = Record::new()
    ///     .with("AuthToken", "secret")
    ///     .with("EntryName", "greedy");
    /// assert_eq!(handshake.get("EntryName"), &Value::from("greedy"));
    /// ```
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field. An existing field keeps its position and its old
    /// value is returned.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Looks up a field. Absent fields read as [`Value::Null`].
    pub fn get(&self, name: &str) -> &Value {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map_or(&NULL, |(_, v)| v)
    }

    /// Returns `true` if the field is present and not `null`.
    pub fn contains(&self, name: &str) -> bool {
        !self.get(name).is_null()
    }

    /// Removes a field and returns its value (`Null` if absent).
    pub fn remove(&mut self, name: &str) -> Value {
        match self.fields.iter().position(|(k, _)| k == name) {
            Some(index) => self.fields.remove(index).1,
            None => Value::Null,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    // -- Typed accessors --

    /// Reads a nested record.
    pub fn record(&self, name: &str) -> Result<&Record, TypeMismatch> {
        let value = self.get(name);
        value
            .as_record()
            .ok_or_else(|| TypeMismatch::new(name, Kind::Record, value.kind()))
    }

    /// Reads an ordered sequence.
    pub fn sequence(&self, name: &str) -> Result<&[Value], TypeMismatch> {
        let value = self.get(name);
        value
            .as_sequence()
            .ok_or_else(|| TypeMismatch::new(name, Kind::Sequence, value.kind()))
    }

    /// Reads a keyed collection as its entries. See [`Value::as_entries`].
    pub fn collection(
        &self,
        name: &str,
    ) -> Result<&[(String, Value)], TypeMismatch> {
        let value = self.get(name);
        value.as_entries().ok_or_else(|| {
            TypeMismatch::new(name, Kind::Collection, value.kind())
        })
    }

    pub fn str(&self, name: &str) -> Result<&str, TypeMismatch> {
        let value = self.get(name);
        value
            .as_str()
            .ok_or_else(|| TypeMismatch::new(name, Kind::String, value.kind()))
    }

    pub fn bool(&self, name: &str) -> Result<bool, TypeMismatch> {
        let value = self.get(name);
        value
            .as_bool()
            .ok_or_else(|| TypeMismatch::new(name, Kind::Bool, value.kind()))
    }

    pub fn number(&self, name: &str) -> Result<&serde_json::Number, TypeMismatch> {
        let value = self.get(name);
        value
            .as_number()
            .ok_or_else(|| TypeMismatch::new(name, Kind::Number, value.kind()))
    }

    /// Like [`Record::str`], but absent or `null` reads as `None`.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, TypeMismatch> {
        match self.get(name) {
            Value::Null => Ok(None),
            _ => self.str(name).map(Some),
        }
    }

    /// Like [`Record::bool`], but absent or `null` reads as `None`.
    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, TypeMismatch> {
        match self.get(name) {
            Value::Null => Ok(None),
            _ => self.bool(name).map(Some),
        }
    }

    /// Reads a non-negative integer; absent or `null` reads as `None`.
    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>, TypeMismatch> {
        match self.get(name) {
            Value::Null => Ok(None),
            value => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| TypeMismatch::new(name, Kind::Number, value.kind())),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: collect_entries(iter),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_entries(&self.fields, serializer)
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// An id-keyed dictionary, e.g. `{"order-7": {...}, "order-9": {...}}`.
///
/// Keys are kept verbatim and in wire order; they are data, not field names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    entries: Vec<(String, Value)>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets an entry. An existing key keeps its position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Collection {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Collection {
            entries: collect_entries(iter),
        }
    }
}

impl IntoIterator for Collection {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_entries(&self.entries, serializer)
    }
}
