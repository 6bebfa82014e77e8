//! Data-access interface over the external entity store.
//!
//! Backends speak JSON documents (`EntityStore`); job code goes through the
//! typed [`Entities`] facade which maps documents to [`Stored<T>`].

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::entities::{Entity, EntityKind, Stored};
use crate::error::StoreError;

// ============================================================================
// Query model
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Value },
    Gte { field: String, value: Value },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. } | Condition::Gte { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

/// Filter, sort and limit for `EntityStore::filter`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Records whose `created_by` is this email.
    pub fn owned_by(self, email: &str) -> Self {
        self.eq("created_by", email)
    }

    /// Records whose timestamp `field` is at or after `ts`.
    pub fn since(mut self, field: &str, ts: DateTime<Utc>) -> Self {
        self.conditions.push(Condition::Gte {
            field: field.to_string(),
            value: Value::String(format_timestamp(ts)),
        });
        self
    }

    /// Sort spec in `-field` (descending) / `field` (ascending) form.
    pub fn sort_by(mut self, spec: &str) -> Self {
        let (field, descending) = match spec.strip_prefix('-') {
            Some(f) => (f, true),
            None => (spec, false),
        };
        self.sort = Some(Sort {
            field: field.to_string(),
            descending,
        });
        self
    }

    pub fn newest_first(self) -> Self {
        self.sort_by("-created_date")
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Reject field names that are not plain identifiers.
    pub fn validate(&self) -> Result<(), StoreError> {
        let fields = self
            .conditions
            .iter()
            .map(Condition::field)
            .chain(self.sort.iter().map(|s| s.field.as_str()));
        for field in fields {
            if !is_valid_field(field) {
                return Err(StoreError::InvalidField(field.to_string()));
            }
        }
        Ok(())
    }

    /// Whether `record` satisfies every condition. Missing fields read as null.
    pub fn matches(&self, record: &Value) -> bool {
        self.conditions.iter().all(|cond| match cond {
            Condition::Eq { field, value } => {
                let actual = record.get(field).unwrap_or(&Value::Null);
                compare_json(actual, value) == Some(Ordering::Equal)
            }
            Condition::Gte { field, value } => {
                let actual = record.get(field).unwrap_or(&Value::Null);
                matches!(
                    compare_json(actual, value),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }
        })
    }

    /// Filter, sort and truncate an in-memory record set with the same
    /// semantics the SQL backend implements.
    pub fn apply(&self, records: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut out: Vec<Value> = records.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(sort) = &self.sort {
            out.sort_by(|a, b| {
                let a = a.get(&sort.field).unwrap_or(&Value::Null);
                let b = b.get(&sort.field).unwrap_or(&Value::Null);
                let ord = compare_json(a, b).unwrap_or(Ordering::Equal);
                if sort.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

pub fn is_valid_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Order two JSON scalars. Numbers compare numerically, strings
/// lexicographically, nulls equal each other; mixed types are unordered.
pub fn compare_json(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Fixed-width RFC 3339 so that string order is chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Backend-side helpers
// ============================================================================

/// Assign `id` and `created_date` to a new record. A caller-supplied
/// `created_date` is kept (normalised); otherwise `now` is used.
pub fn stamp_new_record(
    kind: EntityKind,
    data: Value,
    now: DateTime<Utc>,
) -> Result<Value, StoreError> {
    let Value::Object(mut map) = data else {
        return Err(StoreError::NotAnObject { kind });
    };

    let has_id = map
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if !has_id {
        map.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }

    let created = map
        .get("created_date")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    map.insert(
        "created_date".into(),
        Value::String(format_timestamp(created)),
    );

    Ok(Value::Object(map))
}

/// Shallow-merge `patch` into `record`. `id` and `created_date` are immutable.
pub fn merge_patch(kind: EntityKind, record: &mut Value, patch: Value) -> Result<(), StoreError> {
    let Value::Object(patch) = patch else {
        return Err(StoreError::NotAnObject { kind });
    };
    let Value::Object(target) = record else {
        return Err(StoreError::NotAnObject { kind });
    };
    for (key, value) in patch {
        if key == "id" || key == "created_date" {
            continue;
        }
        target.insert(key, value);
    }
    Ok(())
}

pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

// ============================================================================
// Store trait
// ============================================================================

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Value>, StoreError>;
    async fn filter(&self, kind: EntityKind, query: &Query) -> Result<Vec<Value>, StoreError>;
    async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, StoreError>;
    async fn update(&self, kind: EntityKind, id: &str, patch: Value) -> Result<Value, StoreError>;
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), StoreError>;
}

/// Typed view over an [`EntityStore`].
#[derive(Clone, Copy)]
pub struct Entities<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> Entities<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    pub async fn list<T: Entity>(&self) -> Result<Vec<Stored<T>>, StoreError> {
        let raw = self.store.list(T::KIND).await?;
        raw.into_iter().map(decode::<T>).collect()
    }

    pub async fn filter<T: Entity>(&self, query: &Query) -> Result<Vec<Stored<T>>, StoreError> {
        let raw = self.store.filter(T::KIND, query).await?;
        raw.into_iter().map(decode::<T>).collect()
    }

    pub async fn first<T: Entity>(&self, query: Query) -> Result<Option<Stored<T>>, StoreError> {
        let mut found = self.filter::<T>(&query.limit(1)).await?;
        Ok(found.pop())
    }

    pub async fn create<T: Entity>(&self, data: &T) -> Result<Stored<T>, StoreError> {
        let raw = self.store.create(T::KIND, encode(data)?).await?;
        decode(raw)
    }

    /// Create with an explicit creation time (imports, backfills, fixtures).
    pub async fn import<T: Entity>(
        &self,
        data: &T,
        created_date: DateTime<Utc>,
    ) -> Result<Stored<T>, StoreError> {
        let mut value = encode(data)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "created_date".into(),
                Value::String(format_timestamp(created_date)),
            );
        }
        let raw = self.store.create(T::KIND, value).await?;
        decode(raw)
    }

    pub async fn update<T: Entity>(&self, id: &str, patch: Value) -> Result<Stored<T>, StoreError> {
        let raw = self.store.update(T::KIND, id, patch).await?;
        decode(raw)
    }

    pub async fn delete<T: Entity>(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(T::KIND, id).await
    }
}

fn encode<T: Entity>(data: &T) -> Result<Value, StoreError> {
    match serde_json::to_value(data) {
        Ok(v @ Value::Object(_)) => Ok(v),
        Ok(_) => Err(StoreError::NotAnObject { kind: T::KIND }),
        Err(source) => Err(StoreError::Encode {
            kind: T::KIND,
            source,
        }),
    }
}

fn decode<T: Entity>(raw: Value) -> Result<Stored<T>, StoreError> {
    serde_json::from_value(raw).map_err(|source| StoreError::Decode {
        kind: T::KIND,
        source,
    })
}

/// Build a JSON object patch from key/value pairs.
pub fn patch<I, K>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    let map: Map<String, Value> = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
    Value::Object(map)
}
