//! Insertion-ordered request envelopes with a closed JSON value model.
//!
//! The upstream secure-hash contract concatenates field values in the exact order the caller
//! constructed the body, so payloads are modeled as an ordered sequence of `(name, value)` pairs
//! rather than a sorted map. Reordering fields changes the computed hash; [`Payload::insert`]
//! therefore replaces values in place instead of moving keys to the end.

// std
use std::slice::Iter;
// crates.io
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
// self
use crate::_prelude::*;

/// Closed set of value shapes accepted in request payloads.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// UTF-8 string value.
	String(String),
	/// Integer or floating point number.
	Number(Number),
	/// Boolean value.
	Bool(bool),
	/// Nested ordered object, used by multi-part payloads.
	Object(Payload),
	/// Array of values.
	Array(Vec<Value>),
}
impl Value {
	/// Converts the value into a [`serde_json::Value`], preserving object field order.
	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Self::String(s) => serde_json::Value::String(s.clone()),
			Self::Number(n) => serde_json::Value::Number(n.clone()),
			Self::Bool(b) => serde_json::Value::Bool(*b),
			Self::Object(payload) => payload.to_json(),
			Self::Array(values) => {
				serde_json::Value::Array(values.iter().map(Value::to_json).collect())
			},
		}
	}

	/// Appends the canonical string rendering used by the secure-hash contract.
	///
	/// Strings contribute their raw contents; numbers and booleans contribute their JSON token;
	/// nested objects and arrays contribute their compact JSON rendering.
	pub(crate) fn push_canonical(&self, buf: &mut String) {
		match self {
			Self::String(s) => buf.push_str(s),
			Self::Number(n) => buf.push_str(&n.to_string()),
			Self::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
			Self::Object(_) | Self::Array(_) => buf.push_str(&self.to_json().to_string()),
		}
	}
}
impl Serialize for Value {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Self::String(s) => serializer.serialize_str(s),
			Self::Number(n) => n.serialize(serializer),
			Self::Bool(b) => serializer.serialize_bool(*b),
			Self::Object(payload) => payload.serialize(serializer),
			Self::Array(values) => {
				let mut seq = serializer.serialize_seq(Some(values.len()))?;

				for value in values {
					seq.serialize_element(value)?;
				}

				seq.end()
			},
		}
	}
}
impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::String(value.into())
	}
}
impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}
impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Number(value.into())
	}
}
impl From<u64> for Value {
	fn from(value: u64) -> Self {
		Self::Number(value.into())
	}
}
impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<Payload> for Value {
	fn from(value: Payload) -> Self {
		Self::Object(value)
	}
}
impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Self::Array(value)
	}
}

/// Insertion-ordered request body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(Vec<(String, Value)>);
impl Payload {
	/// Creates an empty payload.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);

		self
	}

	/// Sets a field, replacing an existing value in place so the key keeps its position.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		let key = key.into();
		let value = value.into();

		match self.0.iter_mut().find(|(existing, _)| *existing == key) {
			Some(slot) => slot.1 = value,
			None => self.0.push((key, value)),
		}
	}

	/// Removes a field, returning its value when present.
	pub fn remove(&mut self, key: &str) -> Option<Value> {
		let index = self.0.iter().position(|(existing, _)| existing == key)?;

		Some(self.0.remove(index).1)
	}

	/// Returns the value stored under `key`, if any.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
	}

	/// Iterates fields in insertion order.
	pub fn iter(&self) -> PayloadIter {
		PayloadIter(self.0.iter())
	}

	/// Returns the number of fields.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the payload holds no fields.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Converts the payload into a [`serde_json::Value`] object, preserving field order.
	pub fn to_json(&self) -> serde_json::Value {
		serde_json::Value::Object(
			self.0.iter().map(|(key, value)| (key.clone(), value.to_json())).collect(),
		)
	}
}
impl Serialize for Payload {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.0.len()))?;

		for (key, value) in &self.0 {
			map.serialize_entry(key, value)?;
		}

		map.end()
	}
}

/// Iterator over payload fields in insertion order.
pub struct PayloadIter<'a>(Iter<'a, (String, Value)>);
impl<'a> Iterator for PayloadIter<'a> {
	type Item = (&'a str, &'a Value);

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next().map(|(key, value)| (key.as_str(), value))
	}
}
