//! Defensive decoding of backend validation errors into `field -> first message`.
//!
//! Validation failures arrive in whatever shape the endpoint chose:
//! `{"email": ["Enter a valid email."]}`, `{"phone": "Required."}`,
//! `{"detail": "Not found."}`, nested objects for related fields, or a bare list of
//! messages. [`FieldErrors`] flattens all of them into one message per field and never fails;
//! unknown or malformed shapes simply contribute nothing.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Key used for messages that are not tied to a field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";
/// Key used when the body is a bare string.
pub const DETAIL: &str = "detail";

/// Validation errors keyed by field name, keeping the first message per field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);
impl FieldErrors {
	/// Decodes a raw body; anything that is not JSON yields an empty map.
	pub fn from_slice(body: &[u8]) -> Self {
		serde_json::from_slice::<Value>(body).map(|value| Self::from_value(&value)).unwrap_or_default()
	}

	/// Decodes an already-parsed JSON document.
	pub fn from_value(value: &Value) -> Self {
		let mut errors = BTreeMap::new();

		match value {
			Value::Object(fields) =>
				for (field, raw) in fields {
					if let Some(message) = first_message(raw) {
						errors.insert(field.clone(), message);
					}
				},
			Value::Array(_) =>
				if let Some(message) = first_message(value) {
					errors.insert(NON_FIELD_ERRORS.into(), message);
				},
			Value::String(message) => {
				errors.insert(DETAIL.into(), message.clone());
			},
			_ => (),
		}

		Self(errors)
	}

	/// First message recorded for `field`.
	pub fn get(&self, field: &str) -> Option<&str> {
		self.0.get(field).map(String::as_str)
	}

	/// Returns `true` when no message was decoded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of fields with a message.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates `(field, message)` pairs in field order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
	}

	/// Returns the underlying map.
	pub fn into_inner(self) -> BTreeMap<String, String> {
		self.0
	}
}

fn first_message(value: &Value) -> Option<String> {
	match value {
		Value::String(message) => Some(message.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Array(items) => items.iter().find_map(first_message),
		// Nested serializers report errors per sub-field; surface the first one found.
		Value::Object(fields) => fields.values().find_map(first_message),
		Value::Null => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn lists_keep_their_first_message() {
		let errors = FieldErrors::from_slice(
			br#"{"email":["Enter a valid email address.","Email already registered."],"phone":"This field is required."}"#,
		);

		assert_eq!(errors.len(), 2);
		assert_eq!(errors.get("email"), Some("Enter a valid email address."));
		assert_eq!(errors.get("phone"), Some("This field is required."));

		let by_field = errors.into_inner();

		assert_eq!(
			by_field.keys().map(String::as_str).collect::<Vec<_>>(),
			vec!["email", "phone"]
		);
		assert_eq!(by_field["phone"], "This field is required.");
	}

	#[test]
	fn odd_shapes_are_tolerated() {
		let errors = FieldErrors::from_value(&serde_json::json!({
			"course": { "start_date": ["Date has wrong format."] },
			"age": 17,
			"active": false,
			"notes": null,
			"tags": [],
		}));

		assert_eq!(errors.get("course"), Some("Date has wrong format."));
		assert_eq!(errors.get("age"), Some("17"));
		assert_eq!(errors.get("active"), Some("false"));
		assert!(errors.get("notes").is_none());
		assert!(errors.get("tags").is_none());
	}

	#[test]
	fn top_level_strings_and_lists_are_keyed() {
		let detail = FieldErrors::from_slice(br#""Not found.""#);

		assert_eq!(detail.get(DETAIL), Some("Not found."));

		let list = FieldErrors::from_slice(br#"["Lead is already assigned."]"#);

		assert_eq!(list.iter().collect::<Vec<_>>(), vec![(NON_FIELD_ERRORS, "Lead is already assigned.")]);
	}

	#[test]
	fn non_json_bodies_yield_nothing() {
		assert!(FieldErrors::from_slice(b"<html>502 Bad Gateway</html>").is_empty());
		assert!(FieldErrors::from_slice(b"").is_empty());
		assert!(FieldErrors::from_slice(b"42").is_empty());
	}
}
