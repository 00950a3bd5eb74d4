use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

use derive_more::Deref;
use regex::Regex;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;

use crate::TestTxtError;
use crate::TestTxtResult;
use crate::tokens::RESERVED_MARKERS;
use crate::tokens::is_identifier;

static FIRST_CAP: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("(.)([A-Z][a-z]+)").expect("valid first cap pattern"));
static ALL_CAP: LazyLock<Regex> =
	LazyLock::new(|| Regex::new("([a-z0-9])([A-Z])").expect("valid all cap pattern"));

/// Derive the marker name for a structural field name by splitting camel case
/// words with `_` and upper casing the result.
///
/// `MixedCase` and `mixed_case` both become `MIXED_CASE`.
pub fn marker_name_for(field: &str) -> String {
	let snake = FIRST_CAP.replace_all(field, "${1}_${2}");
	let snake = ALL_CAP.replace_all(&snake, "${1}_${2}");

	snake.to_uppercase()
}

/// The value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
	/// Stored verbatim.
	Text,
	/// A signed decimal integer, surrounding whitespace ignored.
	Integer,
	/// Set to true by the presence of the marker, its text is ignored.
	Boolean,
}

impl FieldKind {
	/// Parse a declared type name such as `text`, `int` or `bool`.
	pub fn parse(field: &str, kind: &str) -> TestTxtResult<Self> {
		kind.parse().map_err(|()| {
			TestTxtError::UnsupportedFieldType {
				field: field.to_string(),
				kind: kind.to_string(),
			}
		})
	}

	/// The value of a field that was never set.
	pub fn zero(self) -> FieldValue {
		match self {
			Self::Text => FieldValue::Text(String::new()),
			Self::Integer => FieldValue::Integer(0),
			Self::Boolean => FieldValue::Boolean(false),
		}
	}

	/// Convert the expanded text of a marker into a value of this kind.
	pub fn coerce(self, text: &str) -> Result<FieldValue, String> {
		match self {
			Self::Text => Ok(FieldValue::Text(text.to_string())),
			Self::Integer => {
				text.trim()
					.parse::<i64>()
					.map(FieldValue::Integer)
					.map_err(|e| format!("parsing {:?}: {e}", text.trim()))
			}
			Self::Boolean => Ok(FieldValue::Boolean(true)),
		}
	}
}

impl FromStr for FieldKind {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"text" | "string" | "str" => Ok(Self::Text),
			"integer" | "int" | "i64" => Ok(Self::Integer),
			"boolean" | "bool" => Ok(Self::Boolean),
			_ => Err(()),
		}
	}
}

impl Display for FieldKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Text => "text",
			Self::Integer => "integer",
			Self::Boolean => "boolean",
		};

		write!(f, "{name}")
	}
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
	/// The structural name given in the declaration, e.g. `MixedCase`.
	pub name: String,
	/// The marker that sets this field, e.g. `MIXED_CASE`.
	pub marker: String,
	pub kind: FieldKind,
}

/// The ordered field declaration a parse is configured with. The first field
/// is the title field: each of its markers starts a new record.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct Schema {
	#[deref]
	fields: Vec<FieldSpec>,
}

impl Schema {
	pub fn builder() -> SchemaBuilder {
		SchemaBuilder::default()
	}

	/// The field whose marker delimits records.
	pub fn title(&self) -> &FieldSpec {
		&self.fields[0]
	}

	/// Position and declaration of the field set by `marker`.
	pub fn field_for_marker(&self, marker: &str) -> Option<(usize, &FieldSpec)> {
		self.fields
			.iter()
			.enumerate()
			.find(|(_, field)| field.marker == marker)
	}

	/// A record holding the zero value of every field.
	pub fn empty_record(&self) -> Record {
		Record {
			values: self
				.fields
				.iter()
				.map(|field| (field.name.clone(), field.kind.zero()))
				.collect(),
		}
	}
}

/// Collects field declarations and validates them into a [`Schema`].
///
/// ```rust
/// use testtxt_core::Schema;
///
/// let schema = Schema::builder()
/// 	.text("Title")
/// 	.integer("Count")
/// 	.boolean("Todo")
/// 	.build()
/// 	.unwrap();
///
/// assert_eq!(schema.title().marker, "TITLE");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
	fields: Vec<(String, FieldKind)>,
}

impl SchemaBuilder {
	#[must_use]
	pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
		self.fields.push((name.into(), kind));
		self
	}

	#[must_use]
	pub fn text(self, name: impl Into<String>) -> Self {
		self.field(name, FieldKind::Text)
	}

	#[must_use]
	pub fn integer(self, name: impl Into<String>) -> Self {
		self.field(name, FieldKind::Integer)
	}

	#[must_use]
	pub fn boolean(self, name: impl Into<String>) -> Self {
		self.field(name, FieldKind::Boolean)
	}

	pub fn build(self) -> TestTxtResult<Schema> {
		if self.fields.is_empty() {
			return Err(TestTxtError::EmptySchema);
		}

		let mut fields: Vec<FieldSpec> = Vec::with_capacity(self.fields.len());
		for (name, kind) in self.fields {
			if !is_identifier(&name) {
				return Err(TestTxtError::InvalidFieldName(name));
			}

			let marker = marker_name_for(&name);
			if RESERVED_MARKERS.contains(&marker.as_str()) {
				return Err(TestTxtError::ReservedFieldName {
					field: name,
					marker,
				});
			}

			if let Some(existing) = fields.iter().find(|field| field.marker == marker) {
				return Err(TestTxtError::DuplicateField {
					first: existing.name.clone(),
					second: name,
					marker,
				});
			}

			fields.push(FieldSpec { name, marker, kind });
		}

		Ok(Schema { fields })
	}
}

/// The value of one field of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
	Text(String),
	Integer(i64),
	Boolean(bool),
}

impl Display for FieldValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Text(text) => write!(f, "{text}"),
			Self::Integer(number) => write!(f, "{number}"),
			Self::Boolean(flag) => write!(f, "{flag}"),
		}
	}
}

/// One test description: a value for every field of the schema, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
	values: Vec<(String, FieldValue)>,
}

impl Record {
	/// The value of the title field.
	pub fn title(&self) -> &FieldValue {
		&self.values[0].1
	}

	/// Look up a value by its structural field name.
	pub fn get(&self, name: &str) -> Option<&FieldValue> {
		self.values
			.iter()
			.find(|(field, _)| field == name)
			.map(|(_, value)| value)
	}

	pub fn text(&self, name: &str) -> Option<&str> {
		match self.get(name)? {
			FieldValue::Text(text) => Some(text),
			_ => None,
		}
	}

	pub fn integer(&self, name: &str) -> Option<i64> {
		match self.get(name)? {
			FieldValue::Integer(number) => Some(*number),
			_ => None,
		}
	}

	pub fn boolean(&self, name: &str) -> Option<bool> {
		match self.get(name)? {
			FieldValue::Boolean(flag) => Some(*flag),
			_ => None,
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
		self.values.iter().map(|(name, value)| (name.as_str(), value))
	}

	pub(crate) fn set(&mut self, index: usize, value: FieldValue) {
		self.values[index].1 = value;
	}
}

impl Serialize for Record {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.values.len()))?;
		for (name, value) in &self.values {
			map.serialize_entry(name, value)?;
		}
		map.end()
	}
}

/// A Rust type that can hold the value of a field.
pub trait FieldType: Sized {
	const KIND: FieldKind;

	fn from_value(value: &FieldValue) -> Option<Self>;
}

impl FieldType for String {
	const KIND: FieldKind = FieldKind::Text;

	fn from_value(value: &FieldValue) -> Option<Self> {
		match value {
			FieldValue::Text(text) => Some(text.clone()),
			_ => None,
		}
	}
}

impl FieldType for i64 {
	const KIND: FieldKind = FieldKind::Integer;

	fn from_value(value: &FieldValue) -> Option<Self> {
		match value {
			FieldValue::Integer(number) => Some(*number),
			_ => None,
		}
	}
}

impl FieldType for bool {
	const KIND: FieldKind = FieldKind::Boolean;

	fn from_value(value: &FieldValue) -> Option<Self> {
		match value {
			FieldValue::Boolean(flag) => Some(*flag),
			_ => None,
		}
	}
}

/// A statically typed test description.
///
/// Usually implemented through [`test_case!`](crate::test_case).
pub trait TestCase: Sized {
	fn schema() -> TestTxtResult<Schema>;

	fn from_record(record: &Record) -> Self;
}

/// Declare a struct whose fields are bound to markers, together with its
/// [`TestCase`] implementation. The first field is the title field.
///
/// ```rust
/// testtxt_core::test_case! {
/// 	#[derive(Debug, Default, PartialEq)]
/// 	pub struct Descr {
/// 		pub title: String,
/// 		pub count: i64,
/// 		pub todo: bool,
/// 	}
/// }
///
/// let cases: Vec<Descr> =
/// 	testtxt_core::parse_cases("=TITLE=t1\n=COUNT= 3\n=TODO=\n", "file").unwrap();
///
/// assert_eq!(cases[0].count, 3);
/// assert!(cases[0].todo);
/// ```
#[macro_export]
macro_rules! test_case {
	(
		$(#[$meta:meta])*
		$vis:vis struct $name:ident {
			$($(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty),+ $(,)?
		}
	) => {
		$(#[$meta])*
		$vis struct $name {
			$($(#[$field_meta])* $field_vis $field: $ty,)+
		}

		impl $crate::TestCase for $name {
			fn schema() -> $crate::TestTxtResult<$crate::Schema> {
				$crate::Schema::builder()
					$(.field(stringify!($field), <$ty as $crate::FieldType>::KIND))+
					.build()
			}

			fn from_record(record: &$crate::Record) -> Self {
				Self {
					$($field: record
						.get(stringify!($field))
						.and_then(<$ty as $crate::FieldType>::from_value)
						.unwrap_or_default(),)+
				}
			}
		}
	};
}
