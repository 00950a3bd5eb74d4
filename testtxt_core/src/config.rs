use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DEFAULT_EXTENSION;
use crate::FieldKind;
use crate::Schema;
use crate::TestTxtError;
use crate::TestTxtResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["testtxt.toml", ".config/testtxt.toml"];

/// A field declaration in `testtxt.toml`.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct FieldDeclaration {
	/// Structural field name. The marker name is derived from it.
	pub name: String,
	/// One of `text`, `integer` or `boolean`.
	#[serde(rename = "type", default = "default_field_type")]
	pub kind: String,
}

/// Configuration loaded from a `testtxt.toml` file.
///
/// ```toml
/// extension = "t"
///
/// [[fields]]
/// name = "Title"
/// type = "text"
///
/// [[fields]]
/// name = "Count"
/// type = "integer"
/// ```
#[derive(Debug, Deserialize)]
pub struct TestTxtConfig {
	/// Extension of test description files, without the leading dot.
	#[serde(default = "default_extension")]
	pub extension: String,
	/// Ordered field declarations. The first one is the title field.
	#[serde(default)]
	pub fields: Vec<FieldDeclaration>,
}

impl Default for TestTxtConfig {
	fn default() -> Self {
		Self {
			extension: default_extension(),
			fields: Vec::new(),
		}
	}
}

fn default_extension() -> String {
	DEFAULT_EXTENSION.to_string()
}

fn default_field_type() -> String {
	FieldKind::Text.to_string()
}

impl TestTxtConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> TestTxtResult<Option<TestTxtConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		Self::from_toml(&content).map(Some)
	}

	pub fn from_toml(content: &str) -> TestTxtResult<TestTxtConfig> {
		toml::from_str(content).map_err(|e| TestTxtError::ConfigParse(e.to_string()))
	}

	/// Build the schema declared by `fields`.
	pub fn schema(&self) -> TestTxtResult<Schema> {
		let mut builder = Schema::builder();
		for field in &self.fields {
			builder = builder.field(&field.name, FieldKind::parse(&field.name, &field.kind)?);
		}

		builder.build()
	}
}
