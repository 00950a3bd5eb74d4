use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Where an error happened, appended to every message that is raised while
/// reading a file.
///
/// Before the first title marker has been seen only the file name is known.
/// Afterwards errors point at the test that is currently being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
	/// No test has been opened yet.
	File { name: String },
	/// Inside the test whose title marker `title` carries `value`.
	Test { title: String, value: String },
}

impl ErrorContext {
	pub fn file(name: impl Into<String>) -> Self {
		Self::File { name: name.into() }
	}

	pub fn test(title: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Test {
			title: title.into(),
			value: value.into(),
		}
	}
}

impl fmt::Display for ErrorContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::File { name } => write!(f, "in file {name}"),
			Self::Test { title, value } => write!(f, "in test with {title}={value}"),
		}
	}
}

/// Coarse classification of [`TestTxtError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
	/// The record shape handed to the parser is unusable.
	Configuration,
	/// A line that should be a marker is malformed.
	Syntax,
	/// Markers appear in an order or combination that is not allowed.
	Semantic,
	/// Template calls, data arguments, or field values could not be
	/// expanded.
	Expansion,
	/// The input ended before any test was started.
	Eof,
	/// Reading or writing files failed.
	Io,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TestTxtError {
	#[error(transparent)]
	#[diagnostic(code(testtxt::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(testtxt::config_parse),
		help("check that testtxt.toml is valid TOML with an `extension` key and `[[fields]]` tables")
	)]
	ConfigParse(String),

	#[error("expecting record type with at least one field")]
	#[diagnostic(code(testtxt::empty_schema))]
	EmptySchema,

	#[error("unsupported type `{kind}` of field `{field}`")]
	#[diagnostic(
		code(testtxt::unsupported_field_type),
		help("supported field types: text, integer, boolean")
	)]
	UnsupportedFieldType { field: String, kind: String },

	#[error("field `{0}` is not accessible as a marker name")]
	#[diagnostic(
		code(testtxt::invalid_field_name),
		help("field names may only contain ASCII letters, digits and `_`")
	)]
	InvalidFieldName(String),

	#[error("field `{field}` uses the reserved marker name {marker}")]
	#[diagnostic(
		code(testtxt::reserved_field_name),
		help("TEMPL, SUBST and END are directives and can't be used as fields")
	)]
	ReservedFieldName { field: String, marker: String },

	#[error("fields `{first}` and `{second}` both map to marker {marker}")]
	#[diagnostic(code(testtxt::duplicate_field))]
	DuplicateField {
		first: String,
		second: String,
		marker: String,
	},

	#[error("expected token '=...=' at line {line} of file {file}: {text}")]
	#[diagnostic(
		code(testtxt::syntax),
		help("markers start in the first column and look like `=NAME=`")
	)]
	Syntax {
		line: usize,
		file: String,
		text: String,
	},

	#[error("missing {title} in first test of file {file}")]
	#[diagnostic(code(testtxt::missing_title))]
	MissingTitle { title: String, file: String },

	#[error("must define {title} before {name} {context}")]
	#[diagnostic(code(testtxt::title_not_first))]
	TitleNotFirst {
		title: String,
		name: String,
		context: ErrorContext,
	},

	#[error("found multiple {name} {context}")]
	#[diagnostic(code(testtxt::duplicate_marker))]
	DuplicateMarker { name: String, context: ErrorContext },

	#[error("unexpected {name} {context}")]
	#[diagnostic(code(testtxt::unexpected_marker))]
	UnexpectedMarker { name: String, context: ErrorContext },

	#[error("SUBST is only valid at bottom of text block {context}")]
	#[diagnostic(
		code(testtxt::misplaced_subst),
		help("place `=SUBST=/from/to/` lines directly after the text they modify")
	)]
	MisplacedSubst { context: ErrorContext },

	#[error("invalid empty substitution {context}")]
	#[diagnostic(code(testtxt::empty_subst))]
	EmptySubst { context: ErrorContext },

	#[error("invalid substitution: {line} {context}")]
	#[diagnostic(
		code(testtxt::invalid_subst),
		help("use `=SUBST=<d>FROM<d>TO<d>` with a single delimiter character `<d>`")
	)]
	InvalidSubst { line: String, context: ErrorContext },

	#[error("missing name after TEMPL {context}")]
	#[diagnostic(code(testtxt::missing_template_name))]
	MissingTemplateName { context: ErrorContext },

	#[error("invalid name after TEMPL: {name:?} {context}")]
	#[diagnostic(code(testtxt::invalid_template_name))]
	InvalidTemplateName { name: String, context: ErrorContext },

	#[error("missing text after TEMPL {name} {context}")]
	#[diagnostic(code(testtxt::missing_template_body))]
	MissingTemplateBody { name: String, context: ErrorContext },

	#[error("invalid template body for {name}: {reason} {context}")]
	#[diagnostic(code(testtxt::template_compile))]
	TemplateCompile {
		name: String,
		reason: String,
		context: ErrorContext,
	},

	#[error("calling unknown template {name:?} {context}")]
	#[diagnostic(
		code(testtxt::unknown_template),
		help("declare the template with `=TEMPL={name}` before calling it")
	)]
	UnknownTemplate { name: String, context: ErrorContext },

	#[error("invalid YAML data {data:?} in call to template {name:?}: {reason} {context}")]
	#[diagnostic(code(testtxt::invalid_data))]
	InvalidData {
		name: String,
		data: String,
		reason: String,
		context: ErrorContext,
	},

	#[error("executing template {name:?}: {reason} {context}")]
	#[diagnostic(code(testtxt::template_execution))]
	TemplateExecution {
		name: String,
		reason: String,
		context: ErrorContext,
	},

	#[error("invalid value for field {field:?}: {reason} {context}")]
	#[diagnostic(code(testtxt::invalid_value))]
	InvalidValue {
		field: String,
		reason: String,
		context: ErrorContext,
	},

	#[error("missing file marker in first line of fixture input")]
	#[diagnostic(
		code(testtxt::missing_file_marker),
		help("start the input with a line like `---- path/to/file`")
	)]
	MissingFileMarker,

	#[error("invalid fixture file name {0:?}")]
	#[diagnostic(
		code(testtxt::invalid_fixture_path),
		help("fixture file names are relative paths below the input directory without `..`")
	)]
	InvalidFixturePath(String),
}

impl TestTxtError {
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Io(_) => ErrorCategory::Io,
			Self::ConfigParse(_)
			| Self::EmptySchema
			| Self::UnsupportedFieldType { .. }
			| Self::InvalidFieldName(_)
			| Self::ReservedFieldName { .. }
			| Self::DuplicateField { .. } => ErrorCategory::Configuration,
			Self::Syntax { .. } | Self::MissingFileMarker | Self::InvalidFixturePath(_) => {
				ErrorCategory::Syntax
			}
			Self::MissingTitle { .. } => ErrorCategory::Eof,
			Self::TitleNotFirst { .. }
			| Self::DuplicateMarker { .. }
			| Self::UnexpectedMarker { .. }
			| Self::MisplacedSubst { .. }
			| Self::EmptySubst { .. }
			| Self::InvalidSubst { .. }
			| Self::MissingTemplateName { .. }
			| Self::InvalidTemplateName { .. }
			| Self::MissingTemplateBody { .. } => ErrorCategory::Semantic,
			Self::TemplateCompile { .. }
			| Self::UnknownTemplate { .. }
			| Self::InvalidData { .. }
			| Self::TemplateExecution { .. }
			| Self::InvalidValue { .. } => ErrorCategory::Expansion,
		}
	}

	/// The context the error was raised in, if it was raised while reading
	/// markers.
	pub fn context(&self) -> Option<&ErrorContext> {
		match self {
			Self::TitleNotFirst { context, .. }
			| Self::DuplicateMarker { context, .. }
			| Self::UnexpectedMarker { context, .. }
			| Self::MisplacedSubst { context }
			| Self::EmptySubst { context }
			| Self::InvalidSubst { context, .. }
			| Self::MissingTemplateName { context }
			| Self::InvalidTemplateName { context, .. }
			| Self::MissingTemplateBody { context, .. }
			| Self::TemplateCompile { context, .. }
			| Self::UnknownTemplate { context, .. }
			| Self::InvalidData { context, .. }
			| Self::TemplateExecution { context, .. }
			| Self::InvalidValue { context, .. } => Some(context),
			_ => None,
		}
	}
}

pub type TestTxtResult<T> = Result<T, TestTxtError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
