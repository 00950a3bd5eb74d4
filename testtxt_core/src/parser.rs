use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use crate::ErrorContext;
use crate::Record;
use crate::Schema;
use crate::TestCase;
use crate::TestTxtError;
use crate::TestTxtResult;
use crate::engine::read_expanded_text;
use crate::lexer::Source;
use crate::templates::TemplateRegistry;
use crate::tokens::END_MARKER;
use crate::tokens::Marker;
use crate::tokens::is_identifier;

/// Default extension of test description files.
pub const DEFAULT_EXTENSION: &str = "t";

/// Parse the text of one test description file into records of `schema`.
///
/// `file` names the input in error messages only. The parse either returns
/// every record of the file or the first error, never both.
pub fn parse(source: impl AsRef<str>, file: &str, schema: &Schema) -> TestTxtResult<Vec<Record>> {
	Binder::new(source.as_ref(), file, schema).run()
}

/// Read the file at `path` and parse it with [`parse`].
pub fn parse_file(path: impl AsRef<Path>, schema: &Schema) -> TestTxtResult<Vec<Record>> {
	let path = path.as_ref();
	let content = std::fs::read_to_string(path)?;

	parse(content, &path.display().to_string(), schema)
}

/// Parse the text of one file into typed test cases.
pub fn parse_cases<T: TestCase>(source: impl AsRef<str>, file: &str) -> TestTxtResult<Vec<T>> {
	let schema = T::schema()?;
	let records = parse(source, file, &schema)?;

	Ok(records.iter().map(T::from_record).collect())
}

/// Read the file at `path` and parse it into typed test cases.
pub fn parse_file_as<T: TestCase>(path: impl AsRef<Path>) -> TestTxtResult<Vec<T>> {
	let schema = T::schema()?;
	let path = path.as_ref();
	let content = std::fs::read_to_string(path)?;
	let records = parse(content, &path.display().to_string(), &schema)?;

	Ok(records.iter().map(T::from_record).collect())
}

/// List the files in `dir` whose name ends in `.{extension}`, sorted by path.
pub fn get_files(dir: impl AsRef<Path>, extension: &str) -> TestTxtResult<Vec<PathBuf>> {
	let suffix = format!(".{extension}");
	let mut files = Vec::new();

	for entry in std::fs::read_dir(dir.as_ref())? {
		let entry = entry?;
		if !entry.file_type()?.is_file() {
			continue;
		}

		if entry.file_name().to_string_lossy().ends_with(&suffix) {
			files.push(entry.path());
		}
	}

	files.sort();
	Ok(files)
}

/// Where the binder is in the marker stream.
enum BinderState {
	/// No title marker has been seen yet.
	AwaitingTitle,
	/// A record is open.
	InRecord {
		/// Raw text of the title marker of the open record.
		title: String,
		/// Markers already bound in the open record.
		seen: HashSet<String>,
	},
}

/// Drives the scanner and binds expanded marker text to schema fields.
struct Binder<'a> {
	source: Source<'a>,
	schema: &'a Schema,
	registry: TemplateRegistry,
	state: BinderState,
	records: Vec<Record>,
}

impl<'a> Binder<'a> {
	fn new(text: &'a str, file: &'a str, schema: &'a Schema) -> Self {
		Self {
			source: Source::new(file, text),
			schema,
			registry: TemplateRegistry::new(),
			state: BinderState::AwaitingTitle,
			records: Vec::new(),
		}
	}

	fn context(&self) -> ErrorContext {
		match &self.state {
			BinderState::AwaitingTitle => ErrorContext::file(self.source.file()),
			BinderState::InRecord { title, .. } => {
				ErrorContext::test(&self.schema.title().marker, title)
			}
		}
	}

	fn run(mut self) -> TestTxtResult<Vec<Record>> {
		loop {
			let context = self.context();
			let Some(marker) = self.source.next_marker()? else {
				return self.finish();
			};

			match marker {
				Marker::TemplateDecl => self.declare_template(&context)?,
				Marker::SubstDecl => return Err(TestTxtError::MisplacedSubst { context }),
				Marker::BlockEnd => {
					return Err(TestTxtError::UnexpectedMarker {
						name: END_MARKER.to_string(),
						context,
					});
				}
				Marker::Field(name) => {
					let text = read_expanded_text(&mut self.source, &self.registry, &context)?;
					self.bind(name, &text, context)?;
				}
			}
		}
	}

	fn finish(self) -> TestTxtResult<Vec<Record>> {
		match self.state {
			BinderState::AwaitingTitle => {
				Err(TestTxtError::MissingTitle {
					title: self.schema.title().marker.clone(),
					file: self.source.file().to_string(),
				})
			}
			BinderState::InRecord { .. } => Ok(self.records),
		}
	}

	/// Handle `=TEMPL=name` followed by the template body.
	fn declare_template(&mut self, context: &ErrorContext) -> TestTxtResult<()> {
		let name = self.source.read_template_name();
		if name.is_empty() {
			return Err(TestTxtError::MissingTemplateName {
				context: context.clone(),
			});
		}

		if !is_identifier(name) {
			return Err(TestTxtError::InvalidTemplateName {
				name: name.to_string(),
				context: context.clone(),
			});
		}

		let mut body = read_expanded_text(&mut self.source, &self.registry, context)?;
		if body.ends_with('\n') {
			body.pop();
		}

		if body.is_empty() {
			return Err(TestTxtError::MissingTemplateBody {
				name: name.to_string(),
				context: context.clone(),
			});
		}

		self.registry.register(name, body, context)
	}

	fn bind(&mut self, name: String, text: &str, mut context: ErrorContext) -> TestTxtResult<()> {
		let title = &self.schema.title().marker;

		if name == *title {
			tracing::debug!(title = text, "starting test");
			self.records.push(self.schema.empty_record());
			self.state = BinderState::InRecord {
				title: text.to_string(),
				seen: HashSet::new(),
			};
			context = self.context();
		}

		let BinderState::InRecord { seen, .. } = &mut self.state else {
			return Err(TestTxtError::TitleNotFirst {
				title: title.clone(),
				name,
				context,
			});
		};

		if seen.contains(&name) {
			return Err(TestTxtError::DuplicateMarker { name, context });
		}

		let Some((index, field)) = self.schema.field_for_marker(&name) else {
			return Err(TestTxtError::UnexpectedMarker { name, context });
		};

		let value = field.kind.coerce(text).map_err(|reason| {
			TestTxtError::InvalidValue {
				field: field.name.clone(),
				reason,
				context: context.clone(),
			}
		})?;

		tracing::trace!(marker = %name, "binding field");
		if let Some(record) = self.records.last_mut() {
			record.set(index, value);
		}
		seen.insert(name);

		Ok(())
	}
}
