use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::ErrorContext;
use crate::TestTxtError;
use crate::TestTxtResult;
use crate::lexer::Source;
use crate::templates::TemplateRegistry;

/// A call `[[name]]` or `[[name data]]`.
///
/// The match is non-greedy, but a single `]` right before the closing `]]`
/// belongs to the data so that `[[name [a, b]]]` passes the sequence
/// `[a, b]`.
static TEMPLATE_CALL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?s)\[\[([A-Za-z0-9_]+)(\s.*?\]?)?\]\]").expect("valid template call pattern")
});

/// One `=SUBST=<d>FROM<d>TO<d>` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstRule {
	pub from: String,
	pub to: String,
}

impl SubstRule {
	/// Parse a raw `=SUBST=` line. The first character of the trimmed payload
	/// is the delimiter and must close the payload.
	pub fn parse(line: &str, context: &ErrorContext) -> TestTxtResult<Self> {
		let payload = line.strip_prefix("=SUBST=").unwrap_or(line).trim();
		let Some(delimiter) = payload.chars().next() else {
			return Err(TestTxtError::EmptySubst {
				context: context.clone(),
			});
		};

		let parts: Vec<&str> = payload[delimiter.len_utf8()..].split(delimiter).collect();
		match parts.as_slice() {
			[from, to, ""] => {
				Ok(Self {
					from: (*from).to_string(),
					to: (*to).to_string(),
				})
			}
			_ => {
				Err(TestTxtError::InvalidSubst {
					line: format!("=SUBST={payload}"),
					context: context.clone(),
				})
			}
		}
	}

	/// Replace every literal occurrence of `from` with `to`.
	pub fn apply(&self, content: &str) -> String {
		content.replace(&self.from, &self.to)
	}
}

/// Read the block of the current marker and run it through template calls
/// and the `=SUBST=` lines that follow it.
pub(crate) fn read_expanded_text(
	source: &mut Source<'_>,
	registry: &TemplateRegistry,
	context: &ErrorContext,
) -> TestTxtResult<String> {
	let block = source.read_block();
	let expanded = expand_template_calls(&block, registry, context)?;
	let rules = read_subst_rules(source, context)?;

	Ok(apply_substitutions(&expanded, &rules))
}

/// Consume all `=SUBST=` lines directly below the cursor.
pub(crate) fn read_subst_rules(
	source: &mut Source<'_>,
	context: &ErrorContext,
) -> TestTxtResult<Vec<SubstRule>> {
	let mut rules = Vec::new();

	while let Some(line) = source.next_subst_line() {
		rules.push(SubstRule::parse(line, context)?);
	}

	Ok(rules)
}

/// Replace every template call in `content` with the rendered template.
///
/// Calls are located in the input text only, so the output of one call is
/// never scanned for further calls.
pub fn expand_template_calls(
	content: &str,
	registry: &TemplateRegistry,
	context: &ErrorContext,
) -> TestTxtResult<String> {
	let mut result = String::with_capacity(content.len());
	let mut last = 0;

	for captures in TEMPLATE_CALL.captures_iter(content) {
		let Some(call) = captures.get(0) else {
			continue;
		};

		result.push_str(&content[last..call.start()]);
		result.push_str(&render_call(&captures, registry, context)?);
		last = call.end();
	}

	result.push_str(&content[last..]);
	Ok(result)
}

fn render_call(
	captures: &Captures<'_>,
	registry: &TemplateRegistry,
	context: &ErrorContext,
) -> TestTxtResult<String> {
	let name = captures.get(1).map_or("", |m| m.as_str());
	let data = captures
		.get(2)
		.map(|m| {
			// Drop the single whitespace character that separates the name.
			let text = m.as_str();
			let skip = text.chars().next().map_or(0, char::len_utf8);
			decode_data(name, &text[skip..], context)
		})
		.transpose()?
		.flatten();

	registry.render(name, data.as_ref(), context)
}

/// Decode the data argument of a template call. Blank arguments and YAML
/// `null` count as no argument.
fn decode_data(
	name: &str,
	data: &str,
	context: &ErrorContext,
) -> TestTxtResult<Option<serde_yaml_ng::Value>> {
	if data.trim().is_empty() {
		return Ok(None);
	}

	let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(data).map_err(|e| {
		TestTxtError::InvalidData {
			name: name.to_string(),
			data: data.to_string(),
			reason: e.to_string(),
			context: context.clone(),
		}
	})?;

	Ok((!value.is_null()).then_some(value))
}

/// Apply substitution rules in order, each one working on the output of the
/// previous rule.
pub fn apply_substitutions(content: &str, rules: &[SubstRule]) -> String {
	let mut result = content.to_string();

	for rule in rules {
		tracing::trace!(from = %rule.from, to = %rule.to, "applying substitution");
		result = rule.apply(&result);
	}

	result
}
