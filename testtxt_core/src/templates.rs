use std::fmt;
use std::sync::Arc;

use chrono::Local;
use chrono::TimeDelta;
use minijinja::Environment;
use minijinja::ErrorKind;
use minijinja::UndefinedBehavior;
use minijinja::Value;
use minijinja::context;
use minijinja::value::Enumerator;
use minijinja::value::Object;
use minijinja::value::ObjectRepr;
use minijinja::value::ValueKind;

use crate::ErrorContext;
use crate::TestTxtError;
use crate::TestTxtResult;

/// Templates declared with `=TEMPL=` while reading one file.
///
/// Every parse owns its own registry, so nothing leaks between files or
/// between concurrent parses.
pub struct TemplateRegistry {
	env: Environment<'static>,
}

impl Default for TemplateRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl TemplateRegistry {
	pub fn new() -> Self {
		let mut env = Environment::new();
		env.set_keep_trailing_newline(true);
		env.set_undefined_behavior(UndefinedBehavior::Chainable);
		env.add_function("DATE", date);

		Self { env }
	}

	/// Compile `body` and store it under `name`, replacing any template that
	/// was declared with the same name before.
	pub fn register(
		&mut self,
		name: &str,
		body: String,
		context: &ErrorContext,
	) -> TestTxtResult<()> {
		tracing::debug!(template = name, "registering template");

		self.env
			.add_template_owned(name.to_string(), body)
			.map_err(|e| {
				TestTxtError::TemplateCompile {
					name: name.to_string(),
					reason: e.to_string(),
					context: context.clone(),
				}
			})
	}

	pub fn contains(&self, name: &str) -> bool {
		self.env.get_template(name).is_ok()
	}

	/// Render the template `name` with the call argument bound to the
	/// `data` variable. Without an argument the variable stays undefined.
	///
	/// Missing mapping keys, and fields of undefined values, render empty.
	/// Accessing a field of a scalar or a sequence fails.
	pub fn render(
		&self,
		name: &str,
		data: Option<&serde_yaml_ng::Value>,
		context: &ErrorContext,
	) -> TestTxtResult<String> {
		let template = self.env.get_template(name).map_err(|_| {
			TestTxtError::UnknownTemplate {
				name: name.to_string(),
				context: context.clone(),
			}
		})?;

		let ctx = match data {
			Some(value) => context! { data => template_value(value) },
			None => context! {},
		};

		template.render(ctx).map_err(|e| {
			TestTxtError::TemplateExecution {
				name: name.to_string(),
				reason: e.to_string(),
				context: context.clone(),
			}
		})
	}
}

/// Convert decoded call data into a template value. Mappings stay plain
/// maps, everything else is wrapped in [`Unkeyed`].
fn template_value(value: &serde_yaml_ng::Value) -> Value {
	match value {
		serde_yaml_ng::Value::Null => Value::from(()),
		serde_yaml_ng::Value::Mapping(mapping) => {
			mapping
				.iter()
				.map(|(key, value)| (Value::from_serialize(key), template_value(value)))
				.collect()
		}
		serde_yaml_ng::Value::Sequence(items) => {
			Value::from_object(Unkeyed(items.iter().map(template_value).collect()))
		}
		serde_yaml_ng::Value::Tagged(tagged) => template_value(&tagged.value),
		scalar => Value::from_object(Unkeyed(Value::from_serialize(scalar))),
	}
}

/// A scalar or sequence argument. Indexing, iteration and rendering reach the
/// wrapped value, field access is an error.
struct Unkeyed(Value);

impl fmt::Debug for Unkeyed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

impl Object for Unkeyed {
	fn repr(self: &Arc<Self>) -> ObjectRepr {
		if self.0.kind() == ValueKind::Seq {
			ObjectRepr::Seq
		} else {
			ObjectRepr::Plain
		}
	}

	fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
		if let Some(field) = key.as_str() {
			return Some(Value::from(minijinja::Error::new(
				ErrorKind::InvalidOperation,
				format!("can't evaluate field {field} in type {}", self.0.kind()),
			)));
		}

		self.0.get_item(key).ok().filter(|item| !item.is_undefined())
	}

	fn enumerate(self: &Arc<Self>) -> Enumerator {
		match self.repr() {
			ObjectRepr::Seq => Enumerator::Seq(self.0.len().unwrap_or(0)),
			_ => Enumerator::NonEnumerable,
		}
	}

	fn is_true(self: &Arc<Self>) -> bool {
		self.0.is_true()
	}

	fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}

/// `DATE(offset)`: today's local date moved by `offset` days, formatted as
/// `YYYY-MM-DD`.
fn date(offset: &Value) -> Result<String, minijinja::Error> {
	let offset = offset
		.downcast_object_ref::<Unkeyed>()
		.map_or(offset, |unkeyed| &unkeyed.0)
		.as_i64()
		.ok_or_else(|| {
			minijinja::Error::new(ErrorKind::InvalidOperation, "DATE expects an integer offset")
		})?;
	let out_of_range = || {
		minijinja::Error::new(
			ErrorKind::InvalidOperation,
			format!("date offset {offset} is out of range"),
		)
	};
	let delta = TimeDelta::try_days(offset).ok_or_else(out_of_range)?;
	let day = Local::now()
		.date_naive()
		.checked_add_signed(delta)
		.ok_or_else(out_of_range)?;

	Ok(day.format("%Y-%m-%d").to_string())
}
