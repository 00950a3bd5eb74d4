use std::fmt::Display;

/// Marker name that declares a template.
pub const TEMPLATE_MARKER: &str = "TEMPL";
/// Marker name of a trailing substitution rule.
pub const SUBST_MARKER: &str = "SUBST";
/// Marker name that explicitly ends a multi-line block.
pub const END_MARKER: &str = "END";
/// All marker names that are directives rather than fields.
pub const RESERVED_MARKERS: [&str; 3] = [TEMPLATE_MARKER, SUBST_MARKER, END_MARKER];

/// A recognized `=NAME=` marker.
///
/// The reserved names are split off into their own variants so that the
/// binder never has to compare strings to find directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
	/// `=NAME=` introducing the value of a field.
	Field(String),
	/// `=TEMPL=`
	TemplateDecl,
	/// `=SUBST=`
	SubstDecl,
	/// `=END=`
	BlockEnd,
}

impl Marker {
	pub fn from_name(name: &str) -> Self {
		match name {
			TEMPLATE_MARKER => Self::TemplateDecl,
			SUBST_MARKER => Self::SubstDecl,
			END_MARKER => Self::BlockEnd,
			_ => Self::Field(name.to_string()),
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Field(name) => name,
			Self::TemplateDecl => TEMPLATE_MARKER,
			Self::SubstDecl => SUBST_MARKER,
			Self::BlockEnd => END_MARKER,
		}
	}
}

impl Display for Marker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "={}=", self.name())
	}
}

/// Returns true if `name` is a non-empty run of ASCII letters, digits and
/// underscores.
pub fn is_identifier(name: &str) -> bool {
	!name.is_empty()
		&& name
			.bytes()
			.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

/// Extract the marker name from a raw line of the form `=NAME=...`.
///
/// The name sits between the first two `=` characters of the line. Leading
/// whitespace is not allowed.
pub fn marker_name(line: &str) -> Option<&str> {
	let rest = line.strip_prefix('=')?;
	let end = rest.find('=')?;
	let name = &rest[..end];

	is_identifier(name).then_some(name)
}
