use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use testtxt_core::FieldKind;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Parse marker-delimited test description files into typed records.",
	long_about = "testtxt reads test description files made of `=NAME=` markers, expands \
	              `=TEMPL=` templates and `=SUBST=` rules, and binds the result to the fields \
	              declared in `testtxt.toml` or with `--field`.\n\nQuick start:\n  testtxt \
	              check  Parse every test file and report errors\n  testtxt print  Print \
	              the parsed records"
)]
pub struct TestTxtCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Directory holding the test files and `testtxt.toml`.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Declare a field as `NAME` or `NAME:TYPE`. Overrides the fields of
	/// `testtxt.toml`. The first field is the title field.
	#[arg(long = "field", short = 'f', global = true, value_name = "NAME[:TYPE]")]
	pub fields: Vec<FieldArg>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Parse test description files and report the first error of each.
	///
	/// Without file arguments every file with the configured extension in the
	/// project directory is checked. Exits with a non-zero status code if any
	/// file fails to parse.
	Check {
		/// Files to check instead of the discovered test files.
		files: Vec<PathBuf>,
	},
	/// Print the records parsed from test description files.
	Print {
		/// Files to print instead of the discovered test files.
		files: Vec<PathBuf>,

		/// Output format. Use `text` for one `FIELD: value` line per field,
		/// `json` or `yaml` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output.
	Text,
	/// A JSON object mapping each file to its records.
	Json,
	/// A YAML mapping of each file to its records.
	Yaml,
}

/// A field declared on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldArg {
	pub name: String,
	pub kind: FieldKind,
}

impl FromStr for FieldArg {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (name, kind) = match s.split_once(':') {
			Some((name, kind)) => {
				let kind = FieldKind::parse(name, kind).map_err(|e| e.to_string())?;
				(name, kind)
			}
			None => (s, FieldKind::Text),
		};

		Ok(Self {
			name: name.trim().to_string(),
			kind,
		})
	}
}
