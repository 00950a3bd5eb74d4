use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use testtxt_cli::Commands;
use testtxt_cli::OutputFormat;
use testtxt_cli::TestTxtCli;
use testtxt_core::AnyResult;
use testtxt_core::DEFAULT_EXTENSION;
use testtxt_core::Record;
use testtxt_core::Schema;
use testtxt_core::config::TestTxtConfig;
use testtxt_core::get_files;
use testtxt_core::parse_file;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "TESTTXT_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TestTxtCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Check { files }) => run_check(&args, files),
		Some(Commands::Print { files, format }) => run_print(&args, files, *format),
		None => {
			eprintln!("No subcommand specified. Run `testtxt --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<testtxt_core::TestTxtError>() {
			Ok(err) => {
				let report: miette::Report = (*err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &TestTxtCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// The schema and test file extension for this invocation. `--field` flags
/// take precedence over the fields of `testtxt.toml`.
fn load_schema(args: &TestTxtCli, root: &Path) -> AnyResult<(Schema, String)> {
	let config = TestTxtConfig::load(root)?;
	let extension = config
		.as_ref()
		.map_or_else(|| DEFAULT_EXTENSION.to_string(), |c| c.extension.clone());

	if !args.fields.is_empty() {
		let schema = args
			.fields
			.iter()
			.fold(Schema::builder(), |builder, field| {
				builder.field(&field.name, field.kind)
			})
			.build()?;
		return Ok((schema, extension));
	}

	match config {
		Some(config) if !config.fields.is_empty() => Ok((config.schema()?, extension)),
		_ => {
			Err(format!(
				"no fields declared: add `[[fields]]` to testtxt.toml in {} or pass --field",
				root.display()
			)
			.into())
		}
	}
}

fn resolve_files(root: &Path, files: &[PathBuf], extension: &str) -> AnyResult<Vec<PathBuf>> {
	if files.is_empty() {
		Ok(get_files(root, extension)?)
	} else {
		Ok(files.to_vec())
	}
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_check(args: &TestTxtCli, files: &[PathBuf]) -> AnyResult<()> {
	let root = resolve_root(args);
	let (schema, extension) = load_schema(args, &root)?;
	let files = resolve_files(&root, files, &extension)?;

	if files.is_empty() {
		println!("No test files found.");
		return Ok(());
	}

	let mut failures = 0;
	let mut total = 0;
	for file in &files {
		let rel = make_relative(file, &root);
		match parse_file(file, &schema) {
			Ok(records) => {
				total += records.len();
				println!("{} {rel} ({} test(s))", colored!("ok", green), records.len());
			}
			Err(e) => {
				failures += 1;
				println!("{} {rel}", colored!("FAILED", red));
				let report: miette::Report = e.into();
				eprintln!("{report:?}");
			}
		}
	}

	println!(
		"\n{} file(s), {total} test(s), {failures} failure(s)",
		files.len()
	);

	if failures > 0 {
		return Err(format!("{failures} file(s) failed to parse").into());
	}

	Ok(())
}

fn run_print(args: &TestTxtCli, files: &[PathBuf], format: OutputFormat) -> AnyResult<()> {
	let root = resolve_root(args);
	let (schema, extension) = load_schema(args, &root)?;
	let files = resolve_files(&root, files, &extension)?;

	let mut parsed: Vec<(String, Vec<Record>)> = Vec::with_capacity(files.len());
	for file in &files {
		parsed.push((make_relative(file, &root), parse_file(file, &schema)?));
	}

	match format {
		OutputFormat::Text => {
			for (file, records) in &parsed {
				println!("{}", colored!(file, bold));
				for record in records {
					print_record(record, &schema);
				}
			}
		}
		OutputFormat::Json => {
			let output: serde_json::Map<String, serde_json::Value> = parsed
				.iter()
				.map(|(file, records)| -> Result<_, serde_json::Error> {
					Ok((file.clone(), serde_json::to_value(records)?))
				})
				.collect::<Result<_, _>>()?;
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
		OutputFormat::Yaml => {
			let output: serde_yaml_ng::Mapping = parsed
				.iter()
				.map(|(file, records)| -> Result<_, serde_yaml_ng::Error> {
					Ok((
						serde_yaml_ng::Value::from(file.as_str()),
						serde_yaml_ng::to_value(records)?,
					))
				})
				.collect::<Result<_, _>>()?;
			print!("{}", serde_yaml_ng::to_string(&output)?);
		}
	}

	Ok(())
}

fn print_record(record: &Record, schema: &Schema) {
	println!();
	for (field, (_, value)) in schema.iter().zip(record.iter()) {
		let value = value.to_string();
		if value.contains('\n') {
			println!("  ={}=", field.marker);
			for line in value.lines() {
				println!("    {line}");
			}
		} else {
			println!("  ={}= {value}", field.marker);
		}
	}
}
