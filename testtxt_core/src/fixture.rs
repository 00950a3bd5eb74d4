//! Materialize the input files of a test on disk.
//!
//! Test descriptions often carry the content of several input files in a
//! single text block. Each file starts with a marker line of dashes followed
//! by its path:
//!
//! ```text
//! ---- dir/a.txt
//! content of a
//! ---- b.txt
//! content of b
//! ```

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::TestTxtError;
use crate::TestTxtResult;

/// Input value that stands for an empty input.
pub const EMPTY_INPUT: &str = "NONE";

static FILE_MARKER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?m)^-+[ ]*\S+[ ]*\n").expect("valid file marker pattern"));

/// Create `in_dir` and fill it with the files described by `input`.
///
/// Without file markers the whole input is written to `in_dir/single` and
/// that path is returned. Otherwise the input must start with a marker, every
/// marked section becomes one file and `in_dir` is returned.
pub fn prepare_in_dir(
	in_dir: impl AsRef<Path>,
	single: &str,
	input: &str,
) -> TestTxtResult<PathBuf> {
	let in_dir = in_dir.as_ref();
	let input = if input == EMPTY_INPUT { "" } else { input };
	let markers: Vec<_> = FILE_MARKER.find_iter(input).collect();

	let Some(first) = markers.first() else {
		let file = in_dir.join(single);
		write_file(&file, input)?;
		return Ok(file);
	};

	if first.start() != 0 {
		return Err(TestTxtError::MissingFileMarker);
	}

	for (idx, marker) in markers.iter().enumerate() {
		let name = marker.as_str().trim_end_matches('\n').trim_matches(['-', ' ']);
		let end = markers.get(idx + 1).map_or(input.len(), regex::Match::start);
		write_file(&fixture_path(in_dir, name)?, &input[marker.end()..end])?;
	}

	Ok(in_dir.to_path_buf())
}

/// Resolve a marker file name below `in_dir`. Root and prefix components are
/// dropped so absolute names stay inside `in_dir`, `..` is rejected.
fn fixture_path(in_dir: &Path, name: &str) -> TestTxtResult<PathBuf> {
	let mut path = in_dir.to_path_buf();
	let mut depth = 0;

	for component in Path::new(name).components() {
		match component {
			Component::Normal(part) => {
				path.push(part);
				depth += 1;
			}
			Component::ParentDir => {
				return Err(TestTxtError::InvalidFixturePath(name.to_string()));
			}
			Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
		}
	}

	if depth == 0 {
		return Err(TestTxtError::InvalidFixturePath(name.to_string()));
	}

	Ok(path)
}

fn write_file(path: &Path, content: &str) -> TestTxtResult<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}

	tracing::trace!(path = %path.display(), "writing fixture file");
	std::fs::write(path, content)?;

	Ok(())
}
