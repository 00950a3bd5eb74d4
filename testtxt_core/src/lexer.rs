use crate::TestTxtError;
use crate::TestTxtResult;
use crate::tokens::END_MARKER;
use crate::tokens::Marker;
use crate::tokens::SUBST_MARKER;
use crate::tokens::marker_name;

/// A cursor over the full text of one input file.
///
/// The cursor only ever moves forward. Line numbers are derived from the
/// consumed prefix when an error needs them.
pub(crate) struct Source<'a> {
	/// Name of the input used in error messages.
	file: &'a str,
	/// The complete input.
	text: &'a str,
	/// Byte offset of the first unconsumed character.
	offset: usize,
}

impl<'a> Source<'a> {
	pub fn new(file: &'a str, text: &'a str) -> Self {
		Self {
			file,
			text,
			offset: 0,
		}
	}

	pub fn file(&self) -> &'a str {
		self.file
	}

	/// The unconsumed remainder of the input.
	fn rest(&self) -> &'a str {
		&self.text[self.offset..]
	}

	/// The current line including its `\n` terminator, if any. Empty only at
	/// the end of input.
	fn current_line(&self) -> &'a str {
		let rest = self.rest();
		match rest.find('\n') {
			Some(idx) => &rest[..=idx],
			None => rest,
		}
	}

	fn advance(&mut self, len: usize) {
		self.offset = (self.offset + len).min(self.text.len());
	}

	/// 1-based number of the line the cursor is on.
	pub fn line_number(&self) -> usize {
		1 + self.text[..self.offset].matches('\n').count()
	}

	/// Skip blank lines and `#` comments and read the next marker, leaving
	/// the cursor directly after its closing `=`.
	///
	/// Returns `None` at the end of input.
	pub fn next_marker(&mut self) -> TestTxtResult<Option<Marker>> {
		loop {
			let line = self.current_line();
			if line.is_empty() {
				return Ok(None);
			}

			let trimmed = line.trim();
			if trimmed.is_empty() || trimmed.starts_with('#') {
				self.advance(line.len());
				continue;
			}

			let Some(name) = marker_name(line) else {
				return Err(TestTxtError::Syntax {
					line: self.line_number(),
					file: self.file.to_string(),
					text: without_terminator(line).to_string(),
				});
			};

			self.advance(name.len() + 2);
			return Ok(Some(Marker::from_name(name)));
		}
	}

	/// Read the text belonging to the marker that was just consumed.
	///
	/// Text on the marker line itself is trimmed and forms the whole block.
	/// Otherwise all following lines are collected verbatim until the next
	/// marker, a blank line or the end of input. An `=END=` marker is
	/// consumed together with the block, anything else stays in place.
	pub fn read_block(&mut self) -> String {
		let line = self.current_line();
		self.advance(line.len());

		let trimmed = line.trim();
		if !trimmed.is_empty() {
			return trimmed.to_string();
		}

		let start = self.offset;
		loop {
			let line = self.current_line();
			if line.trim().is_empty() {
				break;
			}

			if let Some(name) = marker_name(line) {
				let block = self.text[start..self.offset].to_string();
				if name == END_MARKER {
					self.advance(END_MARKER.len() + 2);
				}

				return block;
			}

			self.advance(line.len());
		}

		self.text[start..self.offset].to_string()
	}

	/// Read the remainder of the current line as a template name. The line
	/// terminator is left in place so the template body is read as a
	/// multi-line block.
	pub fn read_template_name(&mut self) -> &'a str {
		let line = without_terminator(self.current_line());
		self.advance(line.len());

		line.trim()
	}

	/// Consume the next line if it is a `=SUBST=` marker and return it
	/// without its terminator.
	pub fn next_subst_line(&mut self) -> Option<&'a str> {
		let line = self.current_line();
		if marker_name(line) != Some(SUBST_MARKER) {
			return None;
		}

		self.advance(line.len());
		Some(without_terminator(line))
	}
}

fn without_terminator(line: &str) -> &str {
	line.trim_end_matches(['\n', '\r'])
}
