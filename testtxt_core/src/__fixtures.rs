use crate::Schema;
use crate::TestTxtResult;
use crate::parse_cases;

crate::test_case! {
	#[derive(Debug, Clone, Default, PartialEq, Eq)]
	pub struct Descr {
		pub title: String,
		pub input: String,
		pub count: i64,
		pub todo: bool,
	}
}

pub fn descr(title: &str) -> Descr {
	Descr {
		title: title.to_string(),
		..Descr::default()
	}
}

pub fn descr_with_input(title: &str, input: &str) -> Descr {
	Descr {
		input: input.to_string(),
		..descr(title)
	}
}

pub fn parse_descr(input: &str) -> TestTxtResult<Vec<Descr>> {
	parse_cases::<Descr>(input, "file")
}

pub fn descr_schema() -> Schema {
	Schema::builder()
		.text("Title")
		.text("Input")
		.integer("Count")
		.boolean("Todo")
		.build()
		.expect("valid schema")
}
