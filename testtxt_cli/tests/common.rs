use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn testtxt_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("testtxt"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TESTTXT_LOG");
	cmd
}

pub const CONFIG: &str = r#"
[[fields]]
name = "Title"

[[fields]]
name = "Input"

[[fields]]
name = "Count"
type = "integer"
"#;
