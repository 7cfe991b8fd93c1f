//! CLI help output specs.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_nonzero() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn help_flag_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("attach")
        .stdout_has("spawn")
        .stdout_has("cancel")
        .stdout_has("interrupt");
}

#[test]
fn version_flag_prints_a_version() {
    cli().args(&["--version"]).passes().stdout_eq("conclave 0.1.0\n");
}
