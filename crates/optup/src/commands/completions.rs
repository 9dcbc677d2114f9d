//! Shell completions generation

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use optup_core::types::ALL_TOOLS;
use optup_core::HierarchicalConfigLoader;
use std::io::{self, Write};

use crate::cli::Cli;

pub fn run(shell: Shell) -> Result<()> {
    let registry = HierarchicalConfigLoader::new()?.load_tool_registry()?;
    let names: Vec<String> = registry.names().map(str::to_string).collect();

    io::stdout().write_all(&render(shell, names))?;
    Ok(())
}

/// Completion script offering `tool_names` and `ALL` for the tool arguments
fn render(shell: Shell, tool_names: Vec<String>) -> Vec<u8> {
    let values = tool_names
        .into_iter()
        .chain(std::iter::once(ALL_TOOLS.to_string()));

    let mut cmd = Cli::command()
        .mut_arg("tools", |arg| arg.value_parser(PossibleValuesParser::new(values)));

    let mut script = Vec::new();
    generate(shell, &mut cmd, "optup", &mut script);
    script
}
