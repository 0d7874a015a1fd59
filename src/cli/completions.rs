//! Shell completion scripts

use anyhow::Result;
use clap::{Args, Command};
use clap_complete::{generate, Shell};

#[derive(Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs, command: &mut Command) -> Result<()> {
    let name = command.get_name().to_string();
    generate(args.shell, command, name, &mut std::io::stdout());
    Ok(())
}
