//! Shell completion generation for flowdeckctl
//!
//! Commands:
//! - flowdeckctl completion bash  > /etc/bash_completion.d/flowdeckctl
//! - flowdeckctl completion zsh   > ~/.zsh/completion/_flowdeckctl
//! - flowdeckctl completion fish  > ~/.config/fish/completions/flowdeckctl.fish
//! - flowdeckctl completion powershell > flowdeckctl.ps1

use anyhow::Result;
use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate, Shell as ClapShell};
use std::io;

use crate::cli::Cli;

/// Supported shells for completion
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Elvish,
}

impl From<Shell> for ClapShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => ClapShell::Bash,
            Shell::Zsh => ClapShell::Zsh,
            Shell::Fish => ClapShell::Fish,
            Shell::Powershell => ClapShell::PowerShell,
            Shell::Elvish => ClapShell::Elvish,
        }
    }
}

fn install_hint(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash => "flowdeckctl completion bash > /etc/bash_completion.d/flowdeckctl\n#    or add to ~/.bashrc: source <(flowdeckctl completion bash)",
        Shell::Zsh => "flowdeckctl completion zsh > ~/.zsh/completion/_flowdeckctl\n#    then run 'compinit' to load completions",
        Shell::Fish => "flowdeckctl completion fish > ~/.config/fish/completions/flowdeckctl.fish",
        Shell::Powershell => "flowdeckctl completion powershell > flowdeckctl.ps1\n#    then add '. flowdeckctl.ps1' to your $PROFILE",
        Shell::Elvish => "flowdeckctl completion elvish > ~/.config/elvish/lib/flowdeckctl.elv",
    }
}

/// Write the completion script to stdout and install instructions to stderr
pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(ClapShell::from(shell), &mut cmd, name, &mut io::stdout());

    eprintln!();
    eprintln!("# Installation:");
    eprintln!("#    {}", install_hint(shell));
    Ok(())
}
