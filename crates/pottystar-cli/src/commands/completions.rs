use clap::CommandFactory;
use clap_complete::Shell;

use crate::Cli;

/// Generate and print a shell completion script to stdout.
pub fn run(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "pottystar", &mut std::io::stdout());
}
