use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

#[derive(Args, Debug)]
#[command(
    about = "Generate shell completion scripts",
    after_help = "EXAMPLES:\n    # Bash\n    clv completions bash > /etc/bash_completion.d/clv\n\n\
                  # Zsh\n    clv completions zsh > ~/.zfunc/_clv"
)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `command` into `out`.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command, out: &mut dyn Write) {
    let name = command.get_name().to_string();
    generate(args.shell, command, name, out);
}
