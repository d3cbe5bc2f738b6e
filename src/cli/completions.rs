use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    rigger completions bash > ~/.bash_completion.d/rigger\n\n\
                  Generate zsh completions:\n    rigger completions zsh > ~/.zfunc/_rigger\n\n\
                  Generate fish completions:\n    rigger completions fish > ~/.config/fish/completions/rigger.fish\n\n\
                  Generate PowerShell completions:\n    rigger completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
