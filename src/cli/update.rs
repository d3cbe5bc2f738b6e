use clap::Parser;

/// Arguments for the update command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Update from the recorded manifest source:\n    rigger update dev\n\n\
                   Answer every input again:\n    rigger update dev --reconfigure")]
pub struct UpdateArgs {
    /// Installed namespace
    pub namespace: String,

    /// Prompt for every input again, ignoring saved answers
    #[arg(long)]
    pub reconfigure: bool,
}
