use clap::Parser;

/// Arguments for the validate command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Check a manifest before installing it:\n    rigger validate ./dev.cfg")]
pub struct ValidateArgs {
    /// Manifest location (path or http(s) URL)
    pub source: String,

    /// Do not follow `extends` in the manifest
    #[arg(long)]
    pub no_inherit: bool,
}
