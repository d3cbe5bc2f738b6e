use clap::Parser;

/// Arguments naming an installed namespace
#[derive(Parser, Debug)]
pub struct NamespaceArgs {
    /// Installed namespace
    pub namespace: String,
}
