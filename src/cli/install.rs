use clap::Parser;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install from a local manifest:\n    rigger install ./dev.cfg\n\n\
                   Install from a URL with basic auth:\n    rigger install https://host/dev.cfg --username me\n\n\
                   Install under another namespace:\n    rigger install ./dev.cfg --namespace scratch")]
pub struct InstallArgs {
    /// Manifest location (path or http(s) URL)
    pub source: String,

    /// Namespace to install into (defaults to the manifest's own)
    #[arg(long, short = 'n')]
    pub namespace: Option<String>,

    /// Username for a protected manifest URL
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Password for a protected manifest URL
    #[arg(long, short = 'p')]
    pub password: Option<String>,

    /// Accept invalid TLS certificates when fetching manifests
    #[arg(long)]
    pub allow_bad_certificate: bool,

    /// Do not follow `extends` in the manifest
    #[arg(long)]
    pub no_inherit: bool,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_cli_parsing_install() {
        let cli = Cli::try_parse_from(["rigger", "install", "./dev.cfg"])
            .unwrap_or_else(|e| panic!("Failed to parse CLI arguments: {e}"));
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.source, "./dev.cfg");
                assert_eq!(args.namespace, None);
                assert!(!args.allow_bad_certificate);
                assert!(!args.no_inherit);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_with_options() {
        let cli = Cli::try_parse_from([
            "rigger",
            "install",
            "https://host/dev.cfg",
            "--namespace",
            "scratch",
            "--username",
            "me",
            "--password",
            "secret",
            "--allow-bad-certificate",
            "--no-inherit",
        ])
        .unwrap_or_else(|e| panic!("Failed to parse CLI arguments: {e}"));
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.namespace.as_deref(), Some("scratch"));
                assert_eq!(args.username.as_deref(), Some("me"));
                assert_eq!(args.password.as_deref(), Some("secret"));
                assert!(args.allow_bad_certificate);
                assert!(args.no_inherit);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_requires_source() {
        assert!(Cli::try_parse_from(["rigger", "install"]).is_err());
    }
}
