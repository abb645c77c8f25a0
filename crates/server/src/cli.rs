use std::path::PathBuf;

use clap::Parser;

/// Log aggregation server with an MCP-over-SSE query surface.
///
/// Ingests structured log datagrams over UDP and tails log files,
/// persisting everything into a searchable store that automated agents
/// query over the Model Context Protocol.
#[derive(Parser, Debug)]
#[command(name = "loghive", about = "Log aggregation server with MCP access")]
pub struct CliArgs {
    /// UDP port for receiving log datagrams
    #[arg(long, default_value_t = 9999)]
    pub udp_port: u16,

    /// HTTP port for the MCP SSE server
    #[arg(long, default_value_t = 8080)]
    pub http_port: u16,

    /// Path of the log database
    #[arg(long, default_value = "logs.db")]
    pub db: PathBuf,

    /// Tail a log file at startup; repeatable
    #[arg(long = "tail")]
    pub tail: Vec<PathBuf>,

    /// Display name for the matching --tail (paired by position)
    #[arg(long = "tail-name")]
    pub tail_name: Vec<String>,

    /// TLS certificate file (PEM); requires --key
    #[arg(long, requires = "key")]
    pub cert: Option<PathBuf>,

    /// TLS private key file (PEM); requires --cert
    #[arg(long, requires = "cert")]
    pub key: Option<PathBuf>,

    /// Print diagnostics as plain tagged lines on stdout/stderr
    #[arg(long)]
    pub legacy_console: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["loghive"]).unwrap();
        assert_eq!(args.udp_port, 9999);
        assert_eq!(args.http_port, 8080);
        assert_eq!(args.db, PathBuf::from("logs.db"));
        assert!(args.tail.is_empty());
        assert!(!args.legacy_console);
    }

    #[test]
    fn test_tail_pairs() {
        let args = CliArgs::try_parse_from([
            "loghive",
            "--tail",
            "/var/log/game.log",
            "--tail-name",
            "game",
            "--tail",
            "/var/log/server.log",
        ])
        .unwrap();
        assert_eq!(args.tail.len(), 2);
        assert_eq!(args.tail_name, ["game"]);
    }

    #[test]
    fn test_cert_requires_key() {
        assert!(CliArgs::try_parse_from(["loghive", "--cert", "c.pem"]).is_err());
        assert!(
            CliArgs::try_parse_from(["loghive", "--cert", "c.pem", "--key", "k.pem"]).is_ok()
        );
    }

    #[test]
    fn test_unknown_argument_rejected() {
        assert!(CliArgs::try_parse_from(["loghive", "--bogus"]).is_err());
    }
}
