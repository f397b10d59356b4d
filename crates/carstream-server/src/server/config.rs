use anyhow::{Context, bail};
use axum::http::HeaderValue;
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `carstream-server` binary.
///
/// These settings control how long each subscription may emit, how fast the
/// car generator produces records, and which browser origin may call the
/// endpoints. All values are parsed from CLI arguments or environment
/// variables (a `.env` file is honored).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "carstream-server",
    version,
    about = "An HTTP service streaming generated cars as batch, chunked, or SSE responses"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Upper bound, in seconds, on how long a single subscription emits.
    ///
    /// Once it elapses the stream completes normally with whatever was
    /// produced so far.
    ///
    /// Environment variable: `STREAM_TIMEOUT_SECS`
    #[arg(long, env = "STREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub stream_timeout_secs: u64,

    /// Pause, in milliseconds, between two generated cars.
    ///
    /// Environment variable: `EMIT_INTERVAL_MS`
    #[arg(long, env = "EMIT_INTERVAL_MS", default_value_t = 100)]
    pub emit_interval_ms: u64,

    /// Maximum number of cars per subscription. When unset, the generator is
    /// endless and only the stream timeout stops it.
    ///
    /// Environment variable: `MAX_RECORDS`
    #[arg(long, env = "MAX_RECORDS")]
    pub max_records: Option<usize>,

    /// Browser origin allowed to call the endpoints (e.g.
    /// "http://localhost:8081"). When unset, any origin is allowed without
    /// credentials.
    ///
    /// Environment variable: `ALLOWED_ORIGIN`
    #[arg(long, env = "ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Seconds to wait for in-flight streams to drain on shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT_SECS`
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub stream_timeout: Duration,
    pub emit_interval: Duration,
    pub max_records: Option<usize>,
    pub allowed_origin: Option<HeaderValue>,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_timeout_secs == 0 {
            bail!("STREAM_TIMEOUT_SECS must be greater than 0");
        }

        if args.max_records == Some(0) {
            bail!("MAX_RECORDS must be greater than 0 when set");
        }

        let allowed_origin = args
            .allowed_origin
            .map(|origin| {
                HeaderValue::from_str(&origin)
                    .with_context(|| format!("ALLOWED_ORIGIN is not a valid header value: {origin}"))
            })
            .transpose()?;

        Ok(Self {
            server_addr: args.server_addr,
            stream_timeout: Duration::from_secs(args.stream_timeout_secs),
            emit_interval: Duration::from_millis(args.emit_interval_ms),
            max_records: args.max_records,
            allowed_origin,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(core::iter::once("carstream-server").chain(args.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn explicit_flags_are_applied() {
        let config = parse(&[
            "--server-addr",
            "127.0.0.1:9000",
            "--stream-timeout-secs",
            "10",
            "--emit-interval-ms",
            "250",
            "--max-records",
            "42",
            "--allowed-origin",
            "http://localhost:8081",
        ])
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:9000");
        assert_eq!(config.stream_timeout, Duration::from_secs(10));
        assert_eq!(config.emit_interval, Duration::from_millis(250));
        assert_eq!(config.max_records, Some(42));
        assert_eq!(
            config.allowed_origin,
            Some(HeaderValue::from_static("http://localhost:8081"))
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = parse(&["--stream-timeout-secs", "0"]).unwrap_err();
        assert!(err.to_string().contains("STREAM_TIMEOUT_SECS"));
    }

    #[test]
    fn rejects_zero_max_records() {
        let err = parse(&["--max-records", "0"]).unwrap_err();
        assert!(err.to_string().contains("MAX_RECORDS"));
    }

    #[test]
    fn rejects_malformed_origin() {
        assert!(parse(&["--allowed-origin", "http://bad\norigin"]).is_err());
    }
}
