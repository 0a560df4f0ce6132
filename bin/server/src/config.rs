use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROCESSING_SECS, DEFAULT_QUEUE_SECS,
};
use crate::pipeline::Pipeline;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Root directory of stored dumps
    pub data_dir: PathBuf,
    /// Timing of the simulated analysis
    pub pipeline: Pipeline,
}

impl ServerConfig {
    /// Priority: command-line args > environment variables > defaults
    pub fn load() -> Result<Self, std::io::Error> {
        Self::from_matches(&Self::command().get_matches(), |key| std::env::var(key).ok())
    }

    fn command() -> Command {
        Command::new("server")
            .about("Reference memory dump case service")
            .arg(
                Arg::new("data-dir")
                    .long("data-dir")
                    .value_name("DIR")
                    .help("Directory for stored dumps (default: server_data, or SERVER_DATA_DIR env var)"),
            )
            .arg(
                Arg::new("port")
                    .long("port")
                    .value_name("PORT")
                    .help("Server port (default: 5000, or SERVER_PORT env var)"),
            )
            .arg(
                Arg::new("host")
                    .long("host")
                    .value_name("HOST")
                    .help("Server host (default: 0.0.0.0, or SERVER_HOST env var)"),
            )
            .arg(
                Arg::new("queue-secs")
                    .long("queue-secs")
                    .value_name("SECONDS")
                    .value_parser(clap::value_parser!(u64))
                    .help("Seconds a case stays queued (default: 5)"),
            )
            .arg(
                Arg::new("processing-secs")
                    .long("processing-secs")
                    .value_name("SECONDS")
                    .value_parser(clap::value_parser!(u64))
                    .help("Seconds the simulated analysis runs (default: 30)"),
            )
    }

    fn from_matches(
        matches: &ArgMatches,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, std::io::Error> {
        let env_host = env("SERVER_HOST");
        let env_port = env("SERVER_PORT");
        let env_data_dir = env("SERVER_DATA_DIR");

        let host = matches
            .get_one::<String>("host")
            .map(|s| s.as_str())
            .or(env_host.as_deref())
            .unwrap_or(DEFAULT_HOST)
            .to_string();

        let port_str = matches
            .get_one::<String>("port")
            .map(|s| s.as_str())
            .or(env_port.as_deref())
            .unwrap_or(DEFAULT_PORT);

        let port = port_str.parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid port number: {}", port_str),
            )
        })?;

        let data_dir = PathBuf::from(
            matches
                .get_one::<String>("data-dir")
                .map(|s| s.as_str())
                .or(env_data_dir.as_deref())
                .unwrap_or(DEFAULT_DATA_DIR),
        );

        let seconds = |name: &str, default: u64| {
            Duration::from_secs(matches.get_one::<u64>(name).copied().unwrap_or(default))
        };

        Ok(ServerConfig {
            host,
            port,
            data_dir,
            pipeline: Pipeline::new(
                seconds("queue-secs", DEFAULT_QUEUE_SECS),
                seconds("processing-secs", DEFAULT_PROCESSING_SECS),
            ),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<ServerConfig, std::io::Error> {
        let matches = ServerConfig::command()
            .try_get_matches_from(std::iter::once("server").chain(args.iter().copied()))
            .unwrap();
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_matches(&matches, |key| {
            env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[], &[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            config.pipeline,
            Pipeline::new(
                Duration::from_secs(DEFAULT_QUEUE_SECS),
                Duration::from_secs(DEFAULT_PROCESSING_SECS)
            )
        );
    }

    #[test]
    fn test_args_override_env() {
        let env = [("SERVER_PORT", "7000"), ("SERVER_HOST", "10.0.0.1"), ("SERVER_DATA_DIR", "/srv/cases")];
        let config = parse(&[], &env).unwrap();
        assert_eq!(config.bind_address(), "10.0.0.1:7000");
        assert_eq!(config.data_dir, PathBuf::from("/srv/cases"));

        let config = parse(&["--port", "9000", "--queue-secs", "0"], &env).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.pipeline.queue(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_port() {
        assert!(parse(&["--port", "http"], &[]).is_err());
    }
}
