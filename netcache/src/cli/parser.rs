use std::net::SocketAddr;
use std::path::PathBuf;
use std::thread;

use clap::{ArgAction, Parser};
use netcache_common::network::{DEFAULT_DEVICE_PORT, DEFAULT_SERVER_PORT};
use netcache_common::{Key, DEFAULT_SLOTS};

use super::assignment::{parse_assignment, Assignment};

fn default_threads() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn parse_slots(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("slot count must be at least 1".to_string()),
        Ok(slots) => Ok(slots),
        Err(err) => Err(err.to_string()),
    }
}

/// In-network key-value cache device
#[derive(Parser, Debug)]
#[command(name = "netcached", version)]
pub struct NetcacheArgs {
    /// Client-facing address to listen on
    #[arg(short, long, default_value_t = loopback(DEFAULT_DEVICE_PORT))]
    pub listen: SocketAddr,

    /// Backend key-value server
    #[arg(short, long)]
    pub server: SocketAddr,

    /// Local address of the socket used to talk to the backend
    #[arg(long, default_value = "0.0.0.0:0")]
    pub upstream_bind: SocketAddr,

    /// Number of learned cache slots
    #[arg(long, default_value_t = DEFAULT_SLOTS, value_parser = parse_slots)]
    pub slots: usize,

    /// Static rule, can be repeated
    #[arg(short, long = "rule", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub rules: Vec<Assignment>,

    /// File with one KEY=VALUE static rule per line
    #[arg(long, value_name = "PATH")]
    pub rules_file: Option<PathBuf>,

    /// Number of runtime worker threads
    #[arg(short, long, default_value_t = default_threads())]
    pub threads: usize,

    /// Sets the level of verbosity
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Backend key-value server answering cache requests
#[derive(Parser, Debug)]
#[command(name = "netcache-server", version)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(short, long, default_value_t = loopback(DEFAULT_SERVER_PORT))]
    pub listen: SocketAddr,

    /// Records served by the backend
    #[arg(value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub records: Vec<Assignment>,

    /// Sets the level of verbosity
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Queries a single key and prints its value or NOTFOUND
#[derive(Parser, Debug)]
#[command(name = "netcache-client", version)]
pub struct ClientArgs {
    /// Address to send the query to
    pub target: SocketAddr,

    pub key: Key,

    /// How long to wait for the response
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Sets the level of verbosity
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn parse(args: Vec<String>) -> Result<NetcacheArgs, clap::Error> {
    NetcacheArgs::try_parse_from(args)
}

pub fn parse_server(args: Vec<String>) -> Result<ServerArgs, clap::Error> {
    ServerArgs::try_parse_from(args)
}

pub fn parse_client(args: Vec<String>) -> Result<ClientArgs, clap::Error> {
    ClientArgs::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_device_defaults() {
        let config = parse(args(&["netcached", "--server", "10.0.0.1:7000"])).unwrap();
        assert_eq!(config.listen, "127.0.0.1:7070".parse().unwrap());
        assert_eq!(config.server, "10.0.0.1:7000".parse().unwrap());
        assert_eq!(config.upstream_bind, "0.0.0.0:0".parse().unwrap());
        assert_eq!(config.slots, DEFAULT_SLOTS);
        assert!(config.rules.is_empty());
        assert!(config.rules_file.is_none());
        assert!(config.threads >= 1);
        assert_eq!(config.verbose, 0);
    }

    #[test]
    fn test_device_rules_and_verbosity() {
        let config = parse(args(&[
            "netcached",
            "-s",
            "10.0.0.1:7000",
            "--rule",
            "3=33",
            "-r",
            "4=44",
            "--slots",
            "8",
            "-vvv",
        ]))
        .unwrap();
        assert_eq!(
            config.rules,
            vec![
                Assignment { key: 3, value: 33 },
                Assignment { key: 4, value: 44 }
            ]
        );
        assert_eq!(config.slots, 8);
        assert_eq!(config.verbose, 3);
    }

    #[test]
    fn test_device_requires_server() {
        assert!(parse(args(&["netcached"])).is_err());
    }

    #[test]
    fn test_device_rejects_zero_slots() {
        assert!(parse(args(&["netcached", "-s", "10.0.0.1:7000", "--slots", "0"])).is_err());
    }

    #[test]
    fn test_device_rejects_bad_rule() {
        assert!(parse(args(&["netcached", "-s", "10.0.0.1:7000", "--rule", "3"])).is_err());
    }

    #[test]
    fn test_server_records() {
        let config = parse_server(args(&["netcache-server", "1=11", "2=22"])).unwrap();
        assert_eq!(config.listen, "127.0.0.1:7000".parse().unwrap());
        assert_eq!(
            config.records,
            vec![
                Assignment { key: 1, value: 11 },
                Assignment { key: 2, value: 22 }
            ]
        );
    }

    #[test]
    fn test_client_args() {
        let config = parse_client(args(&["netcache-client", "10.0.0.1:7070", "123"])).unwrap();
        assert_eq!(config.target, "10.0.0.1:7070".parse().unwrap());
        assert_eq!(config.key, 123);
        assert_eq!(config.timeout_ms, 1000);
    }

    #[test]
    fn test_client_rejects_bad_key() {
        assert!(parse_client(args(&["netcache-client", "10.0.0.1:7070", "abc"])).is_err());
    }
}
