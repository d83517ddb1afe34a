use clap::Parser;
use dns_client::{Protocol, RecordClass, RecordType};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "rust-dns")]
#[command(about = "Query a DNS server and print the decoded response", long_about = None)]
pub struct Args {
    /// Domain name to look up
    pub host: String,

    /// Record type, a mnemonic such as A, MX, SOA or the generic TYPE<n>
    #[arg(short = 't', long = "type", default_value = "A")]
    pub qtype: RecordType,

    /// Record class, IN, CH, HS or CLASS<n>
    #[arg(short = 'c', long = "class", default_value = "IN")]
    pub qclass: RecordClass,

    /// DNS server, where <address> will be of the form <ip>:<port>
    #[arg(short, long, default_value = "8.8.8.8:53", value_parser = parse_socket_addr)]
    pub server: SocketAddr,

    /// Send the query over TCP instead of UDP
    #[arg(long)]
    pub tcp: bool,

    /// Give up after this many milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout: u64,

    /// Log query construction and transport details
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_socket_addr(s: &str) -> Result<SocketAddr, String> {
    s.parse::<SocketAddr>().map_err(|_| {
        format!(
            "Invalid address format: '{}'. Expected format: <ip>:<port>",
            s
        )
    })
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn protocol(&self) -> Protocol {
        if self.tcp {
            Protocol::Tcp
        } else {
            Protocol::Udp
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["rust-dns", "example.com"]).unwrap();
        assert_eq!(args.host, "example.com");
        assert_eq!(args.qtype, RecordType::A);
        assert_eq!(args.qclass, RecordClass::IN);
        assert_eq!(args.server, "8.8.8.8:53".parse::<SocketAddr>().unwrap());
        assert_eq!(args.protocol(), Protocol::Udp);
        assert_eq!(args.timeout(), Duration::from_millis(5000));
        assert_eq!(args.log_level(), Level::WARN);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "rust-dns",
            "example.com",
            "-t",
            "mx",
            "-c",
            "CH",
            "-s",
            "[::1]:5353",
            "--tcp",
            "--timeout",
            "250",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.qtype, RecordType::MX);
        assert_eq!(args.qclass, RecordClass::CH);
        assert_eq!(args.server, "[::1]:5353".parse::<SocketAddr>().unwrap());
        assert_eq!(args.protocol(), Protocol::Tcp);
        assert_eq!(args.timeout(), Duration::from_millis(250));
        assert_eq!(args.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Args::try_parse_from(["rust-dns", "example.com", "-t", "BOGUS"]).is_err());
        assert!(Args::try_parse_from(["rust-dns", "example.com", "-s", "8.8.8.8"]).is_err());
        assert!(Args::try_parse_from(["rust-dns"]).is_err());
    }
}
