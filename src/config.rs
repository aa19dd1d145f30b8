//! Command-line parsing and the immutable `RouterConfig` it produces. A
//! custom `value_parser` converts each `port-neighbor_ip-relation` token
//! into a [`ConnSpec`].

use clap::Parser;

use crate::error::RouterError;
use crate::neighbor::ConnSpec;

#[derive(Parser, Debug)]
#[command(name = "routerd", about = "A simplified BGP-like route processor")]
struct Cli {
    /// This router's autonomous system number.
    asn: u32,

    /// One or more `port-neighbor_ip-relation` connections, e.g.
    /// `7000-192.168.0.2-cust`.
    #[arg(required = true, value_parser = parse_conn)]
    conns: Vec<ConnSpec>,
}

fn parse_conn(token: &str) -> Result<ConnSpec, String> {
    ConnSpec::parse(token).map_err(|e| e.to_string())
}

pub struct RouterConfig {
    pub asn: u32,
    pub neighbors: Vec<ConnSpec>,
}

impl RouterConfig {
    /// Parses `std::env::args()`. A malformed argument is a fatal startup
    /// error; `clap` itself prints usage and exits non-zero for the cases
    /// it catches directly, and our custom parser errors are reported the
    /// same way.
    pub fn from_args() -> Result<Self, RouterError> {
        let cli = Cli::parse();
        if cli.conns.is_empty() {
            return Err(RouterError::BadArgument("at least one connection is required".into()));
        }
        Ok(RouterConfig {
            asn: cli.asn,
            neighbors: cli.conns,
        })
    }
}
