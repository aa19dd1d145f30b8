//! Static neighbor table: address -> (transport handle, relationship).
//! Built once at startup from the `port-neighbor_ip-relation` command-line
//! tokens and never mutated afterward.

use hashbrown::HashMap;

use crate::error::RouterError;
use crate::prefix::Addr;
use crate::transport::Endpoint;

/// Commercial relationship with a neighbor, controlling export. Customer
/// routes go everywhere; peer/provider routes go only to customers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relationship {
    Customer,
    Peer,
    Provider,
}

impl Relationship {
    pub fn parse(token: &str) -> Result<Self, RouterError> {
        match token {
            "cust" => Ok(Relationship::Customer),
            "peer" => Ok(Relationship::Peer),
            "prov" => Ok(Relationship::Provider),
            other => Err(RouterError::BadArgument(format!(
                "unknown relation {other:?}, expected cust|peer|prov"
            ))),
        }
    }
}

pub struct Neighbor {
    pub addr: Addr,
    pub relationship: Relationship,
    pub endpoint: Endpoint,
}

/// Parsed form of a single `port-neighbor_ip-relation` CLI token, before a
/// socket has been bound for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnSpec {
    pub port: u16,
    pub addr: Addr,
    pub relationship: Relationship,
}

impl ConnSpec {
    pub fn parse(token: &str) -> Result<Self, RouterError> {
        let mut parts = token.split('-');
        let port = parts
            .next()
            .ok_or_else(|| RouterError::BadArgument(token.to_string()))?
            .parse::<u16>()
            .map_err(|_| RouterError::BadArgument(token.to_string()))?;
        let addr_str = parts
            .next()
            .ok_or_else(|| RouterError::BadArgument(token.to_string()))?;
        let addr = Addr::parse(addr_str).map_err(|_| RouterError::BadArgument(token.to_string()))?;
        let rel_str = parts
            .next()
            .ok_or_else(|| RouterError::BadArgument(token.to_string()))?;
        if parts.next().is_some() {
            return Err(RouterError::BadArgument(token.to_string()));
        }
        let relationship = Relationship::parse(rel_str)?;
        Ok(ConnSpec { port, addr, relationship })
    }
}

/// Neighbor's /24 with the fourth octet set to 1.
pub fn our_addr(neighbor: Addr) -> Addr {
    Addr((neighbor.0 & 0xFFFFFF00) | 1)
}

pub struct NeighborTable {
    neighbors: HashMap<Addr, Neighbor>,
}

impl NeighborTable {
    pub fn new(neighbors: Vec<Neighbor>) -> Self {
        let neighbors = neighbors.into_iter().map(|n| (n.addr, n)).collect();
        NeighborTable { neighbors }
    }

    pub fn get(&self, addr: Addr) -> Option<&Neighbor> {
        self.neighbors.get(&addr)
    }

    pub fn relationship_of(&self, addr: Addr) -> Option<Relationship> {
        self.neighbors.get(&addr).map(|n| n.relationship)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Neighbor> {
        self.neighbors.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conn_spec() {
        let spec = ConnSpec::parse("7000-192.168.0.2-cust").unwrap();
        assert_eq!(spec.port, 7000);
        assert_eq!(spec.addr, Addr::parse("192.168.0.2").unwrap());
        assert_eq!(spec.relationship, Relationship::Customer);
    }

    #[test]
    fn rejects_malformed_conn_spec() {
        assert!(ConnSpec::parse("7000-192.168.0.2").is_err());
        assert!(ConnSpec::parse("7000-192.168.0.2-friend").is_err());
        assert!(ConnSpec::parse("notaport-192.168.0.2-cust").is_err());
        assert!(ConnSpec::parse("7000-192.168.0.2-cust-extra").is_err());
    }

    #[test]
    fn our_addr_sets_fourth_octet_to_one() {
        let neighbor = Addr::parse("192.168.0.2").unwrap();
        assert_eq!(our_addr(neighbor), Addr::parse("192.168.0.1").unwrap());
    }
}
