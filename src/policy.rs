//! The commercial-relationship export filter. A single predicate governs
//! announcement propagation, withdrawal propagation, and data forwarding
//! alike.

use crate::neighbor::Relationship;

/// Routes learned from a customer go to everyone; routes learned from a
/// peer or provider go only to customers.
pub fn export_allowed(from: Relationship, to: Relationship) -> bool {
    from == Relationship::Customer || to == Relationship::Customer
}

#[cfg(test)]
mod tests {
    use super::*;
    use Relationship::*;

    #[test]
    fn customer_routes_export_everywhere() {
        assert!(export_allowed(Customer, Customer));
        assert!(export_allowed(Customer, Peer));
        assert!(export_allowed(Customer, Provider));
    }

    #[test]
    fn peer_routes_export_only_to_customers() {
        assert!(export_allowed(Peer, Customer));
        assert!(!export_allowed(Peer, Peer));
        assert!(!export_allowed(Peer, Provider));
    }

    #[test]
    fn provider_routes_export_only_to_customers() {
        assert!(export_allowed(Provider, Customer));
        assert!(!export_allowed(Provider, Peer));
        assert!(!export_allowed(Provider, Provider));
    }
}
