//! The path selector: reduces a non-empty candidate set to a single route
//! via six ordered tie-breakers, each narrowing the surviving set by the
//! maximum of one key before the next tie-breaker runs, stopping as soon as
//! one candidate remains.

use crate::prefix;
use crate::table::Route;

/// Selects the single best route toward `dst` out of a non-empty candidate
/// set. Panics if `candidates` is empty -- callers are expected to have
/// already checked for an empty candidate set and responded with `no route`.
pub fn select<'a>(candidates: &[&'a Route], dst: u32) -> &'a Route {
    assert!(!candidates.is_empty(), "select requires a non-empty candidate set");

    // 1. Longest prefix match against dst (raw bit prefix, ignoring the
    // entry's own netmask).
    let step1 = narrow(candidates, |r| prefix::lpm_length(r.network, dst) as i64, true);
    if step1.len() == 1 {
        return step1[0];
    }

    // 2. Highest localpref.
    let step2 = narrow(&step1, |r| r.localpref as i64, true);
    if step2.len() == 1 {
        return step2[0];
    }

    // 3. selfOrigin = true preferred; if none qualify, keep all.
    let self_originated: Vec<&Route> = step2.iter().copied().filter(|r| r.self_origin).collect();
    let step3 = if self_originated.is_empty() { step2 } else { self_originated };
    if step3.len() == 1 {
        return step3[0];
    }

    // 4. Shortest ASPath.
    let step4 = narrow(&step3, |r| -(r.as_path.len() as i64), true);
    if step4.len() == 1 {
        return step4[0];
    }

    // 5. Best origin: IGP > EGP > UNK (lower discriminant wins).
    let step5 = narrow(&step4, |r| -(r.origin as i64), true);
    if step5.len() == 1 {
        return step5[0];
    }

    // 6. Lowest peer IP.
    let step6 = narrow(&step5, |r| -(r.peer.0 as i64), true);

    // Ties remaining after step 6: return the first candidate in input
    // order.
    step6[0]
}

/// Keeps only the candidates that maximize `key`. `greedy` is unused beyond
/// documenting intent (the comparison is always "keep the maximum key");
/// kept as a named parameter so each call site above reads as "this step
/// keeps the max of X" rather than a bare boolean.
fn narrow<'a>(candidates: &[&'a Route], key: impl Fn(&Route) -> i64, _greedy: bool) -> Vec<&'a Route> {
    let best = candidates.iter().map(|r| key(r)).max().unwrap();
    candidates.iter().copied().filter(|r| key(r) == best).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Origin;
    use crate::prefix::{cidr_to_mask, ip_to_u32, Addr};

    fn base_route(network: &str, cidr: u8) -> Route {
        Route {
            network: ip_to_u32(network).unwrap(),
            netmask: cidr_to_mask(cidr),
            peer: Addr::parse("192.168.0.2").unwrap(),
            origin: Origin::Igp,
            localpref: 100,
            self_origin: false,
            as_path: vec![1],
        }
    }

    #[test]
    fn lpm_prefers_longer_match() {
        let a = base_route("10.0.0.0", 8);
        let b = base_route("10.1.0.0", 16);
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let chosen = select(&[&a, &b], dst);
        assert_eq!(chosen.network, b.network);
    }

    #[test]
    fn localpref_breaks_lpm_tie() {
        let mut a = base_route("10.0.0.0", 8);
        let mut b = base_route("10.0.0.0", 8);
        a.localpref = 100;
        b.localpref = 200;
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let chosen = select(&[&a, &b], dst);
        assert_eq!(chosen.localpref, 200);
    }

    #[test]
    fn self_origin_breaks_localpref_tie() {
        let mut a = base_route("10.0.0.0", 8);
        let b = base_route("10.0.0.0", 8);
        a.self_origin = true;
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let chosen = select(&[&a, &b], dst);
        assert!(chosen.self_origin);
    }

    #[test]
    fn shorter_as_path_breaks_remaining_tie() {
        let a = base_route("10.0.0.0", 8);
        let mut b = base_route("10.0.0.0", 8);
        b.as_path = vec![1, 2, 3];
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let chosen = select(&[&a, &b], dst);
        assert_eq!(chosen.as_path.len(), 1);
    }

    #[test]
    fn origin_breaks_as_path_tie() {
        let mut a = base_route("10.0.0.0", 8);
        let mut b = base_route("10.0.0.0", 8);
        a.origin = Origin::Egp;
        b.origin = Origin::Igp;
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let chosen = select(&[&a, &b], dst);
        assert_eq!(chosen.origin, Origin::Igp);
    }

    #[test]
    fn lowest_peer_breaks_origin_tie() {
        let mut a = base_route("10.0.0.0", 8);
        let mut b = base_route("10.0.0.0", 8);
        a.peer = Addr::parse("192.168.0.5").unwrap();
        b.peer = Addr::parse("192.168.0.2").unwrap();
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let chosen = select(&[&a, &b], dst);
        assert_eq!(chosen.peer, b.peer);
    }

    #[test]
    fn selector_is_stable_across_repeated_calls() {
        let a = base_route("10.0.0.0", 8);
        let b = base_route("10.0.0.0", 8);
        let dst = ip_to_u32("10.1.2.3").unwrap();
        let first = select(&[&a, &b], dst) as *const Route;
        let second = select(&[&a, &b], dst) as *const Route;
        assert_eq!(first, second);
    }
}
