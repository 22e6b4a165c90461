//! Preference between two handlers that both support the active client.

use super::descriptor::HandlerDescriptor;

/// Returns `true` if `a` should replace `b` as the effective handler.
///
/// The handler whose supported range starts later wins, a missing minimum
/// being the earliest possible start. Equal minimums never replace, which
/// keeps re-activation of the current handler a no-op.
#[must_use]
pub fn more_specific(a: &HandlerDescriptor, b: &HandlerDescriptor) -> bool {
    match (a.versions.min, b.versions.min) {
        (Some(a_min), Some(b_min)) => a_min > b_min,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{ClientVersion, Language};

    const V075: ClientVersion = ClientVersion::new(0, 75, Language::Invariant);
    const V097: ClientVersion = ClientVersion::new(0, 97, Language::Invariant);
    const V104_ENG: ClientVersion = ClientVersion::new(1, 4, Language::English);

    fn descriptors() -> Vec<HandlerDescriptor> {
        vec![
            HandlerDescriptor::new("open", 0xD4),
            HandlerDescriptor::new("075", 0xD4).minimum_client(V075),
            HandlerDescriptor::new("097", 0xD4).minimum_client(V097),
            HandlerDescriptor::new("097-capped", 0xD4)
                .minimum_client(V097)
                .maximum_client(V104_ENG),
            HandlerDescriptor::new("s6-eng", 0xD4).minimum_client(V104_ENG),
            HandlerDescriptor::new("s6", 0xD4).minimum_client(ClientVersion::SEASON_6),
        ]
    }

    #[test]
    fn later_minimum_wins() {
        let open = HandlerDescriptor::new("open", 0xD4);
        let v097 = HandlerDescriptor::new("097", 0xD4).minimum_client(V097);
        assert!(more_specific(&v097, &open));
        assert!(!more_specific(&open, &v097));
    }

    #[test]
    fn preference_is_antisymmetric_and_ties_never_replace() {
        for a in descriptors() {
            for b in descriptors() {
                if a.versions.min == b.versions.min {
                    assert!(!more_specific(&a, &b), "{a} vs {b}");
                    assert!(!more_specific(&b, &a), "{b} vs {a}");
                } else {
                    assert_ne!(more_specific(&a, &b), more_specific(&b, &a), "{a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn language_does_not_affect_preference() {
        let english = HandlerDescriptor::new("s6-eng", 0xD4).minimum_client(V104_ENG);
        let invariant = HandlerDescriptor::new("s6", 0xD4).minimum_client(ClientVersion::SEASON_6);
        assert!(!more_specific(&english, &invariant));
        assert!(!more_specific(&invariant, &english));
    }
}
