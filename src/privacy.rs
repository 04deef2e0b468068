//! Cosmetic privacy helpers: a fake region label per post and a salted,
//! truncated hash for logging peer addresses without storing them.

use rand::seq::IndexedRandom;
use sha2::{Digest, Sha256};

const FAKE_REGIONS: [&str; 12] = [
    "Northern District", "Eastern Zone", "Western Area", "Central Region",
    "Southern Territory", "Mountain Valley", "Coastal Plains", "Urban Core",
    "Riverside District", "Highland Area", "Metro Junction", "Green Valley",
];

/// A synthetic region tag. Carries no real geolocation.
pub fn fake_region() -> &'static str {
    FAKE_REGIONS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(FAKE_REGIONS[0])
}

/// First 8 hex chars of sha256(addr + salt). Log-only identifier.
pub fn hash_addr(addr: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(addr.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_comes_from_the_fixed_set() {
        for _ in 0..50 {
            assert!(FAKE_REGIONS.contains(&fake_region()));
        }
    }

    #[test]
    fn addr_hash_is_short_stable_and_salted() {
        let a = hash_addr("203.0.113.9", "salt");
        assert_eq!(a.len(), 8);
        assert_eq!(a, hash_addr("203.0.113.9", "salt"));
        assert_ne!(a, hash_addr("203.0.113.9", "other-salt"));
        assert_ne!(a, hash_addr("203.0.113.10", "salt"));
    }
}
