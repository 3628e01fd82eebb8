use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{
    thread_rng, Rng,
    distributions,
};


pub fn generate_rand_id(length: usize) -> String {
    thread_rng()
        .sample_iter(&distributions::Alphanumeric)
        .map(char::from)
        .take(length)
        .collect()
}

pub fn calculate_hash<T: Hash>(t: &T) -> u64 {
    let mut s = DefaultHasher::new();
    t.hash(&mut s);
    s.finish()
}

/// Seconds since the unix epoch; times before it count as zero.
pub fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use std::time::Duration;
    use super::*;

    #[test]
    fn rand_id_has_requested_length() {
        let id = generate_rand_id(32);
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hash_is_stable_for_equal_input() {
        assert_eq!(calculate_hash(&"pw1234"), calculate_hash(&"pw1234"));
        assert_ne!(calculate_hash(&"pw1234"), calculate_hash(&"pw1235"));
    }

    #[test]
    fn epoch_secs_truncates_and_clamps() {
        let t = UNIX_EPOCH + Duration::new(1700000000, 999_000_000);
        assert_eq!(epoch_secs(t), 1700000000);
        assert_eq!(epoch_secs(UNIX_EPOCH - Duration::new(5, 0)), 0);
    }
}
