//! Random resource name generation.
//!
//! Names are a fixed prefix followed by lowercase hex characters, which keeps them valid
//! for resource groups, tag keys and tag values alike.

use uuid::Uuid;

/// Generate a name of exactly `length` characters starting with `prefix`.
///
/// Two calls practically never collide, so concurrent runs can share a subscription.
///
/// If `prefix` is longer than `length` it is truncated.
///
/// ```
/// let name = azs_core::naming::random_resource_name("rgRSMA", 24);
/// assert_eq!(name.len(), 24);
/// assert!(name.starts_with("rgRSMA"));
/// ```
#[must_use]
pub fn random_resource_name(prefix: &str, length: usize) -> String {
    let mut name: String = prefix.chars().take(length).collect();
    let mut remaining = length.saturating_sub(name.chars().count());
    while remaining > 0 {
        let hex = Uuid::new_v4().simple().to_string();
        let take = remaining.min(hex.len());
        name.push_str(&hex[..take]);
        remaining -= take;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_prefix() {
        let name = random_resource_name("rgRSTN", 24);
        assert_eq!(name.len(), 24);
        assert!(name.starts_with("rgRSTN"));
        assert!(name[6..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_names_differ() {
        assert_ne!(
            random_resource_name("rgRSMA", 24),
            random_resource_name("rgRSMA", 24)
        );
    }

    #[test]
    fn test_long_length_spans_several_uuids() {
        let name = random_resource_name("x", 80);
        assert_eq!(name.len(), 80);
    }

    #[test]
    fn test_prefix_longer_than_length() {
        assert_eq!(random_resource_name("rgRSMA", 4), "rgRS");
    }
}
