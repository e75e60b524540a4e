//! Unique identifiers so tests sharing a runtime never collide.

use ulid::Ulid;

/// `{prefix}-{ulid}`.
///
/// ```
/// use meitra_test_support::ids::unique_id;
///
/// let a = unique_id("player");
/// let b = unique_id("player");
/// assert_ne!(a, b);
/// assert!(a.starts_with("player-"));
/// ```
pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new())
}

/// Four distinct player ids for one table.
pub fn table_of_four(prefix: &str) -> [String; 4] {
    let run = Ulid::new();
    ["p0", "p1", "p2", "p3"].map(|seat| format!("{prefix}-{seat}-{run}"))
}
