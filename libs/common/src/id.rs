use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = yaksa_common::id::prefixed_ulid("com");
/// assert!(id.starts_with("com_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new())
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const COMMUNITY: &str = "com";
    pub const MEMBERSHIP: &str = "mem";
    pub const POST: &str = "pst";
}

/// Reserved owner of system-created communities. Never a real user.
pub const SYSTEM_USER_ID: &str = "00000000-0000-0000-0000-000000000000";
