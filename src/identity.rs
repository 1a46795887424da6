//! Obfuscation of the `created_by` column. The scraped username is personal
//! data; deployments that need it masked plug in their own encoder.

/// Transforms a username before it is stored on a workout row.
pub trait IdentityEncoder: Send + Sync {
    fn encode(&self, username: &str) -> String;
}

/// Stores the username as-is.
pub struct Plaintext;

impl IdentityEncoder for Plaintext {
    fn encode(&self, username: &str) -> String {
        username.to_string()
    }
}
