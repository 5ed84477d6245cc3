/// Source of the bearer credential attached to remote exchanges.
///
/// Token issuance lives outside the engine; implementations only hand out
/// whatever the current session holds.
pub trait CredentialPort: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

