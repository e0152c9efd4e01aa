//! Service configuration.

use palisade_core::query::DEFAULT_PAGE_SIZE;

/// Configuration shared by the services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Page size applied when a list call passes none (or a
    /// non-positive one).
    pub default_page_size: u32,
    /// Whether soft-deleted companies may be restored. Production
    /// deployments typically turn this off.
    pub allow_restore: bool,
    /// Optional server-side pepper prepended to passwords before
    /// Argon2id hashing.
    pub pepper: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            allow_restore: true,
            pepper: None,
        }
    }
}
