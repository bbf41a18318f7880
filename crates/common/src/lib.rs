/**
 * Opaque, unguessable public identifiers for
 *  shares and files.
 */
pub mod ids;
/**
 * Process-wide token bucket used to throttle
 *  anonymous writes.
 */
pub mod rate_limit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::ids::{IdError, FILE_HASH_LEN, SHARE_HASH_LEN};
    pub use crate::rate_limit::{RateLimitConfig, RateLimitResult, RateLimiter};
    pub use crate::version::{build_info, BuildInfo};
}
