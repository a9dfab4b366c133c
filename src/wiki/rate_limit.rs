//! Request rate limiting for wiki API calls

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use tracing::trace;

/// Rate limiter shared by every request the client makes
pub struct GlobalRateLimiter {
    limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl GlobalRateLimiter {
    /// Create a new global rate limiter
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        let quota = Quota::per_second(rps);
        let limiter = RateLimiter::direct(quota);

        Self { limiter }
    }

    /// Wait until a request is allowed
    pub async fn wait(&self) {
        if self.limiter.check().is_err() {
            trace!("Rate limiting wiki API request");
            self.limiter.until_ready().await;
        }
    }
}
