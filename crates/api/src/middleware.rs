//! Request-level plumbing shared by every route.
//!
//! - **client_ip** - `ClientIp` extractor (proxy headers, then socket peer)
//! - **rate_limit** - Per-IP sliding-window limit over `/api/*`

pub mod client_ip;
pub mod rate_limit;
