//! Fixed constants and deployment knowledge shared by every component.

/// Minimum rate (Bs per USDT) served whenever live data is unavailable.
pub const FALLBACK_MIN_BOB: f64 = 13.15;

/// Average rate served alongside [`FALLBACK_MIN_BOB`].
pub const FALLBACK_AVG_BOB: f64 = 13.17;

/// How long a client keeps a snapshot before fetching again.
pub const CACHE_TTL_MS: u64 = 5 * 60 * 1000;

/// `max-age` advertised on successful proxy responses, in seconds.
pub const RESPONSE_CACHE_SECS: u32 = 300;

/// Port the proxy binary binds in local development.
pub const VERCEL_DEV_PORT: u16 = 3000;

/// Port the netlify-style dev server listens on.
pub const NETLIFY_DEV_PORT: u16 = 8888;

/// Hosting platform a proxy route emulates.
///
/// Both serve the same handler; only the mount path and the labels in the
/// response payload differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Vercel,
    Netlify,
}

impl Platform {
    /// Path the platform serves its function under.
    pub fn route(&self) -> &'static str {
        match self {
            Platform::Vercel => "/api/binance-proxy",
            Platform::Netlify => "/.netlify/functions/binance-proxy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Vercel => "vercel",
            Platform::Netlify => "netlify",
        }
    }

    /// `source` value stamped on fallback payloads from this platform.
    pub fn fallback_source(&self) -> String {
        format!("{}_fallback", self.label())
    }
}
