use std::env;

/// Default spoofed Referer; many media origins reject requests without one.
const DEFAULT_REFERER: &str = "https://kwik.si/";

/// Default browser-like User-Agent sent to origins.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Route the proxy handler is mounted on; also the path rewritten
    /// playlist references point back to.
    pub proxy_path: String,
    /// Referer sent on origin fetches; the Origin header is derived from it.
    pub referer: String,
    /// User-Agent sent on origin fetches.
    pub user_agent: String,
    /// Per-request origin timeout in seconds.
    pub origin_timeout_secs: u64,
    /// Redirect-follow bound for origin fetches.
    pub max_redirects: usize,
    /// Default Cache-Control max-age for static media when the origin sends none.
    pub static_cache_secs: u64,
    /// Default Cache-Control max-age for rewritten manifests when the origin sends none.
    pub manifest_cache_secs: u64,
    /// Permit private/loopback target hosts (dev and test servers).
    pub allow_private_origins: bool,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 3000 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let proxy_path = env::var("PROXY_PATH").unwrap_or_else(|_| "/m3u8-proxy".to_string());

        let referer = env::var("REFERER_URL").unwrap_or_else(|_| DEFAULT_REFERER.to_string());
        let user_agent = env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        let origin_timeout_secs = env::var("ORIGIN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);

        let max_redirects = env::var("MAX_REDIRECTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let static_cache_secs = env::var("STATIC_CACHE_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let manifest_cache_secs = env::var("MANIFEST_CACHE_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        // SSRF guard relaxation: explicit override, else follows dev mode.
        let allow_private_origins = match env::var("ALLOW_PRIVATE_ORIGINS") {
            Ok(v) => v.parse().unwrap_or(is_dev),
            Err(_) => is_dev,
        };

        Ok(Config {
            port,
            is_dev,
            proxy_path,
            referer,
            user_agent,
            origin_timeout_secs,
            max_redirects,
            static_cache_secs,
            manifest_cache_secs,
            allow_private_origins,
        })
    }
}
