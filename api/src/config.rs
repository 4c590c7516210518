use std::env;

#[derive(Clone)]
pub struct Config {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Seed the in-memory store with the demo dataset at startup
    pub demo_seed: bool,
    /// Bearer token for the bootstrap admin user (required when demo
    /// seeding is off, otherwise the instance has no way in)
    pub bootstrap_admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            demo_seed: env::var("DEMO_SEED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            bootstrap_admin_token: env::var("BOOTSTRAP_ADMIN_TOKEN").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_demo_data() {
        // No env manipulation; just document the parse rule used above.
        let truthy = |v: &str| v != "0" && !v.eq_ignore_ascii_case("false");
        assert!(truthy("1"));
        assert!(truthy("yes"));
        assert!(!truthy("0"));
        assert!(!truthy("false"));
        assert!(!truthy("FALSE"));
    }
}
