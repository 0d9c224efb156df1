//! Egress point descriptions
//!
//! An egress point is one rotating network path (an HTTP or SOCKS proxy URL)
//! used to diversify outbound connections. The value itself is immutable;
//! the only mutable aspect is membership in the shared rotating pool.

use std::fmt;

/// A network egress configuration, e.g. `http://10.0.0.1:8080` or
/// `socks5://relay.example.net:1080`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressPoint {
    url: String,
}

impl EgressPoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for EgressPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_url() {
        let egress = EgressPoint::new("socks5://127.0.0.1:1080");
        assert_eq!(egress.to_string(), "socks5://127.0.0.1:1080");
    }
}
