//! Client side of the API, as used by `product-cli`.

use std::time::Duration;

/// Agent sent by `product-cli`. It names the product and carries no
/// automation or crawler token, so the admission gate treats it as a
/// human-operated client.
pub const CLI_USER_AGENT: &str = concat!("product-cli/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder preconfigured with the CLI agent and timeout.
pub fn cli_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(CLI_USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::bot::{classify, BotDetector, BotVerdict, Classification};
    use crate::config::BotConfig;

    #[test]
    fn test_cli_agent_passes_bot_detection() {
        assert_eq!(classify(Some(CLI_USER_AGENT)), Classification::Human);

        let detector = BotDetector::from_config(&BotConfig::default()).unwrap();
        let client = "203.0.113.40".parse().unwrap();
        assert_eq!(detector.inspect(Some(CLI_USER_AGENT), client), BotVerdict::Human);
    }
}
