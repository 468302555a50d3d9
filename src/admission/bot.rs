//! Automated client detection.
//!
//! # Responsibilities
//! - Classify the `User-Agent` into a bot category or a human browser
//! - Let allow-listed categories through
//! - Flag well-known crawler identities coming from outside their published ranges
//!
//! # Design Decisions
//! - Substring tokens on the lowercased agent; no regex on the hot path
//! - A missing agent is an unidentified automated client
//! - Automation tooling outranks any crawler name in the same agent
//! - A search-engine claim is only trusted from that crawler's configured ranges

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::admission::AdmissionError;
use crate::config::BotConfig;

/// Broad class of automated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotCategory {
    SearchEngine,
    Monitor,
    Preview,
    AiCrawler,
    HttpClient,
    Scraper,
    HeadlessBrowser,
    Unknown,
}

impl BotCategory {
    pub const ALL: [BotCategory; 8] = [
        BotCategory::SearchEngine,
        BotCategory::Monitor,
        BotCategory::Preview,
        BotCategory::AiCrawler,
        BotCategory::HttpClient,
        BotCategory::Scraper,
        BotCategory::HeadlessBrowser,
        BotCategory::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            BotCategory::SearchEngine => "search_engine",
            BotCategory::Monitor => "monitor",
            BotCategory::Preview => "preview",
            BotCategory::AiCrawler => "ai_crawler",
            BotCategory::HttpClient => "http_client",
            BotCategory::Scraper => "scraper",
            BotCategory::HeadlessBrowser => "headless_browser",
            BotCategory::Unknown => "unknown",
        }
    }
}

impl FromStr for BotCategory {
    type Err = AdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BotCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AdmissionError::Policy(format!("unknown bot category '{}'", s)))
    }
}

struct KnownBot {
    name: &'static str,
    token: &'static str,
    category: BotCategory,
}

const fn bot(name: &'static str, token: &'static str, category: BotCategory) -> KnownBot {
    KnownBot { name, token, category }
}

/// Checked in order; tokens are lowercase. Automation tooling comes first so an
/// agent naming both a tool and a crawler is classified as the tool.
const KNOWN_BOTS: &[KnownBot] = &[
    bot("ahrefsbot", "ahrefsbot", BotCategory::Scraper),
    bot("semrushbot", "semrushbot", BotCategory::Scraper),
    bot("mj12bot", "mj12bot", BotCategory::Scraper),
    bot("dotbot", "dotbot", BotCategory::Scraper),
    bot("petalbot", "petalbot", BotCategory::Scraper),
    bot("scrapy", "scrapy", BotCategory::Scraper),
    bot("headless-chrome", "headlesschrome", BotCategory::HeadlessBrowser),
    bot("phantomjs", "phantomjs", BotCategory::HeadlessBrowser),
    bot("puppeteer", "puppeteer", BotCategory::HeadlessBrowser),
    bot("playwright", "playwright", BotCategory::HeadlessBrowser),
    bot("curl", "curl/", BotCategory::HttpClient),
    bot("wget", "wget/", BotCategory::HttpClient),
    bot("python-requests", "python-requests", BotCategory::HttpClient),
    bot("python-urllib", "python-urllib", BotCategory::HttpClient),
    bot("aiohttp", "aiohttp", BotCategory::HttpClient),
    bot("go-http-client", "go-http-client", BotCategory::HttpClient),
    bot("okhttp", "okhttp", BotCategory::HttpClient),
    bot("axios", "axios/", BotCategory::HttpClient),
    bot("node-fetch", "node-fetch", BotCategory::HttpClient),
    bot("java", "java/", BotCategory::HttpClient),
    bot("libwww-perl", "libwww-perl", BotCategory::HttpClient),
    bot("httpie", "httpie", BotCategory::HttpClient),
    bot("reqwest", "reqwest", BotCategory::HttpClient),
    bot("googlebot", "googlebot", BotCategory::SearchEngine),
    bot("bingbot", "bingbot", BotCategory::SearchEngine),
    bot("duckduckbot", "duckduckbot", BotCategory::SearchEngine),
    bot("yandexbot", "yandexbot", BotCategory::SearchEngine),
    bot("baiduspider", "baiduspider", BotCategory::SearchEngine),
    bot("applebot", "applebot", BotCategory::SearchEngine),
    bot("yahoo-slurp", "slurp", BotCategory::SearchEngine),
    bot("uptimerobot", "uptimerobot", BotCategory::Monitor),
    bot("pingdom", "pingdom", BotCategory::Monitor),
    bot("statuscake", "statuscake", BotCategory::Monitor),
    bot("site24x7", "site24x7", BotCategory::Monitor),
    bot("facebook", "facebookexternalhit", BotCategory::Preview),
    bot("twitterbot", "twitterbot", BotCategory::Preview),
    bot("slackbot", "slackbot", BotCategory::Preview),
    bot("discordbot", "discordbot", BotCategory::Preview),
    bot("linkedinbot", "linkedinbot", BotCategory::Preview),
    bot("telegrambot", "telegrambot", BotCategory::Preview),
    bot("gptbot", "gptbot", BotCategory::AiCrawler),
    bot("chatgpt-user", "chatgpt-user", BotCategory::AiCrawler),
    bot("claudebot", "claudebot", BotCategory::AiCrawler),
    bot("ccbot", "ccbot", BotCategory::AiCrawler),
    bot("perplexitybot", "perplexitybot", BotCategory::AiCrawler),
    bot("bytespider", "bytespider", BotCategory::AiCrawler),
];

/// Generic markers for agents not in the table.
const GENERIC_TOKENS: &[&str] = &["bot", "crawler", "spider", "scraper"];

/// Result of classifying a user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Human,
    Bot {
        name: &'static str,
        category: BotCategory,
    },
}

/// Classify a user agent string.
pub fn classify(user_agent: Option<&str>) -> Classification {
    let Some(agent) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return Classification::Bot {
            name: "unidentified",
            category: BotCategory::Unknown,
        };
    };

    let lower = agent.to_ascii_lowercase();
    if let Some(known) = KNOWN_BOTS.iter().find(|b| lower.contains(b.token)) {
        return Classification::Bot {
            name: known.name,
            category: known.category,
        };
    }
    if GENERIC_TOKENS.iter().any(|t| lower.contains(t)) {
        return Classification::Bot {
            name: "generic",
            category: BotCategory::Unknown,
        };
    }
    Classification::Human
}

/// An IPv4 or IPv6 network block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for Cidr {
    type Err = AdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AdmissionError::Policy(format!("invalid CIDR '{}'", s));
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let network: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(p) => p.trim().parse::<u8>().map_err(|_| invalid())?,
            None => max,
        };
        if prefix > max {
            return Err(invalid());
        }
        Ok(Self { network, prefix })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Outcome of bot inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotVerdict {
    Human,
    Allowed { name: &'static str, category: BotCategory },
    Denied { name: &'static str, category: BotCategory },
    Spoofed { name: &'static str },
}

#[derive(Debug, Clone)]
pub struct BotDetector {
    allow: HashSet<BotCategory>,
    verified: HashMap<String, Vec<Cidr>>,
}

impl BotDetector {
    pub fn from_config(config: &BotConfig) -> Result<Self, AdmissionError> {
        let allow = config
            .allow
            .iter()
            .map(|c| c.parse::<BotCategory>())
            .collect::<Result<HashSet<_>, _>>()?;

        let mut verified: HashMap<String, Vec<Cidr>> = HashMap::new();
        for ranges in &config.verified_ranges {
            let cidrs = ranges
                .cidrs
                .iter()
                .map(|c| c.parse::<Cidr>())
                .collect::<Result<Vec<_>, _>>()?;
            verified
                .entry(ranges.crawler.to_ascii_lowercase())
                .or_default()
                .extend(cidrs);
        }

        Ok(Self { allow, verified })
    }

    pub fn inspect(&self, user_agent: Option<&str>, client_ip: IpAddr) -> BotVerdict {
        let (name, category) = match classify(user_agent) {
            Classification::Human => return BotVerdict::Human,
            Classification::Bot { name, category } => (name, category),
        };

        match self.verified.get(name) {
            Some(ranges) if !ranges.iter().any(|r| r.contains(client_ip)) => {
                return BotVerdict::Spoofed { name };
            }
            None if category == BotCategory::SearchEngine => {
                return BotVerdict::Spoofed { name };
            }
            _ => {}
        }

        if self.allow.contains(&category) {
            BotVerdict::Allowed { name, category }
        } else {
            BotVerdict::Denied { name, category }
        }
    }
}
