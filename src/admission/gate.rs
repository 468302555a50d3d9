//! The admission gate: rule evaluation and decision reporting.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::admission::bot::{BotDetector, BotVerdict};
use crate::admission::rate_limit::{Acquire, BucketPolicy, RateLimiter};
use crate::admission::shield::Shield;
use crate::admission::{AdmissionError, Decision, DenyReason, RequestFacts};
use crate::config::{AdmissionConfig, RuleMode};
use crate::observability::metrics;

/// How often idle buckets are swept.
const EVICTION_SWEEP: Duration = Duration::from_secs(60);

/// Compiled, immutable admission rules.
#[derive(Debug)]
pub struct AdmissionPolicy {
    enabled: bool,
    trust_forwarded_for: bool,
    shield: Shield,
    shield_mode: RuleMode,
    bot: BotDetector,
    bot_mode: RuleMode,
    bucket: BucketPolicy,
    cost: u32,
    rate_mode: RuleMode,
    idle_eviction: Duration,
}

impl AdmissionPolicy {
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, AdmissionError> {
        let rl = &config.rate_limit;
        if rl.capacity == 0 || rl.refill_rate == 0 || rl.interval_secs == 0 {
            return Err(AdmissionError::Policy(
                "rate limit capacity, refill rate and interval must be > 0".into(),
            ));
        }

        Ok(Self {
            enabled: config.enabled,
            trust_forwarded_for: config.trust_forwarded_for,
            shield: Shield::new(&config.shield.extra_patterns)?,
            shield_mode: config.shield.mode,
            bot: BotDetector::from_config(&config.bot)?,
            bot_mode: config.bot.mode,
            bucket: BucketPolicy::from(rl),
            cost: rl.cost.max(1),
            rate_mode: rl.mode,
            idle_eviction: Duration::from_secs(rl.idle_eviction_secs),
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }
}

/// A rule that fired for the current request.
struct RuleHit {
    rule: &'static str,
    mode: RuleMode,
    reason: DenyReason,
    detail: String,
    retry_after: Option<Duration>,
}

/// Process-wide gate shared by every request.
pub struct AdmissionGate {
    policy: ArcSwap<AdmissionPolicy>,
    limiter: RateLimiter,
}

impl AdmissionGate {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy: ArcSwap::from_pointee(policy),
            limiter: RateLimiter::new(),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Result<Self, AdmissionError> {
        Ok(Self::new(AdmissionPolicy::from_config(config)?))
    }

    /// Current policy snapshot.
    pub fn policy(&self) -> Arc<AdmissionPolicy> {
        self.policy.load_full()
    }

    /// Swap in a new policy. Bucket balances carry over.
    pub fn reload(&self, policy: AdmissionPolicy) {
        tracing::info!(
            enabled = policy.enabled,
            capacity = policy.bucket.capacity,
            refill_rate = policy.bucket.refill_rate,
            interval_secs = policy.bucket.interval.as_secs(),
            "Admission policy reloaded"
        );
        self.policy.store(Arc::new(policy));
    }

    /// Number of client keys with a live bucket.
    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }

    /// Drop buckets that have been full and idle for the configured window.
    pub fn evict_idle(&self) -> usize {
        let policy = self.policy.load();
        let evicted = self.limiter.evict_idle(&policy.bucket, policy.idle_eviction);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.limiter.len(), "Evicted idle rate limit buckets");
        }
        evicted
    }

    /// Evaluate every rule for one request.
    ///
    /// A token is charged even when another rule denies. Live denials are
    /// reported by rank; dry-run hits are only logged.
    pub fn evaluate(&self, facts: &RequestFacts) -> Result<Decision, AdmissionError> {
        let policy = self.policy.load();
        if !policy.enabled {
            return Ok(Decision::Allowed);
        }

        let ip = facts.client_ip.ok_or(AdmissionError::MissingCharacteristic)?;
        let key = ip.to_string();
        let mut hits = Vec::new();

        if let Acquire::Denied { retry_after } = self.limiter.check(&key, &policy.bucket, policy.cost) {
            hits.push(RuleHit {
                rule: "rate_limit",
                mode: policy.rate_mode,
                reason: DenyReason::RateLimited,
                detail: format!("bucket empty, retry in {}s", retry_after.as_secs()),
                retry_after: Some(retry_after),
            });
        }

        match policy.bot.inspect(facts.user_agent.as_deref(), ip) {
            BotVerdict::Human => {}
            BotVerdict::Allowed { name, category } => {
                tracing::debug!(client = %key, bot = name, category = category.as_str(), "Allowed bot");
            }
            BotVerdict::Denied { name, category } => hits.push(RuleHit {
                rule: "bot",
                mode: policy.bot_mode,
                reason: DenyReason::Bot,
                detail: format!("{} ({})", name, category.as_str()),
                retry_after: None,
            }),
            BotVerdict::Spoofed { name } => hits.push(RuleHit {
                rule: "bot",
                mode: policy.bot_mode,
                reason: DenyReason::Spoofed,
                detail: format!("{} outside verified ranges", name),
                retry_after: None,
            }),
        }

        if let Some(hit) = policy.shield.inspect(facts) {
            hits.push(RuleHit {
                rule: "shield",
                mode: policy.shield_mode,
                reason: DenyReason::Shielded,
                detail: format!("{} in {}", hit.family, hit.location),
                retry_after: None,
            });
        }

        if facts.body.is_none() {
            hits.push(RuleHit {
                rule: "shield",
                mode: policy.shield_mode,
                reason: DenyReason::Other,
                detail: "body could not be inspected".to_string(),
                retry_after: None,
            });
        }

        let mut reported: Option<&RuleHit> = None;
        for hit in &hits {
            match hit.mode {
                RuleMode::DryRun => {
                    tracing::info!(
                        client = %key,
                        rule = hit.rule,
                        reason = hit.reason.as_str(),
                        detail = %hit.detail,
                        "Dry-run rule would deny request"
                    );
                    metrics::record_admission(&format!("dry_run_{}", hit.reason.as_str()));
                }
                RuleMode::Live => {
                    if reported.map_or(true, |r| hit.reason.rank() < r.reason.rank()) {
                        reported = Some(hit);
                    }
                }
            }
        }

        let decision = match reported {
            None => Decision::Allowed,
            Some(hit) => {
                tracing::warn!(
                    client = %key,
                    rule = hit.rule,
                    reason = hit.reason.as_str(),
                    detail = %hit.detail,
                    triggered = hits.len(),
                    "Request denied"
                );
                Decision::Denied {
                    reason: hit.reason,
                    retry_after: hit.retry_after,
                }
            }
        };

        metrics::record_admission(decision.reason().map_or("allowed", DenyReason::as_str));
        Ok(decision)
    }
}

/// Periodically evict idle buckets until shutdown.
pub fn spawn_eviction_task(
    gate: Arc<AdmissionGate>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EVICTION_SWEEP);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    gate.evict_idle();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Bucket eviction task stopped");
                    break;
                }
            }
        }
    })
}
