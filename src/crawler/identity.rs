//! Immutable pool of fetch identities (user-agent strings)

use rand::Rng;
use std::sync::Arc;

/// Agent used when a pool is built from an empty list
pub const FALLBACK_AGENT: &str = concat!("polite-crawl/", env!("CARGO_PKG_VERSION"));

/// Shared, read-only set of user-agent strings
///
/// Rotation never mutates the pool: each fetch carries the index of the
/// identity it is using and asks the pool for a different one.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    agents: Arc<[String]>,
}

impl IdentityPool {
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            vec![FALLBACK_AGENT.to_string()]
        } else {
            agents
        };

        Self {
            agents: agents.into(),
        }
    }

    /// Identity used for the first attempt of every fetch and for directives
    pub fn primary(&self) -> &str {
        &self.agents[0]
    }

    /// Agent at `index`, wrapping around the pool
    pub fn get(&self, index: usize) -> &str {
        &self.agents[index % self.agents.len()]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Picks an identity index different from `current` when the pool allows it
    pub fn rotate<R: Rng + ?Sized>(&self, current: usize, rng: &mut R) -> usize {
        let len = self.agents.len();
        if len < 2 {
            return 0;
        }

        // Uniform over the other len - 1 identities
        let offset = rng.gen_range(1..len);
        (current % len + offset) % len
    }
}
