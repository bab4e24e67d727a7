use rand::seq::SliceRandom;

/// Which family of browsers a strategy wants to look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentProfile {
    Desktop,
    Mobile,
}

pub const DESKTOP_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
];

pub const MOBILE_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Android 14; Mobile; rv:121.0) Gecko/121.0 Firefox/121.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/122.0.0.0 Mobile/15E148 Safari/604.1",
];

/// Source of user-agent strings.
///
/// Which agent is picked only changes how requests look, never whether a
/// descriptor is well formed.
pub trait UserAgentSource: Send + Sync {
    fn pick(&self, profile: AgentProfile) -> String;
}

/// Picks uniformly from the built-in pools
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomUserAgents;

impl UserAgentSource for RandomUserAgents {
    fn pick(&self, profile: AgentProfile) -> String {
        let pool = match profile {
            AgentProfile::Desktop => DESKTOP_AGENTS,
            AgentProfile::Mobile => MOBILE_AGENTS,
        };
        pool.choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DESKTOP_AGENTS[0])
            .to_string()
    }
}

/// Always returns the same agent; used for deterministic plans
#[derive(Debug, Clone)]
pub struct FixedUserAgent(String);

impl FixedUserAgent {
    pub fn new(agent: impl Into<String>) -> Self {
        Self(agent.into())
    }
}

impl UserAgentSource for FixedUserAgent {
    fn pick(&self, _profile: AgentProfile) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_agents_come_from_the_right_pool() {
        let source = RandomUserAgents;
        for _ in 0..20 {
            assert!(DESKTOP_AGENTS.contains(&source.pick(AgentProfile::Desktop).as_str()));
            assert!(MOBILE_AGENTS.contains(&source.pick(AgentProfile::Mobile).as_str()));
        }
    }

    #[test]
    fn test_fixed_agent() {
        let source = FixedUserAgent::new("Agent/1");
        assert_eq!(source.pick(AgentProfile::Mobile), "Agent/1");
        assert_eq!(source.pick(AgentProfile::Desktop), "Agent/1");
    }
}
