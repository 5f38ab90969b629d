//! robots.txt rules for one site
//!
//! Path rules are matched by the robotstxt crate against the raw file.
//! `Crawl-delay` is not part of that matcher, so the file's user-agent groups
//! are read once here and kept alongside the raw text.

use robotstxt::DefaultMatcher;

/// One `User-agent` group and the delay it declares
#[derive(Debug, Clone, PartialEq)]
struct AgentGroup {
    /// Lowercased product tokens, `*` included as-is
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

/// Rules of a fetched robots.txt
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// `None` when there is nothing to enforce
    content: Option<String>,
    groups: Vec<AgentGroup>,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        if content.trim().is_empty() {
            return Self::allow_all();
        }
        Self {
            content: Some(content.to_string()),
            groups: read_groups(content),
        }
    }

    /// Rules used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.content.is_none()
    }

    /// Checks a URL against the path rules for `user_agent`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.content {
            Some(content) => {
                DefaultMatcher::default().one_agent_allowed_by_robots(content, user_agent, url)
            }
            None => true,
        }
    }

    /// Raw `Crawl-delay` seconds for `user_agent`
    ///
    /// A group naming the agent wins over the `*` group. Values are not
    /// range-checked here.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let agent = user_agent.to_lowercase();
        let named = self
            .groups
            .iter()
            .find(|group| group.agents.iter().any(|a| *a == agent));
        let group = named.or_else(|| {
            self.groups
                .iter()
                .find(|group| group.agents.iter().any(|a| a == "*"))
        })?;
        group.crawl_delay
    }
}

/// Splits the file into user-agent groups
///
/// Consecutive `User-agent` lines share a group; any other directive closes
/// the run so the next `User-agent` starts a new group.
fn read_groups(content: &str) -> Vec<AgentGroup> {
    let mut groups: Vec<AgentGroup> = Vec::new();
    let mut open = false;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if key.trim().eq_ignore_ascii_case("user-agent") {
            if !open {
                groups.push(AgentGroup {
                    agents: Vec::new(),
                    crawl_delay: None,
                });
                open = true;
            }
            if let Some(group) = groups.last_mut() {
                group.agents.push(value.to_lowercase());
            }
            continue;
        }

        open = false;
        if key.trim().eq_ignore_ascii_case("crawl-delay") {
            if let (Some(group), Ok(delay)) = (groups.last_mut(), value.parse::<f64>()) {
                group.crawl_delay.get_or_insert(delay);
            }
        }
    }

    groups
}
