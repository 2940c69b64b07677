//! Directive evaluation for a single domain
//!
//! Wraps the `robotstxt` matcher. The raw document is kept and evaluated on
//! demand; a permissive result carries no document at all.

use chrono::{DateTime, Utc};
use robotstxt::DefaultMatcher;

/// Where a cached directive set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOrigin {
    /// Parsed from the domain's robots.txt
    Fetched,
    /// Loading failed; everything is allowed
    Fallback,
}

/// Cached crawl directives for one domain
#[derive(Debug, Clone)]
pub struct DomainDirectives {
    content: Option<String>,
    origin: DirectiveOrigin,
    loaded_at: DateTime<Utc>,
}

impl DomainDirectives {
    /// Creates directives from a robots.txt document
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            origin: DirectiveOrigin::Fetched,
            loaded_at: Utc::now(),
        }
    }

    /// Creates a permissive directive set that allows everything
    ///
    /// Used when the directive document cannot be loaded.
    pub fn allow_all() -> Self {
        Self {
            content: None,
            origin: DirectiveOrigin::Fallback,
            loaded_at: Utc::now(),
        }
    }

    pub fn origin(&self) -> DirectiveOrigin {
        self.origin
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Checks if a URL (or bare path) is allowed for the given agent
    ///
    /// Full user-agent strings are reduced to their product token before
    /// matching, so `TestBot/2.1 (+https://...)` is matched as `TestBot`.
    pub fn allowed(&self, url: &str, user_agent: &str) -> bool {
        let content = match self.content.as_deref() {
            Some(content) if !content.trim().is_empty() => content,
            _ => return true,
        };

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(content, product_token(user_agent), url)
    }

    /// Crawl-delay in seconds for the agent, if the document declares one
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let content = self.content.as_deref()?;
        let agent = product_token(user_agent).to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !agent.is_empty() && group.iter().any(|ua| ua == &agent) {
                        agent_delay = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard_delay = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

/// Leading product token of a user-agent string (`Name/1.0 (...)` -> `Name`)
pub fn product_token(user_agent: &str) -> &str {
    let trimmed = user_agent.trim();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let directives = DomainDirectives::allow_all();
        assert!(directives.allowed("/any/path", "TestBot"));
        assert!(directives.allowed("/admin", "TestBot"));
        assert_eq!(directives.origin(), DirectiveOrigin::Fallback);
    }

    #[test]
    fn test_disallow_private() {
        let directives = DomainDirectives::from_content("User-agent: *\nDisallow: /private");
        assert!(!directives.allowed("/private", "TestBot"));
        assert!(!directives.allowed("/private/page", "TestBot"));
        assert!(directives.allowed("/public", "TestBot"));
        assert_eq!(directives.origin(), DirectiveOrigin::Fetched);
    }

    #[test]
    fn test_full_url_is_matched_on_path() {
        let directives = DomainDirectives::from_content("User-agent: *\nDisallow: /private");
        assert!(!directives.allowed("http://127.0.0.1:8080/private", "TestBot"));
        assert!(directives.allowed("http://127.0.0.1:8080/open", "TestBot"));
    }

    #[test]
    fn test_allow_overrides_longer_match() {
        let directives = DomainDirectives::from_content(
            "User-agent: *\nDisallow: /private\nAllow: /private/public",
        );
        assert!(!directives.allowed("/private", "TestBot"));
        assert!(directives.allowed("/private/public", "TestBot"));
    }

    #[test]
    fn test_specific_agent_group() {
        let directives =
            DomainDirectives::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(directives.allowed("/page", "GoodBot"));
        assert!(!directives.allowed("/page", "BadBot"));
        assert!(!directives.allowed("/page", "BadBot/3.0 (+https://bad.example)"));
    }

    #[test]
    fn test_empty_document_allows_everything() {
        let directives = DomainDirectives::from_content("");
        assert!(directives.allowed("/any/path", "TestBot"));
    }

    #[test]
    fn test_product_token() {
        assert_eq!(product_token("TestBot/1.0"), "TestBot");
        assert_eq!(
            product_token("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36"),
            "Mozilla"
        );
        assert_eq!(product_token("  plain-agent "), "plain-agent");
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let directives = DomainDirectives::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(directives.crawl_delay("TestBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent_wins() {
        let directives = DomainDirectives::from_content(
            "User-agent: *\nCrawl-delay: 10\n\nUser-agent: TestBot\nCrawl-delay: 2.5",
        );
        assert_eq!(directives.crawl_delay("TestBot/1.0"), Some(2.5));
        assert_eq!(directives.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_shared_group() {
        let directives =
            DomainDirectives::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(directives.crawl_delay("BotA"), Some(3.0));
        assert_eq!(directives.crawl_delay("BotB"), Some(3.0));
        assert_eq!(directives.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_absent() {
        assert_eq!(
            DomainDirectives::from_content("User-agent: *\nDisallow: /x").crawl_delay("TestBot"),
            None
        );
        assert_eq!(DomainDirectives::allow_all().crawl_delay("TestBot"), None);
    }
}
