//! Robots.txt handling module
//!
//! This module provides the politeness gate: fetching, parsing and caching
//! robots.txt directives per domain, and answering whether a URL may be
//! fetched by a given user agent.

mod gate;
mod parser;
mod source;

pub use gate::{directive_key, PolitenessGate};
pub use parser::{product_token, DirectiveOrigin, DomainDirectives};
pub use source::{robots_url, DirectiveError, DirectiveSource, HttpDirectiveSource};
