//! Content transforms for merged output
//!
//! - Rewrite: id prefixing, link retargeting, landmark stamping

mod rewrite;

pub use rewrite::{LinkResolver, RewriteContext, Rewritten, rewrite_markup};
