//! CLI command handlers, one file per subcommand.

mod fetch;
mod info;
mod rewrite;

pub use fetch::run_fetch;
pub use info::run_info;
pub use rewrite::{run_rewrite, RewriteArgs};

#[cfg(test)]
pub(crate) use info::format_info;
#[cfg(test)]
pub(crate) use rewrite::resolve_geo_transform;
