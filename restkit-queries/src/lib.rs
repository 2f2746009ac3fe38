//! Named query catalog parsed from tagged query documents.
//!
//! A document is plain text where each query is introduced by a tag line:
//!
//! ```text
//! -- name: version
//! select sqlite_version();
//!
//! -- name: users.by_id
//! select id, name
//!   from users
//!  where id = ?;
//! ```
//!
//! Body lines are trimmed, blank lines are skipped, and the remaining lines are
//! joined with `\n`. Anything before the first tag is ignored.

mod catalog;
mod error;
pub mod parser;

pub use catalog::QueryCatalog;
pub use error::QueryError;
pub use parser::{parse_queries, tag_name, QueryScanner};
