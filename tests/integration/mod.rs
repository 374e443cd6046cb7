//! Integration test suite for modgraph
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cachekey**: combination properties of cache key generators
//! - **cli**: the `modgraph` binary end to end
//! - **dependencies**: building, validating and aliasing dependency trees

mod cachekey;
mod cli;
mod dependencies;
