//! Pipeline stages for preparing a post.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ frontmatter ──▶ rewrite ──▶ api
//! (load)    (meta, body)    (raw URLs)  (GET /me, POST /posts)
//! ```
//!
//! 1. [`input`]       — canonicalise and read the document, find the repository root
//! 2. [`frontmatter`] — split the `---` header from the body; never fails
//! 3. [`rewrite`]     — turn repository-relative image paths into raw URLs; pure
//! 4. [`api`]         — the only stage with network I/O

pub mod api;
pub mod frontmatter;
pub mod input;
pub mod rewrite;
