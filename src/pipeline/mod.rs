//! Pipeline stages for table reconstruction and line-item extraction.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! cells ──▶ group ──▶ title ──▶ assemble (clean) ──▶ render
//!                                                     ▲
//! document text ──▶ llm ──▶ items ────────────────────┘
//! ```
//!
//! 1. [`group`]    — sort cells by `(row, column)` and cut them into rows
//! 2. [`title`]    — detect a single-cell caption row
//! 3. [`clean`]    — strip checkbox markup and whitespace from cell text
//! 4. [`assemble`] — header + records, enforcing the row-length policy
//! 5. [`llm`]      — line-item request with retry/backoff; the only stage
//!    with network I/O
//! 6. [`items`]    — decode the model's JSON answer into line items
//! 7. [`render`]   — GFM Markdown for tables and documents

pub mod assemble;
pub mod clean;
pub mod group;
pub mod items;
pub mod llm;
pub mod render;
pub mod title;
