//! Output generation.
//!
//! - [`markdown`]: Writes the dated newsletter file and optionally wraps the
//!   model output with front matter
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-31.md
//! └── 2025-06-01.md
//! ```

pub mod markdown;
