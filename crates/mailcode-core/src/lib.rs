//! # mailcode-core
//!
//! Finds the one-time verification code in an email, or declines to guess.
//!
//! Extraction is a single linear pass over `subject + " " + body`:
//!
//! 1. **Keyword gate** - no verification vocabulary, no further work
//! 2. **Candidates** - every match of an ordered list of code patterns
//! 3. **Exclusions** - phone numbers, dates, order numbers, runs like `123456`
//! 4. **Context** - strong/weak keywords in the 80 characters before each occurrence
//! 5. **Ranking** - score, merge by normalized code, accept or abstain
//!
//! ## Example
//!
//! ```
//! use mailcode_core::{EmailMessage, Extractor};
//!
//! let extractor = Extractor::with_default_tables()?;
//! let message = EmailMessage::new("Your verification code is 482913", "");
//!
//! let found = extractor.extract(&message);
//! assert_eq!(found.map(|m| m.code), Some("482913".to_string()));
//! # Ok::<(), mailcode_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod candidate;
mod context;
mod error;
mod exclude;
mod extractor;
mod gate;
pub mod model;
pub mod patterns;
pub mod rank;
pub mod scan;

pub use error::{Error, Result};
pub use exclude::is_trivial_digit_run;
pub use extractor::Extractor;
pub use model::{Candidate, CodeMatch, ContextScore, EmailMessage};
pub use patterns::{CodePattern, ExcludePattern, PatternTables};
pub use rank::Ranking;
