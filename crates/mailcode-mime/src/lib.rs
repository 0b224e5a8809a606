//! # mailcode-mime
//!
//! Turns raw RFC 5322 messages into the plain-text records the code
//! extractor reads.
//!
//! ## Features
//!
//! - **Message parsing**: headers, nested multipart bodies, attachments skipped
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 header words, Latin-1
//! - **HTML fallback**: HTML-only messages are reduced to text
//!
//! ## Quick Start
//!
//! ```
//! use mailcode_mime::Message;
//!
//! let raw = b"From: noreply@example.com\r\n\
//! Subject: Sign in\r\n\
//! Content-Type: text/plain\r\n\
//! \r\n\
//! Your verification code is 482913";
//!
//! let message = Message::parse(raw)?;
//! let email = message.to_email("inbox/1.eml")?;
//! assert_eq!(email.subject, "Sign in");
//! assert_eq!(email.body, "Your verification code is 482913");
//! # Ok::<(), mailcode_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;
pub mod html;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{MAX_DEPTH, Message, Part, TransferEncoding};
