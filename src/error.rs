// SPDX-License-Identifier: MIT OR Apache-2.0

/// Errors returned by the fallible entry points of this crate
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// No encoding is known by this name
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    /// A line was requested outside of `begin_layout` / `end_layout`
    #[error("not laying out, call begin_layout first")]
    NotLayingOut,
    /// The paragraph grew past the representable width and was truncated
    #[error("text too long, layout truncated")]
    TextTooLong,
}
