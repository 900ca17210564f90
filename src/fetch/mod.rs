// src/fetch/mod.rs

pub mod archive;
pub mod client;
pub mod dates;
pub mod locate;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::ArchiveWorkspace;
pub use client::{HttpFetcher, ReportFetcher};
pub use dates::publication_dates;
pub use locate::{Locator, ReportSource};
