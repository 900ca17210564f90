//! In-memory stand-ins for the network side, shared by the fetch and pipeline tests.

use anyhow::{anyhow, Result};
use std::{
    cell::Cell,
    collections::HashMap,
    io::{Cursor, Write},
};
use url::Url;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::client::ReportFetcher;

pub fn zip_of(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            zip.start_file(*name, options)?;
            zip.write_all(data.as_bytes())?;
        }
        zip.finish()?;
    }
    Ok(buf)
}

#[derive(Default)]
pub struct FakeFetcher {
    archives: HashMap<i32, Vec<u8>>,
    reports: HashMap<String, Vec<u8>>,
    archive_requests: Cell<usize>,
}

impl FakeFetcher {
    pub fn with_archive(mut self, year: i32, entries: &[(&str, &str)]) -> Result<Self> {
        self.archives.insert(year, zip_of(entries)?);
        Ok(self)
    }

    pub fn with_report(mut self, url: &str, body: &[u8]) -> Self {
        self.reports.insert(url.to_string(), body.to_vec());
        self
    }

    pub fn archive_requests(&self) -> usize {
        self.archive_requests.get()
    }
}

impl ReportFetcher for FakeFetcher {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        self.reports
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("HTTP error 404 Not Found for {url}"))
    }

    async fn exists(&self, url: &Url) -> Result<bool> {
        Ok(self.reports.contains_key(url.as_str()))
    }

    async fn fetch_archive(&self, year: i32) -> Result<Vec<u8>> {
        self.archive_requests.set(self.archive_requests.get() + 1);
        self.archives
            .get(&year)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP error 404 Not Found for {year}.zip"))
    }
}
