//! Last-page cursor persistence
//!
//! Each provider's working directory carries a single-value file remembering
//! the last fully completed page cursor, so an interrupted pagination run
//! resumes where it stopped. Two flavors share the contract and differ only
//! in the persisted value's type: integer page numbers (default 1) and opaque
//! string tokens such as `winter-1907` (default empty).

pub mod strategy;

pub use strategy::{CursorStrategy, NumericPages, SeasonYear, SEASONS, TBA_TOKEN};

use crate::{AnisinkError, Result};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// File name of the persisted cursor inside a provider's working directory
pub const LAST_PAGE_FILE: &str = "last-page.txt";

/// Durable single-value store for the last fully completed page cursor
#[derive(Debug, Clone)]
pub struct LastPageMemorizer<P> {
    file: PathBuf,
    hostname: String,
    _cursor: PhantomData<P>,
}

impl<P> LastPageMemorizer<P> {
    pub fn new(working_dir: &Path, hostname: impl Into<String>) -> Self {
        Self {
            file: working_dir.join(LAST_PAGE_FILE),
            hostname: hostname.into(),
            _cursor: PhantomData,
        }
    }

    /// First line of the state file; `None` if the file is missing or
    /// unreadable, which callers treat as "start from the beginning"
    fn read_first_line(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.file).ok()?;
        let line = content.lines().next().unwrap_or("").trim().to_string();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }

    /// Idempotent overwrite of the single-value file
    fn write(&self, value: &str) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.file, format!("{}\n", value))?;
        Ok(())
    }
}

impl LastPageMemorizer<u32> {
    /// Returns the memorized page, or 1 when no usable state exists
    pub fn retrieve_last_page(&self) -> Result<u32> {
        match self.read_first_line() {
            None => Ok(1),
            Some(line) => line.parse().map_err(|_| AnisinkError::CursorParse {
                hostname: self.hostname.clone(),
                content: line,
            }),
        }
    }

    pub fn memorize_last_page(&self, page: u32) -> Result<()> {
        self.write(&page.to_string())
    }
}

impl LastPageMemorizer<String> {
    /// Returns the memorized token, or the empty string when no usable state
    /// exists
    pub fn retrieve_last_page(&self) -> Result<String> {
        Ok(self.read_first_line().unwrap_or_default())
    }

    pub fn memorize_last_page(&self, token: &str) -> Result<()> {
        self.write(token)
    }
}

/// String-cursor view of a memorizer, as consumed by the pagination crawler
///
/// Cursor strategies interpret the string; the flavors only differ in their
/// default and in integer parse validation.
pub trait LastPageStore: Send + Sync {
    fn retrieve(&self) -> Result<String>;
    fn memorize(&self, cursor: &str) -> Result<()>;
}

impl LastPageStore for LastPageMemorizer<u32> {
    fn retrieve(&self) -> Result<String> {
        Ok(self.retrieve_last_page()?.to_string())
    }

    fn memorize(&self, cursor: &str) -> Result<()> {
        let page: u32 = cursor.parse().map_err(|_| AnisinkError::CursorParse {
            hostname: self.hostname.clone(),
            content: cursor.to_string(),
        })?;
        self.memorize_last_page(page)
    }
}

impl LastPageStore for LastPageMemorizer<String> {
    fn retrieve(&self) -> Result<String> {
        self.retrieve_last_page()
    }

    fn memorize(&self, cursor: &str) -> Result<()> {
        self.memorize_last_page(cursor)
    }
}
