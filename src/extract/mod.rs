// File: ./src/extract/mod.rs
//! Calendar extraction.
//!
//! The calendar is a client-rendered widget, so extraction drives a real
//! browser through sign-in and navigation, waits on DOM conditions and then
//! reads the JSON blob the page script embedded in its container element.
//!
//! The browser itself sits behind [`BrowserLauncher`] / [`BrowserSession`];
//! [`webdriver`] provides the production implementation.
pub mod machine;
pub mod payload;
pub mod webdriver;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use machine::{CalendarExtractor, ExtractState, Extraction, ExtractorSettings};
pub use payload::parse_events;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    XPath(String),
    Id(String),
    Class(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(x) => write!(f, "xpath {}", x),
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Class(c) => write!(f, ".{}", c),
        }
    }
}

/// Outcome of a bounded wait. A timeout is an expected result, not an error.
#[derive(Debug)]
pub enum WaitResult<E> {
    Found(E),
    TimedOut,
}

/// The named preconditions the extractor waits on, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    UsernameField,
    PasswordField,
    CalendarShell,
    EventTitles,
}

/// Classification of a wait timeout for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Authentication,
    CalendarLoad,
    Render,
}

impl WaitStage {
    pub fn kind(self) -> TimeoutKind {
        match self {
            WaitStage::UsernameField | WaitStage::PasswordField => TimeoutKind::Authentication,
            WaitStage::CalendarShell => TimeoutKind::CalendarLoad,
            WaitStage::EventTitles => TimeoutKind::Render,
        }
    }
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStage::UsernameField => write!(f, "username field"),
            WaitStage::PasswordField => write!(f, "password field"),
            WaitStage::CalendarShell => write!(f, "calendar page"),
            WaitStage::EventTitles => write!(f, "calendar events"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("could not start browser session: {0}")]
    Launch(String),
    #[error("browser command failed: {0}")]
    Command(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// The page structure changed: container, attribute or JSON is unusable.
    #[error("calendar payload could not be read: {0}")]
    PayloadParse(String),
}

/// Starts browser sessions. Each call yields a fresh, independent session.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    async fn launch(&self) -> Result<Self::Session, BrowserError>;
}

/// A live, scriptable browser.
///
/// `close` consumes the session so it can only be released once.
#[async_trait]
pub trait BrowserSession: Send {
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn wait_for_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WaitResult<Self::Element>, BrowserError>;

    async fn send_keys(&mut self, element: &Self::Element, text: &str)
    -> Result<(), BrowserError>;

    async fn page_source(&mut self) -> Result<String, BrowserError>;

    async fn close(self) -> Result<(), BrowserError>;
}
