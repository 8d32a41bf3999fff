// File: ./src/extract/machine.rs
//! Sign-in and navigation state machine.
//!
//! States advance strictly in order:
//! `Start -> AuthPageLoaded -> CredentialsSubmitted -> CalendarPageLoaded
//!  -> CalendarRendered -> Extracted`.
//! Any wait timeout moves to `Failed` and yields zero events. The browser
//! session is closed on every exit path.
use crate::config::Config;
use crate::extract::payload::parse_events;
use crate::extract::{
    BrowserLauncher, BrowserSession, ExtractError, Locator, WaitResult, WaitStage,
};
use crate::model::RawEvent;
use std::fmt;
use std::time::Duration;

/// WebDriver key code for Return; sending it to the password field submits the form.
pub const ENTER_KEY: &str = "\u{e007}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    Start,
    AuthPageLoaded,
    CredentialsSubmitted,
    CalendarPageLoaded,
    CalendarRendered,
    Extracted,
    Failed,
}

/// Result of one extraction run.
#[derive(Debug)]
pub struct Extraction {
    pub events: Vec<RawEvent>,
    pub state: ExtractState,
    /// The wait that expired, when `state` is `Failed`.
    pub timeout: Option<WaitStage>,
}

impl Extraction {
    fn timed_out(stage: WaitStage) -> Self {
        Self {
            events: Vec::new(),
            state: ExtractState::Failed,
            timeout: Some(stage),
        }
    }

    fn extracted(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            state: ExtractState::Extracted,
            timeout: None,
        }
    }
}

#[derive(Clone)]
pub struct ExtractorSettings {
    pub auth_url: String,
    pub calendar_url: String,
    pub username: String,
    pub password: String,
    pub login_timeout: Duration,
    pub calendar_timeout: Duration,
    pub render_timeout: Duration,
    pub username_field: Locator,
    pub password_field: Locator,
    /// Id of the element carrying the `data-events` attribute.
    pub container_id: String,
    /// Class of the rendered event titles.
    pub event_title_class: String,
}

impl ExtractorSettings {
    pub fn new(
        auth_url: impl Into<String>,
        calendar_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            calendar_url: calendar_url.into(),
            username: username.into(),
            password: password.into(),
            login_timeout: Duration::from_secs(10),
            calendar_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(30),
            username_field: Locator::XPath("//input[@name='UserName']".to_string()),
            password_field: Locator::XPath("//input[@name='Password']".to_string()),
            container_id: "generalCalendar".to_string(),
            event_title_class: "fc-event-title".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self::new(
            &config.auth_url,
            &config.calendar_url,
            &config.username,
            &config.password,
        );
        settings.login_timeout = config.login_timeout();
        settings.calendar_timeout = config.calendar_timeout();
        settings.render_timeout = config.render_timeout();
        settings
    }

    fn locator(&self, stage: WaitStage) -> Locator {
        match stage {
            WaitStage::UsernameField => self.username_field.clone(),
            WaitStage::PasswordField => self.password_field.clone(),
            WaitStage::CalendarShell => Locator::Id(self.container_id.clone()),
            WaitStage::EventTitles => Locator::Class(self.event_title_class.clone()),
        }
    }

    fn timeout(&self, stage: WaitStage) -> Duration {
        match stage {
            WaitStage::UsernameField | WaitStage::PasswordField => self.login_timeout,
            WaitStage::CalendarShell => self.calendar_timeout,
            WaitStage::EventTitles => self.render_timeout,
        }
    }
}

impl fmt::Debug for ExtractorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorSettings")
            .field("auth_url", &self.auth_url)
            .field("calendar_url", &self.calendar_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_timeout", &self.login_timeout)
            .field("calendar_timeout", &self.calendar_timeout)
            .field("render_timeout", &self.render_timeout)
            .field("container_id", &self.container_id)
            .field("event_title_class", &self.event_title_class)
            .finish()
    }
}

pub struct CalendarExtractor<L: BrowserLauncher> {
    launcher: L,
    settings: ExtractorSettings,
}

impl<L: BrowserLauncher> CalendarExtractor<L> {
    pub fn new(launcher: L, settings: ExtractorSettings) -> Self {
        Self { launcher, settings }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Run the whole sign-in and extraction sequence once.
    ///
    /// Timeouts produce an empty `Extraction`; browser failures and an
    /// unreadable payload are errors. The session is closed either way.
    pub async fn extract(&self) -> Result<Extraction, ExtractError> {
        let mut session = self.launcher.launch().await?;
        let result = self.drive(&mut session).await;

        if let Err(e) = session.close().await {
            log::warn!("Failed to close browser session: {}", e);
        }

        match &result {
            Ok(extraction) if extraction.state == ExtractState::Extracted => {
                log::info!("Extracted {} calendar events", extraction.events.len())
            }
            Ok(_) => {}
            Err(e) => log::error!("Calendar extraction failed: {}", e),
        }
        result
    }

    async fn drive(&self, session: &mut L::Session) -> Result<Extraction, ExtractError> {
        let mut state = ExtractState::Start;
        log::debug!("{:?}: opening {}", state, self.settings.auth_url);
        session.navigate(&self.settings.auth_url).await?;

        let Some(username_field) = self.wait(session, WaitStage::UsernameField).await? else {
            return Ok(Extraction::timed_out(WaitStage::UsernameField));
        };
        let Some(password_field) = self.wait(session, WaitStage::PasswordField).await? else {
            return Ok(Extraction::timed_out(WaitStage::PasswordField));
        };
        state = ExtractState::AuthPageLoaded;
        log::debug!("{:?}", state);

        session
            .send_keys(&username_field, &self.settings.username)
            .await?;
        session
            .send_keys(&password_field, &self.settings.password)
            .await?;
        session.send_keys(&password_field, ENTER_KEY).await?;
        state = ExtractState::CredentialsSubmitted;
        log::debug!("{:?}", state);

        if self.wait(session, WaitStage::CalendarShell).await?.is_none() {
            return Ok(Extraction::timed_out(WaitStage::CalendarShell));
        }
        state = ExtractState::CalendarPageLoaded;
        log::debug!("{:?}: opening {}", state, self.settings.calendar_url);

        session.navigate(&self.settings.calendar_url).await?;
        if self.wait(session, WaitStage::EventTitles).await?.is_none() {
            return Ok(Extraction::timed_out(WaitStage::EventTitles));
        }
        state = ExtractState::CalendarRendered;
        log::debug!("{:?}", state);

        let source = session.page_source().await?;
        let events = parse_events(&source, &self.settings.container_id)?;
        Ok(Extraction::extracted(events))
    }

    /// One bounded wait. `Ok(None)` means the wait timed out.
    async fn wait(
        &self,
        session: &mut L::Session,
        stage: WaitStage,
    ) -> Result<Option<<L::Session as BrowserSession>::Element>, ExtractError> {
        let locator = self.settings.locator(stage);
        let timeout = self.settings.timeout(stage);
        log::debug!("Waiting up to {:?} for {} ({})", timeout, stage, locator);

        match session.wait_for_element(&locator, timeout).await? {
            WaitResult::Found(element) => Ok(Some(element)),
            WaitResult::TimedOut => {
                log::error!(
                    "Timed out after {:?} waiting for the {} ({:?} timeout)",
                    timeout,
                    stage,
                    stage.kind()
                );
                Ok(None)
            }
        }
    }
}
