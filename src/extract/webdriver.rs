// File: ./src/extract/webdriver.rs
//! WebDriver-backed browser (chromedriver or any W3C WebDriver endpoint).
use crate::config::Config;
use crate::extract::{BrowserError, BrowserLauncher, BrowserSession, Locator, WaitResult};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct WebDriverLauncher {
    webdriver_url: String,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>, headless: bool) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            headless,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.webdriver_url, config.headless)
    }

    fn chrome_args(&self) -> Vec<&'static str> {
        let mut args = vec!["--disable-gpu", "--no-sandbox", "--window-size=1280,1024"];
        if self.headless {
            args.push("--headless=new");
        }
        args
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession, BrowserError> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": self.chrome_args() }),
        );

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| BrowserError::Launch(format!("{} ({})", e, self.webdriver_url)))?;

        log::debug!("Browser session started via {}", self.webdriver_url);
        Ok(WebDriverSession { client })
    }
}

pub struct WebDriverSession {
    client: Client,
}

fn command(e: CmdError) -> BrowserError {
    BrowserError::Command(e.to_string())
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.client.goto(url).await.map_err(command)
    }

    async fn wait_for_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WaitResult<Element>, BrowserError> {
        let wait = self.client.wait().at_most(timeout);
        let found = match locator {
            Locator::XPath(xpath) => wait.for_element(fantoccini::Locator::XPath(xpath)).await,
            Locator::Id(id) => wait.for_element(fantoccini::Locator::Id(id)).await,
            Locator::Class(class) => {
                let css = format!(".{}", class);
                wait.for_element(fantoccini::Locator::Css(&css)).await
            }
        };

        match found {
            Ok(element) => Ok(WaitResult::Found(element)),
            Err(CmdError::WaitTimeout) => Ok(WaitResult::TimedOut),
            Err(e) => Err(command(e)),
        }
    }

    async fn send_keys(&mut self, element: &Element, text: &str) -> Result<(), BrowserError> {
        element.send_keys(text).await.map_err(command)
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.client.source().await.map_err(command)
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.client.close().await.map_err(command)?;
        log::debug!("Browser session closed");
        Ok(())
    }
}
