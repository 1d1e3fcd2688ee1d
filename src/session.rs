//! One-time setup of the search results page.
//!
//! Opens the site, searches the phrase, narrows to a topic, sorts newest
//! first and waits for the list to settle. Every step is fail-fast: the
//! first error aborts the run and names the step that failed.

use crate::automation::{AutomationError, PageAutomation};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::RunParams;
use crate::pagination::wait_for_loading;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument};

pub struct SearchSession<'a> {
    config: &'a Config,
    params: &'a RunParams,
}

fn at(step: &'static str) -> impl FnOnce(AutomationError) -> ScrapeError {
    move |source| ScrapeError::Session { step, source }
}

impl<'a> SearchSession<'a> {
    pub fn new(config: &'a Config, params: &'a RunParams) -> Self {
        Self { config, params }
    }

    #[instrument(level = "info", skip_all, fields(phrase = %self.params.search_phrase, topic = %self.params.topic))]
    pub async fn run<P: PageAutomation>(&self, page: &P) -> Result<(), ScrapeError> {
        let l = &self.config.locators;
        let t = &self.config.timeouts;

        info!(url = %self.config.base_url, "Opening site");
        page.goto(&self.config.base_url).await.map_err(at("open the site"))?;

        info!("Searching");
        page.wait_visible(&l.search_button, t.element())
            .await
            .map_err(at("find the search button"))?;
        self.click(page, &l.search_button, "open the search form").await?;
        page.input_text(&l.search_input, &self.params.search_phrase)
            .await
            .map_err(at("enter the search phrase"))?;
        self.click(page, &l.submit_button, "submit the search").await?;

        if self.params.topic.is_empty() {
            debug!("No topic requested; skipping topic filter");
        } else {
            self.select_topic(page).await?;
        }

        info!("Sorting by newest");
        page.wait_visible(&l.sort_select, t.element())
            .await
            .map_err(at("find the sort control"))?;
        page.select_from_list(&l.sort_select, &self.config.newest_sort_value)
            .await
            .map_err(at("sort by newest"))?;
        wait_for_loading(page, l, t)
            .await
            .map_err(at("wait for sorted results"))?;

        info!("Search results ready");
        Ok(())
    }

    async fn select_topic<P: PageAutomation>(&self, page: &P) -> Result<(), ScrapeError> {
        let l = &self.config.locators;
        let t = &self.config.timeouts;
        let topic = &self.params.topic;

        info!(%topic, "Selecting topic");
        page.wait_visible(&l.topic_filter_toggle, t.element())
            .await
            .map_err(at("find the topic filter"))?;
        self.click(page, &l.topic_filter_toggle, "open the topic filter").await?;

        let checkbox = l.topic_checkbox_for(topic);
        page.wait_visible(&checkbox, t.element())
            .await
            .map_err(at("find the topic checkbox"))?;
        page.select_checkbox(&checkbox)
            .await
            .map_err(at("select the topic"))?;

        let count_el = page
            .find_element(&l.topic_count_for(topic), None)
            .await
            .map_err(at("find the topic result count"))?;
        let text = page
            .get_text(&count_el)
            .await
            .map_err(at("read the topic result count"))?;
        let expected = parse_count(&text).ok_or_else(|| ScrapeError::TopicCount {
            topic: topic.clone(),
            text: text.clone(),
        })?;
        info!(%topic, expected, "Topic selected");

        self.wait_for_result_count(page, expected).await
    }

    /// Poll the result-count banner until it reports `expected` results.
    async fn wait_for_result_count<P: PageAutomation>(
        &self,
        page: &P,
        expected: u64,
    ) -> Result<(), ScrapeError> {
        let l = &self.config.locators;
        let t = &self.config.timeouts;
        let deadline = Instant::now() + t.result_count();

        loop {
            let shown = match page.find_element(&l.result_count, None).await {
                Ok(el) => page
                    .get_text(&el)
                    .await
                    .map_err(at("read the result count"))?,
                Err(e) if e.is_not_found() => String::new(),
                Err(e) => return Err(at("find the result count")(e)),
            };
            if parse_count(&shown) == Some(expected) {
                debug!(%shown, "Result count settled");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(at("wait for the filtered result count")(
                    AutomationError::Timeout {
                        locator: l.result_count.clone(),
                        timeout: t.result_count(),
                    },
                ));
            }
            sleep(t.poll_interval()).await;
        }
    }

    async fn click<P: PageAutomation>(
        &self,
        page: &P,
        locator: &str,
        step: &'static str,
    ) -> Result<(), ScrapeError> {
        let el = page.find_element(locator, None).await.map_err(at(step))?;
        page.click(&el).await.map_err(at(step))
    }
}

/// First number in `text`, ignoring thousands separators.
///
/// `"1,234 results for climate"` gives `1234`.
pub fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
