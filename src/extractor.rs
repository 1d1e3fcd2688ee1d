//! Reading one result card into an [`Article`].
//!
//! The date is read first; cards outside the [`DateWindow`] are rejected
//! before any other field is touched. Title and date are mandatory,
//! description and image are not.

use crate::automation::PageAutomation;
use crate::config::Locators;
use crate::date_window::DateWindow;
use crate::error::ExtractionError;
use crate::models::Article;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub struct ArticleExtractor<'a> {
    locators: &'a Locators,
    window: DateWindow,
}

impl<'a> ArticleExtractor<'a> {
    pub fn new(locators: &'a Locators, window: DateWindow) -> Self {
        Self { locators, window }
    }

    /// Extract a card.
    ///
    /// Returns `Ok(None)` when the card was published outside the window.
    pub async fn extract<P: PageAutomation>(
        &self,
        page: &P,
        item: &P::Element,
    ) -> Result<Option<Article>, ExtractionError> {
        let published_at = self.read_date(page, item).await?;
        if !self.window.contains(published_at) {
            debug!(%published_at, "Result outside date window");
            return Ok(None);
        }

        let title = match page.find_element(&self.locators.item_title, Some(item)).await {
            Ok(el) => page.get_text(&el).await?.trim().to_string(),
            Err(e) if e.is_not_found() => return Err(ExtractionError::MissingTitle),
            Err(e) => return Err(e.into()),
        };
        if title.is_empty() {
            return Err(ExtractionError::MissingTitle);
        }

        let description = match page
            .find_element(&self.locators.item_description, Some(item))
            .await
        {
            Ok(el) => page.get_text(&el).await?.trim().to_string(),
            Err(e) if e.is_not_found() => {
                debug!(%title, "Result has no description");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let image_url = match page.find_element(&self.locators.item_image, Some(item)).await {
            Ok(el) => page
                .get_attribute(&el, "src")
                .await?
                .filter(|src| !src.is_empty()),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        if image_url.is_none() {
            debug!(%title, "Result has no image");
        }

        info!(%title, %published_at, "Article found");
        Ok(Some(Article {
            title,
            description,
            published_at,
            image_url,
        }))
    }

    async fn read_date<P: PageAutomation>(
        &self,
        page: &P,
        item: &P::Element,
    ) -> Result<DateTime<Utc>, ExtractionError> {
        let date_el = match page.find_element(&self.locators.item_date, Some(item)).await {
            Ok(el) => el,
            Err(e) if e.is_not_found() => {
                return Err(ExtractionError::MissingDate("no date element".to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let attr = &self.locators.item_date_attribute;
        let raw = page.get_attribute(&date_el, attr).await?.ok_or_else(|| {
            ExtractionError::MissingDate(format!("no '{attr}' attribute"))
        })?;
        parse_epoch_millis(&raw)
    }
}

/// Parse a millisecond Unix timestamp.
pub fn parse_epoch_millis(raw: &str) -> Result<DateTime<Utc>, ExtractionError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| ExtractionError::MissingDate(format!("unparsable timestamp {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::AutomationError;
    use crate::automation::fake::{FakeCard, FakeElement, FakePage, Field};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 15, 9, 0, 0).unwrap()
    }

    async fn extract_one(card: FakeCard) -> Result<Option<Article>, ExtractionError> {
        let locators = Locators::default();
        let page = FakePage::new(locators.clone(), vec![vec![card]]);
        let extractor = ArticleExtractor::new(&locators, DateWindow::new(now(), 2));
        extractor
            .extract(&page, &FakeElement::Card { page: 0, index: 0 })
            .await
    }

    #[test]
    fn test_parse_epoch_millis() {
        let parsed = parse_epoch_millis("1707998400000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap());
        assert!(parse_epoch_millis(" 1707998400000 ").is_ok());
        assert!(matches!(
            parse_epoch_millis("Feb. 15, 2024"),
            Err(ExtractionError::MissingDate(_))
        ));
        assert!(parse_epoch_millis("").is_err());
    }

    #[tokio::test]
    async fn test_complete_card() {
        let article = extract_one(FakeCard::dated(2024, 1, 20, "Heat wave"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(article.title, "Heat wave");
        assert_eq!(article.description, "About Heat wave");
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://img.example.com/Heat-wave.jpg")
        );
        assert_eq!(article.published_at, Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_out_of_window_is_not_an_error() {
        let result = extract_one(FakeCard::dated(2023, 11, 30, "Old news")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_out_of_window_skips_title() {
        // A broken title on an old card is never read.
        let card = FakeCard {
            title: None,
            ..FakeCard::dated(2023, 6, 1, "ignored")
        };
        assert!(extract_one(card).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_date_fails() {
        let card = FakeCard {
            timestamp: None,
            ..FakeCard::dated(2024, 2, 1, "No date")
        };
        assert!(matches!(
            extract_one(card).await,
            Err(ExtractionError::MissingDate(_))
        ));
    }

    #[tokio::test]
    async fn test_unparsable_date_fails() {
        let card = FakeCard {
            timestamp: Some("yesterday".to_string()),
            ..FakeCard::dated(2024, 2, 1, "Bad date")
        };
        assert!(matches!(
            extract_one(card).await,
            Err(ExtractionError::MissingDate(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_title_fails() {
        let card = FakeCard {
            title: None,
            ..FakeCard::dated(2024, 2, 1, "x")
        };
        assert!(matches!(
            extract_one(card).await,
            Err(ExtractionError::MissingTitle)
        ));
    }

    #[tokio::test]
    async fn test_missing_description_is_empty() {
        let card = FakeCard {
            description: None,
            ..FakeCard::dated(2024, 2, 1, "Brief")
        };
        let article = extract_one(card).await.unwrap().unwrap();
        assert_eq!(article.description, "");
    }

    #[tokio::test]
    async fn test_missing_image_is_absent() {
        let card = FakeCard {
            image: None,
            ..FakeCard::dated(2024, 2, 1, "No picture")
        };
        let article = extract_one(card).await.unwrap().unwrap();
        assert_eq!(article.image_url, None);
        assert_eq!(article.title, "No picture");
    }

    async fn extract_with(page: FakePage) -> Result<Option<Article>, ExtractionError> {
        let locators = Locators::default();
        let extractor = ArticleExtractor::new(&locators, DateWindow::new(now(), 2));
        extractor
            .extract(&page, &FakeElement::Card { page: 0, index: 0 })
            .await
    }

    fn single_card_page() -> FakePage {
        FakePage::new(
            Locators::default(),
            vec![vec![FakeCard::dated(2024, 2, 1, "Wildfire season")]],
        )
    }

    #[tokio::test]
    async fn test_stale_description_is_not_treated_as_missing() {
        let mut page = single_card_page();
        page.stale_fields = vec![Field::Description];
        assert!(matches!(
            extract_with(page).await,
            Err(ExtractionError::Automation(AutomationError::StaleElement(_)))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_description_propagates() {
        let mut page = single_card_page();
        page.unreadable_fields = vec![Field::Description];
        assert!(matches!(
            extract_with(page).await,
            Err(ExtractionError::Automation(AutomationError::Browser(_)))
        ));
    }

    #[tokio::test]
    async fn test_stale_image_is_not_treated_as_missing() {
        let mut page = single_card_page();
        page.stale_fields = vec![Field::Image];
        assert!(matches!(
            extract_with(page).await,
            Err(ExtractionError::Automation(AutomationError::StaleElement(_)))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_image_propagates() {
        let mut page = single_card_page();
        page.unreadable_fields = vec![Field::Image];
        assert!(matches!(
            extract_with(page).await,
            Err(ExtractionError::Automation(AutomationError::Browser(_)))
        ));
    }

    #[tokio::test]
    async fn test_stale_card_propagates() {
        let locators = Locators::default();
        let page = FakePage::new(locators.clone(), vec![vec![FakeCard::dated(2024, 2, 1, "a")]]);
        let extractor = ArticleExtractor::new(&locators, DateWindow::new(now(), 2));
        // Card handle from a page that is no longer displayed.
        let result = extractor
            .extract(&page, &FakeElement::Card { page: 1, index: 0 })
            .await;
        assert!(matches!(result, Err(ExtractionError::Automation(_))));
    }
}
