use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use scan_core::{canonical_job_url, collapse_whitespace, CardSummary, PaneSnapshot};

use crate::ScanError;

/// CSS selectors for the results page. Defaults follow the current
/// SimplyHired `data-testid` markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub results_list: String,
    /// Tried in order; the first selector matching any element wins.
    pub cards: Vec<String>,
    /// Tried in order within a card.
    pub card_title: Vec<String>,
    pub card_company: String,
    pub card_location: String,
    pub card_salary: String,
    pub detail_container: String,
    pub detail_title: String,
    pub detail_company: String,
    pub detail_location: String,
    pub description: String,
    pub compensation: String,
    pub detail_text: String,
    pub qualification_item: String,
    pub posted: String,
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            results_list: "#job-list".to_string(),
            cards: vec![
                "div[class*='SerpJob']".to_string(),
                "#job-list > li".to_string(),
            ],
            card_title: vec!["a[class*='jobTitle']".to_string(), "a".to_string()],
            card_company: "span[data-testid='companyName']".to_string(),
            card_location: "span[data-testid='searchSerpJobLocation']".to_string(),
            card_salary: "span[data-testid='searchSerpJobSalary']".to_string(),
            detail_container: "div[data-testid='viewJobBodyContainer']".to_string(),
            detail_title: "[data-testid='viewJobTitle']".to_string(),
            detail_company: "[data-testid='viewJobCompanyName']".to_string(),
            detail_location: "[data-testid='viewJobCompanyLocation']".to_string(),
            description: "div[data-testid='viewJobBodyJobFullDescriptionContent']".to_string(),
            compensation: "[data-testid='viewJobBodyJobCompensation']".to_string(),
            detail_text: "[data-testid='detailText']".to_string(),
            qualification_item: "[data-testid='viewJobQualificationItem']".to_string(),
            posted: "span[data-testid='viewJobBodyJobPostingTimestamp']".to_string(),
            next_page: "a[aria-label='Next page']".to_string(),
        }
    }
}

/// Cards read from one snapshot of the results list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardList {
    /// The card selector that matched, reused to click by index.
    pub selector: String,
    pub cards: Vec<CardSummary>,
}

/// Raw detail-pane fields; `None` or empty where the markup had nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailFields {
    pub pane_text: String,
    pub description: Option<String>,
    pub compensation: Option<String>,
    pub qualifications: Vec<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub date_posted: Option<String>,
}

/// [`SelectorConfig`] compiled once per run.
#[derive(Debug, Clone)]
pub struct PageSelectors {
    config: SelectorConfig,
    cards: Vec<(String, Selector)>,
    card_title: Vec<Selector>,
    card_company: Selector,
    card_location: Selector,
    card_salary: Selector,
    any_link: Selector,
    detail_container: Selector,
    detail_title: Selector,
    detail_company: Selector,
    detail_location: Selector,
    description: Selector,
    compensation: Selector,
    detail_text: Selector,
    qualification_item: Selector,
    posted: Selector,
    next_page: Selector,
}

fn compile(css: &str) -> Result<Selector, ScanError> {
    Selector::parse(css).map_err(|err| ScanError::Selector {
        selector: css.to_string(),
        message: format!("{err:?}"),
    })
}

impl PageSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ScanError> {
        if config.cards.is_empty() {
            return Err(ScanError::Config("at least one card selector is required".into()));
        }
        let cards = config
            .cards
            .iter()
            .map(|css| compile(css).map(|sel| (css.clone(), sel)))
            .collect::<Result<Vec<_>, _>>()?;
        let card_title = config
            .card_title
            .iter()
            .map(|css| compile(css))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            config: config.clone(),
            cards,
            card_title,
            card_company: compile(&config.card_company)?,
            card_location: compile(&config.card_location)?,
            card_salary: compile(&config.card_salary)?,
            any_link: compile("a[href]")?,
            detail_container: compile(&config.detail_container)?,
            detail_title: compile(&config.detail_title)?,
            detail_company: compile(&config.detail_company)?,
            detail_location: compile(&config.detail_location)?,
            description: compile(&config.description)?,
            compensation: compile(&config.compensation)?,
            detail_text: compile(&config.detail_text)?,
            qualification_item: compile(&config.qualification_item)?,
            posted: compile(&config.posted)?,
            next_page: compile(&config.next_page)?,
        })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Every card in `html`, in page order, using the first card selector that matches.
    pub fn cards(&self, html: &str, base: &Url) -> CardList {
        let doc = Html::parse_document(html);
        for (css, selector) in &self.cards {
            let cards: Vec<CardSummary> = doc
                .select(selector)
                .map(|card| self.read_card(card, base))
                .collect();
            if !cards.is_empty() {
                return CardList {
                    selector: css.clone(),
                    cards,
                };
            }
        }
        CardList {
            selector: self
                .cards
                .first()
                .map(|(css, _)| css.clone())
                .unwrap_or_default(),
            cards: Vec::new(),
        }
    }

    fn read_card(&self, card: ElementRef<'_>, base: &Url) -> CardSummary {
        let title_el = self
            .card_title
            .iter()
            .find_map(|selector| card.select(selector).next());
        let title = title_el.map(element_text).unwrap_or_default();
        let href = title_el
            .and_then(|el| el.value().attr("href"))
            .or_else(|| {
                card.select(&self.any_link)
                    .next()
                    .and_then(|el| el.value().attr("href"))
            })
            .unwrap_or_default();

        CardSummary {
            title,
            url: canonical_job_url(base, href).unwrap_or_default(),
            company: first_text(card, &self.card_company).unwrap_or_default(),
            location: first_text(card, &self.card_location).unwrap_or_default(),
            salary_text: first_text(card, &self.card_salary).unwrap_or_default(),
        }
    }

    /// Identity markers and text of the detail pane; `None` while the pane is absent.
    pub fn pane_snapshot(&self, html: &str) -> Option<PaneSnapshot> {
        let doc = Html::parse_document(html);
        let container = doc.select(&self.detail_container).next()?;
        Some(PaneSnapshot {
            title: doc_text(&doc, &self.detail_title),
            company: doc_text(&doc, &self.detail_company),
            text: element_text(container),
        })
    }

    pub fn detail(&self, html: &str) -> DetailFields {
        let doc = Html::parse_document(html);
        let pane_text = doc
            .select(&self.detail_container)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let description = doc
            .select(&self.description)
            .next()
            .map(block_text)
            .filter(|text| !text.is_empty());

        let compensation = doc.select(&self.compensation).next().and_then(|block| {
            block
                .select(&self.detail_text)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())
                .or_else(|| Some(element_text(block)).filter(|text| !text.is_empty()))
        });

        let qualifications = doc
            .select(&self.qualification_item)
            .map(|item| {
                item.select(&self.detail_text)
                    .next()
                    .map(element_text)
                    .unwrap_or_else(|| element_text(item))
            })
            .collect();

        let date_posted = doc_text(&doc, &self.posted)
            .map(|text| strip_posted_prefix(&text))
            .filter(|text| !text.is_empty());

        DetailFields {
            pane_text,
            description,
            compensation,
            qualifications,
            company: doc_text(&doc, &self.detail_company),
            location: doc_text(&doc, &self.detail_location),
            date_posted,
        }
    }

    pub fn has_next_page(&self, html: &str) -> bool {
        Html::parse_document(html)
            .select(&self.next_page)
            .next()
            .is_some()
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text nodes kept one per line, for long free text.
fn block_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn doc_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn strip_posted_prefix(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("posted") => {
            trimmed[6..].trim_start_matches(':').trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}
