// src/parse.rs

//! Listing page parsing.
//!
//! All page-structure knowledge comes from [`ListingSelectors`]; the
//! parser itself has no source-specific logic. Swapping the crawl target
//! means swapping configuration, not code.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::ListingSelectors;
use crate::error::{AppError, Result};
use crate::models::RawEntry;

/// One parsed listing page.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Raw field values per listing entry, in page order
    pub entries: Vec<RawEntry>,

    /// Absolute URL of the next page, when one is discoverable
    pub next_page: Option<String>,
}

/// Turns a fetched page body into raw entries plus a next-page link.
pub trait PageParser: Send + Sync {
    fn parse(&self, html: &str, page_url: &Url) -> Result<ListingPage>;
}

/// CSS-selector-driven parser.
pub struct SelectorParser {
    entry: Selector,
    title: Selector,
    link: Selector,
    description: Selector,
    description_attr: Option<String>,
    company: Selector,
    location: Selector,
    job_info: Selector,
    published: Selector,
    published_attr: Option<String>,
    stats: Selector,
    stats_attr: Option<String>,
    next_page: Selector,
}

impl SelectorParser {
    /// Compile the configured selectors.
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            entry: parse_selector(&selectors.entry)?,
            title: parse_selector(&selectors.title)?,
            link: parse_selector(&selectors.link)?,
            description: parse_selector(&selectors.description)?,
            description_attr: selectors.description_attr.clone(),
            company: parse_selector(&selectors.company)?,
            location: parse_selector(&selectors.location)?,
            job_info: parse_selector(&selectors.job_info)?,
            published: parse_selector(&selectors.published)?,
            published_attr: selectors.published_attr.clone(),
            stats: parse_selector(&selectors.stats)?,
            stats_attr: selectors.stats_attr.clone(),
            next_page: parse_selector(&selectors.next_page)?,
        })
    }

    fn parse_entry(&self, entry: &ElementRef<'_>, page_url: &Url) -> RawEntry {
        let link = entry
            .select(&self.link)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| page_url.join(href).ok())
            .map(String::from);

        let mut stats = entry
            .select(&self.stats)
            .map(|el| select_value(&el, self.stats_attr.as_deref()));

        RawEntry {
            title: first_value(entry, &self.title, None),
            url: link,
            description: first_value(entry, &self.description, self.description_attr.as_deref()),
            company_name: first_value(entry, &self.company, None),
            location: first_value(entry, &self.location, None),
            job_info: entry
                .select(&self.job_info)
                .map(|el| element_text(&el))
                .collect(),
            published: first_value(entry, &self.published, self.published_attr.as_deref()),
            views: stats.next(),
            applications: stats.next(),
        }
    }
}

impl PageParser for SelectorParser {
    fn parse(&self, html: &str, page_url: &Url) -> Result<ListingPage> {
        let document = Html::parse_document(html);

        let entries = document
            .select(&self.entry)
            .map(|entry| self.parse_entry(&entry, page_url))
            .collect();

        // The next-page link is read from the last pagination control;
        // a missing or unresolvable link ends the category.
        let next_page = document
            .select(&self.next_page)
            .last()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| page_url.join(href).ok())
            .map(String::from);

        Ok(ListingPage { entries, next_page })
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Trimmed text content of an element.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Attribute value when `attr` is set, text content otherwise.
fn select_value(el: &ElementRef<'_>, attr: Option<&str>) -> String {
    match attr {
        Some(name) => el.value().attr(name).unwrap_or_default().to_string(),
        None => element_text(el),
    }
}

/// First match of `sel` under `el`, as a non-empty string.
fn first_value(el: &ElementRef<'_>, sel: &Selector, attr: Option<&str>) -> Option<String> {
    el.select(sel)
        .next()
        .map(|found| select_value(&found, attr))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SelectorParser {
        SelectorParser::new(&ListingSelectors::default()).unwrap()
    }

    fn base_url() -> Url {
        Url::parse("https://example.com/jobs/?primary_keyword=Python").unwrap()
    }

    fn listing_html(entries: &str, pagination: &str) -> String {
        format!(r#"<html><body><ul class="list-jobs">{entries}</ul>{pagination}</body></html>"#)
    }

    fn entry_html(title: &str, href: &str) -> String {
        format!(
            r#"<li class="list-jobs__item">
                 <header><a class="mr-2" href="/c/acme">Acme</a></header>
                 <a class="job-list-item__link" href="{href}">{title}</a>
                 <span class="location-text">Kyiv</span>
                 <div class="job-list-item__job-info"><span>Full-time</span><span>3 years</span></div>
                 <div class="job-list-item__description"><span data-original-text="We need {title}">short</span></div>
                 <span class="text-muted">
                   <span class="mr-2 nobr" title="14:30 02.01.2026">today</span>
                   <span class="nobr">
                     <span class="mr-2" title="120 views">120</span>
                     <span class="mr-2" title="9 applications">9</span>
                   </span>
                 </span>
               </li>"#
        )
    }

    #[test]
    fn parses_entries_with_all_fields() {
        let html = listing_html(&entry_html("Python Dev", "/jobs/42"), "");
        let page = parser().parse(&html, &base_url()).unwrap();
        assert_eq!(page.entries.len(), 1);

        let entry = &page.entries[0];
        assert_eq!(entry.title.as_deref(), Some("Python Dev"));
        assert_eq!(entry.url.as_deref(), Some("https://example.com/jobs/42"));
        assert_eq!(entry.description.as_deref(), Some("We need Python Dev"));
        assert_eq!(entry.company_name.as_deref(), Some("Acme"));
        assert_eq!(entry.location.as_deref(), Some("Kyiv"));
        assert_eq!(entry.job_info, vec!["Full-time", "3 years"]);
        assert_eq!(entry.published.as_deref(), Some("14:30 02.01.2026"));
        assert_eq!(entry.views.as_deref(), Some("120 views"));
        assert_eq!(entry.applications.as_deref(), Some("9 applications"));
    }

    #[test]
    fn missing_fields_come_back_as_none() {
        let html = listing_html(r#"<li class="list-jobs__item"><span>bare</span></li>"#, "");
        let page = parser().parse(&html, &base_url()).unwrap();
        assert_eq!(page.entries.len(), 1);

        let entry = &page.entries[0];
        assert!(entry.title.is_none());
        assert!(entry.url.is_none());
        assert!(entry.published.is_none());
        assert!(entry.views.is_none());
    }

    #[test]
    fn next_page_comes_from_last_pagination_control() {
        let pagination = r#"<ul class="pagination">
            <li><a href="?page=1">1</a></li>
            <li class="active"><a href="?page=2">2</a></li>
            <li><a href="?page=3">&raquo;</a></li>
        </ul>"#;
        let html = listing_html("", pagination);
        let page = parser().parse(&html, &base_url()).unwrap();
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://example.com/jobs/?page=3")
        );
    }

    #[test]
    fn absent_pagination_means_no_next_page() {
        let html = listing_html(&entry_html("Dev", "/jobs/1"), "");
        let page = parser().parse(&html, &base_url()).unwrap();
        assert!(page.next_page.is_none());
    }

    #[test]
    fn pagination_without_href_means_no_next_page() {
        let pagination = r#"<ul class="pagination"><li><a>3</a></li></ul>"#;
        let html = listing_html("", pagination);
        let page = parser().parse(&html, &base_url()).unwrap();
        assert!(page.next_page.is_none());
    }

    #[test]
    fn entry_urls_resolve_against_page_url() {
        let html = listing_html(&entry_html("Dev", "../vacancy/7"), "");
        let page = parser().parse(&html, &base_url()).unwrap();
        assert_eq!(
            page.entries[0].url.as_deref(),
            Some("https://example.com/vacancy/7")
        );
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let mut selectors = ListingSelectors::default();
        selectors.entry = "[[broken".to_string();
        assert!(SelectorParser::new(&selectors).is_err());
    }
}
