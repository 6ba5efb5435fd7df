//! Fare extraction from trip planner result pages
//!
//! The planner renders every itinerary as an accordion panel holding a fare
//! table. The regular total sits in the second cell of the third-from-last row.
//! The extractor reads that cell from every panel and keeps the lowest fare,
//! skipping panels that do not have the expected shape.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use super::{Fare, RawPage};

static TRIP_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#Accordion1").expect("static selector"));
static TRIP_OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".AccordionPanel").expect("static selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("static selector"));

/// Position of the fare summary row, counted from the last row (0 = last)
const SUMMARY_ROW_FROM_END: usize = 2;

/// Position of the fare cell within the summary row
const FARE_CELL: usize = 1;

/// Hard extraction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The page has no trip results container at all
    #[error("no trip container")]
    NoTripContainer,
}

/// A parsed result page with the handful of queries fare extraction needs
pub struct FareDocument {
    html: Html,
}

impl FareDocument {
    pub fn parse(page: &RawPage) -> Self {
        Self {
            html: Html::parse_document(page.as_str()),
        }
    }

    /// Finds the single element matching an id selector; the first wins if
    /// the page repeats the id.
    pub fn find_container(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }
}

/// All descendants of `parent` matching a class selector, in document order
pub fn children_by_class<'a>(parent: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    parent.select(selector).collect()
}

/// The `n`th table row counted from the end (0 = last row), if there are enough rows
pub fn nth_row_from_end(parent: ElementRef<'_>, n: usize) -> Option<ElementRef<'_>> {
    let rows: Vec<_> = parent.select(&ROW).collect();
    rows.len().checked_sub(n + 1).map(|i| rows[i])
}

/// The `n`th cell (0-based) of a row
pub fn nth_cell(row: ElementRef<'_>, n: usize) -> Option<ElementRef<'_>> {
    row.select(&CELL).nth(n)
}

/// Text content of an element with surrounding whitespace removed
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Fare listed by one trip option, or `None` if the option is malformed
fn option_fare(option: ElementRef<'_>) -> Option<Fare> {
    let summary = nth_row_from_end(option, SUMMARY_ROW_FROM_END)?;
    let cell = nth_cell(summary, FARE_CELL)?;
    Fare::parse_currency(&element_text(cell))
}

/// Extracts the lowest fare listed on a result page
///
/// # Returns
/// * `Ok(Some(fare))` - the minimum over all well-formed trip options
/// * `Ok(None)` - the container exists but no option yielded a fare
/// * `Err(ParseFailure::NoTripContainer)` - the page is not a result page
pub fn extract_fare(page: &RawPage) -> Result<Option<Fare>, ParseFailure> {
    let document = FareDocument::parse(page);
    let container = document
        .find_container(&TRIP_CONTAINER)
        .ok_or(ParseFailure::NoTripContainer)?;

    let options = children_by_class(container, &TRIP_OPTION);
    let total = options.len();
    let fares: Vec<Fare> = options
        .into_iter()
        .enumerate()
        .filter_map(|(i, option)| {
            let fare = option_fare(option);
            if fare.is_none() {
                debug!(option = i, "skipping trip option without a readable fare");
            }
            fare
        })
        .collect();

    debug!(options = total, parsed = fares.len(), "extracted trip options");
    Ok(fares.into_iter().min())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A well-formed trip option: the total sits third from the end
    fn panel(total: &str) -> String {
        format!(
            r#"<div class="AccordionPanel"><table>
                <tr><td>Depart</td><td>9:30 AM</td></tr>
                <tr><td>Total Regular</td><td>{total}</td></tr>
                <tr><td>Reduced</td><td>$1.00</td></tr>
                <tr><td>Transfers</td><td>0</td></tr>
            </table></div>"#
        )
    }

    fn results_page(panels: &[String]) -> RawPage {
        RawPage::new(format!(
            r#"<html><body><div id="Accordion1">{}</div></body></html>"#,
            panels.concat()
        ))
    }

    fn cents(page: &RawPage) -> Option<u64> {
        extract_fare(page).unwrap().map(|f| f.cents())
    }

    #[test]
    fn test_extract_returns_minimum_fare() {
        let page = results_page(&[panel("$12.50"), panel("$9.00"), panel("$15.00")]);
        assert_eq!(cents(&page), Some(900));
    }

    #[test]
    fn test_extract_single_option() {
        let page = results_page(&[panel("$2.25")]);
        assert_eq!(cents(&page), Some(225));
    }

    #[test]
    fn test_extract_skips_option_missing_summary_row() {
        let broken = r#"<div class="AccordionPanel"><table>
                <tr><td>Depart</td><td>9:30 AM</td></tr>
            </table></div>"#
            .to_string();
        let page = results_page(&[panel("$20.00"), broken]);
        assert_eq!(cents(&page), Some(2000));
    }

    #[test]
    fn test_extract_skips_option_missing_fare_cell() {
        let broken = r#"<div class="AccordionPanel"><table>
                <tr><td>Depart</td></tr>
                <tr><td>Total Regular</td></tr>
                <tr><td>Reduced</td></tr>
                <tr><td>Transfers</td></tr>
            </table></div>"#
            .to_string();
        let page = results_page(&[broken, panel("$4.75")]);
        assert_eq!(cents(&page), Some(475));
    }

    #[test]
    fn test_extract_skips_non_numeric_fare() {
        let page = results_page(&[panel("Call for fare"), panel("$3.10")]);
        assert_eq!(cents(&page), Some(310));
    }

    #[test]
    fn test_extract_no_container_is_parse_failure() {
        let page = RawPage::new("<html><body><p>No service found</p></body></html>");
        assert_eq!(extract_fare(&page), Err(ParseFailure::NoTripContainer));
    }

    #[test]
    fn test_extract_empty_container_is_no_fare() {
        let page = results_page(&[]);
        assert_eq!(extract_fare(&page), Ok(None));
    }

    #[test]
    fn test_extract_all_options_malformed_is_no_fare() {
        let page = results_page(&[panel("TBD"), panel("")]);
        assert_eq!(extract_fare(&page), Ok(None));
    }

    #[test]
    fn test_extract_ignores_panels_outside_container() {
        let page = RawPage::new(format!(
            r#"<html><body>{}<div id="Accordion1">{}</div></body></html>"#,
            panel("$1.00"),
            panel("$6.00")
        ));
        assert_eq!(cents(&page), Some(600));
    }

    #[test]
    fn test_nth_row_from_end_needs_enough_rows() {
        let html = Html::parse_fragment("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>");
        let root = html.root_element();
        assert!(nth_row_from_end(root, 2).is_none());
        let last = nth_row_from_end(root, 0).unwrap();
        assert_eq!(element_text(last), "b");
    }

    #[test]
    fn test_nth_cell_out_of_range() {
        let html = Html::parse_fragment("<table><tr><td>only</td></tr></table>");
        let row = nth_row_from_end(html.root_element(), 0).unwrap();
        assert_eq!(element_text(nth_cell(row, 0).unwrap()), "only");
        assert!(nth_cell(row, 1).is_none());
    }
}
