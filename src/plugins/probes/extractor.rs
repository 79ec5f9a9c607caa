use scraper::{Html, Selector};
use serde::Deserialize;

use crate::plugins::traits::ProbeResult;
use crate::utils::error::ProbeError;

/// One entry of the JSON blob the marketplace embeds next to each listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingPayload {
    direct_purchase_link: Option<String>,
}

/// Scans rendered listing HTML for a product whose title contains
/// `search_token` and returns its purchase link.
///
/// Each title element points at its JSON payload through `data-pid-code`,
/// which is the `id` of the element holding the payload text.
pub fn extract_purchase_link(
    html: &str,
    search_token: &str,
    title_selector: &str,
) -> Result<ProbeResult, ProbeError> {
    let titles = Selector::parse(title_selector).map_err(|e| {
        ProbeError::Other(anyhow::anyhow!(
            "Invalid CSS selector '{}': {:?}",
            title_selector,
            e
        ))
    })?;
    let document = Html::parse_document(html);

    let mut saw_titles = false;
    let mut matched_titles = false;
    let mut data_found = false;
    let mut parse_errors = Vec::new();

    for element in document.select(&titles) {
        saw_titles = true;

        let title = element.value().attr("title").unwrap_or_default();
        if !title.contains(search_token) {
            continue;
        }
        matched_titles = true;

        let Some(pid_code) = element
            .value()
            .attr("data-pid-code")
            .filter(|code| !code.is_empty())
        else {
            tracing::debug!("Product ID not found for title: {}", title);
            continue;
        };

        let Some(payload) = payload_text(&document, pid_code) else {
            tracing::debug!("No product data element for product ID {}", pid_code);
            continue;
        };

        match serde_json::from_str::<Vec<ListingPayload>>(&payload) {
            Ok(entries) => {
                data_found = true;
                let link = entries
                    .into_iter()
                    .next()
                    .and_then(|entry| entry.direct_purchase_link)
                    .filter(|link| !link.trim().is_empty());

                match link {
                    Some(link) => return Ok(ProbeResult::Found(link)),
                    None => tracing::debug!(
                        "Product '{}' found but no direct purchase link available",
                        title
                    ),
                }
            }
            Err(e) => {
                tracing::warn!("Error parsing JSON for product ID {}: {}", pid_code, e);
                parse_errors.push(format!("{}: {}", pid_code, e));
            }
        }
    }

    if data_found {
        return Ok(ProbeResult::NotFoundMatching);
    }
    if !parse_errors.is_empty() {
        return Err(ProbeError::DataParse(parse_errors.join("; ")));
    }
    if saw_titles && !matched_titles {
        return Ok(ProbeResult::NotFoundMatching);
    }

    Ok(ProbeResult::NoDataAvailable)
}

fn payload_text(document: &Html, id: &str) -> Option<String> {
    let with_id = Selector::parse("[id]").ok()?;
    document
        .select(&with_id)
        .find(|element| element.value().id() == Some(id))
        .map(|element| element.text().collect::<String>().trim().to_string())
}
