//! Source Parser Registry
//!
//! One parsing strategy per upstream response shape, selected by [`SourceApi`].
//! Each strategy implements [`SourceParser`]; adding a source means adding a
//! variant and a parser, never branching inside shared code.

pub mod data_go_kr;
pub mod kor_pet_tour;
pub mod seoul_open_api;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::{IngestionError, Result};
use crate::schemas::{PlaceCategory, PlaceRecord, SourceApi};

pub use data_go_kr::DataGoKrParser;
pub use kor_pet_tour::KorPetTourParser;
pub use seoul_open_api::SeoulOpenApiParser;

/// Records parsed from one page, plus the number of items dropped because
/// they could not be minimally parsed
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub records: Vec<PlaceRecord>,
    pub dropped: usize,
}

impl ParsedPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Strategy for turning one decoded page body into canonical records
pub trait SourceParser: Send + Sync {
    /// Source this parser handles
    fn source_api(&self) -> SourceApi;

    /// Fails with `ApiError` when the body is an upstream error envelope
    fn check_envelope(&self, body: &Value) -> Result<()>;

    /// Pulls the item list out of the body. A missing list is empty, a single
    /// object is a list of one.
    fn extract_items(&self, body: &Value) -> Vec<Value>;

    /// Maps one item; `None` drops it
    fn parse_item(&self, item: &Value) -> Option<PlaceRecord>;

    /// Extracts and maps every item on the page
    fn parse_items(&self, body: &Value) -> ParsedPage {
        let mut page = ParsedPage::default();
        for item in self.extract_items(body) {
            match self.parse_item(&item) {
                Some(record) => page.records.push(record),
                None => {
                    debug!(source = %self.source_api(), "Dropping unparseable item");
                    page.dropped += 1;
                }
            }
        }
        page
    }
}

static KOR_PET_TOUR: KorPetTourParser = KorPetTourParser;
static DATA_GO_KR: DataGoKrParser = DataGoKrParser;
static SEOUL_OPEN_API: SeoulOpenApiParser = SeoulOpenApiParser;

/// Parser registered for a source
pub fn parser_for(api: SourceApi) -> &'static dyn SourceParser {
    match api {
        SourceApi::KorPetTour => &KOR_PET_TOUR,
        SourceApi::DataGoKr => &DATA_GO_KR,
        SourceApi::SeoulOpenApi => &SEOUL_OPEN_API,
    }
}

/// Checks the envelope and parses a page for `source`.
/// Items left uncategorized pick up the source's default category.
pub fn parse_page(source: &SourceConfig, body: &Value) -> Result<ParsedPage> {
    let parser = parser_for(source.api);
    parser.check_envelope(body)?;

    let mut page = parser.parse_items(body);

    if let Some(default_category) = source.default_category {
        for record in page.records.iter_mut() {
            if record.category == PlaceCategory::Other {
                record.category = default_category;
            }
        }
    }

    if page.dropped > 0 {
        warn!(
            source = %source.api,
            dropped = page.dropped,
            kept = page.records.len(),
            "Dropped items that could not be parsed"
        );
    }

    Ok(page)
}

/// Turns a result code/message pair into an envelope error unless the code is
/// one of `success_codes`. An absent code is treated as success.
pub(crate) fn ensure_success(
    code: Option<String>,
    message: Option<String>,
    success_codes: &[&str],
) -> Result<()> {
    match code {
        Some(code) if !success_codes.contains(&code.trim()) => Err(IngestionError::ApiError {
            code,
            message: message.unwrap_or_else(|| "Unknown error".to_string()),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_dispatch() {
        for api in SourceApi::ALL {
            assert_eq!(parser_for(api).source_api(), api);
        }
    }

    #[test]
    fn test_ensure_success() {
        assert!(ensure_success(None, None, &["0000"]).is_ok());
        assert!(ensure_success(Some("0000".to_string()), None, &["0000"]).is_ok());

        let err = ensure_success(Some("30".to_string()), Some("KEY NOT REGISTERED".to_string()), &["0000"])
            .unwrap_err();
        match err {
            IngestionError::ApiError { code, message } => {
                assert_eq!(code, "30");
                assert_eq!(message, "KEY NOT REGISTERED");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_category_applies_to_uncategorized() {
        let source = SourceConfig::new(SourceApi::SeoulOpenApi, "https://example.org", "/svc", "k")
            .with_default_category(PlaceCategory::Hospital);
        let body = json!({
            "LOCALDATA_020301": {
                "list_total_count": 2,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
                "row": [
                    {"MGTNO": "A1", "BPLCNM": "행복이네", "UPTAENM": ""},
                    {"MGTNO": "A2", "BPLCNM": "멍멍 카페", "UPTAENM": "카페"}
                ]
            }
        });

        let page = parse_page(&source, &body).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.records[0].category, PlaceCategory::Hospital);
        assert_eq!(page.records[1].category, PlaceCategory::Cafe);
    }
}
