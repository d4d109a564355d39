//! Korea Tourism Organization pet travel API
//!
//! Gateway-style envelope:
//! `response.header.{resultCode,resultMsg}` and items under
//! `response.body.items.item`, where `item` is an array, a bare object when the
//! page holds a single result, or `""`/absent when the page is empty.
//! Coordinates arrive as WGS84 strings (`mapx` = longitude, `mapy` = latitude).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{ensure_success, SourceParser};
use crate::error::Result;
use crate::normalize::{category_from_content_type, first_text, item_list, join_text, number, text, wgs84};
use crate::schemas::{PlaceRecord, SourceApi};

const SUCCESS_CODES: &[&str] = &["0000", "00"];

static HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("href pattern is valid"));

#[derive(Debug, Default)]
struct ResultHeader {
    result_code: Option<String>,
    result_msg: Option<String>,
}

impl ResultHeader {
    /// Reads the header leniently; the gateway sends `resultCode` as either
    /// a string or a bare number
    fn from_node(node: Option<&Value>) -> Self {
        node.map(|v| ResultHeader {
            result_code: text(v, "resultCode"),
            result_msg: text(v, "resultMsg"),
        })
        .unwrap_or_default()
    }
}

pub struct KorPetTourParser;

impl KorPetTourParser {
    /// First absolute URL in a homepage field, which is often an HTML anchor
    fn website(item: &Value) -> Option<String> {
        let raw = text(item, "homepage")?;
        HREF_RE
            .find(&raw)
            .map(|m| m.as_str().to_string())
    }

    fn coordinates(item: &Value) -> Option<(f64, f64)> {
        let longitude = number(item, "mapx")?;
        let latitude = number(item, "mapy")?;
        wgs84(latitude, longitude)
    }
}

impl SourceParser for KorPetTourParser {
    fn source_api(&self) -> SourceApi {
        SourceApi::KorPetTour
    }

    fn check_envelope(&self, body: &Value) -> Result<()> {
        // Gateway failures sometimes skip the `response` wrapper entirely
        let top = ResultHeader::from_node(Some(body));
        ensure_success(top.result_code, top.result_msg, SUCCESS_CODES)?;

        let header = ResultHeader::from_node(body.pointer("/response/header"));
        ensure_success(header.result_code, header.result_msg, SUCCESS_CODES)
    }

    fn extract_items(&self, body: &Value) -> Vec<Value> {
        item_list(body.pointer("/response/body/items/item"))
    }

    fn parse_item(&self, item: &Value) -> Option<PlaceRecord> {
        if !item.is_object() {
            return None;
        }

        let external_id = text(item, "contentid");
        let name = text(item, "title");
        if external_id.is_none() && name.is_none() {
            return None;
        }

        let address = join_text(&[text(item, "addr1"), text(item, "addr2")]);
        let category = text(item, "contenttypeid")
            .map(|code| category_from_content_type(&code))
            .unwrap_or_default();

        let record = PlaceRecord::new(SourceApi::KorPetTour, external_id.unwrap_or_default(), item.clone())
            .with_name(name.unwrap_or_default())
            .with_category(category)
            .with_description(first_text(item, &["overview", "acmpyNeedMtr"]))
            .with_address(address)
            .with_coordinates(Self::coordinates(item))
            .with_phone(text(item, "tel"))
            .with_website(Self::website(item));

        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestionError;
    use crate::schemas::PlaceCategory;
    use serde_json::json;

    fn item(id: &str) -> Value {
        json!({
            "contentid": id,
            "contenttypeid": "32",
            "title": "멍멍 펜션",
            "addr1": "강원특별자치도 속초시 해오름로 1",
            "addr2": "(조양동)",
            "mapx": "128.5912",
            "mapy": "38.2070",
            "tel": "033-123-4567",
            "homepage": "<a href=\"https://pension.example.com\" target=\"_blank\">pension.example.com</a>"
        })
    }

    fn page(items: Value) -> Value {
        json!({
            "response": {
                "header": {"resultCode": "0000", "resultMsg": "OK"},
                "body": {"items": {"item": items}, "numOfRows": 10, "pageNo": 1, "totalCount": 1}
            }
        })
    }

    #[test]
    fn test_item_mapping() {
        let record = KorPetTourParser.parse_item(&item("125266")).unwrap();

        assert_eq!(record.external_id(), "125266");
        assert_eq!(record.name, "멍멍 펜션");
        assert_eq!(record.category, PlaceCategory::Lodging);
        assert_eq!(record.address.as_deref(), Some("강원특별자치도 속초시 해오름로 1 (조양동)"));
        assert_eq!(record.sido.as_deref(), Some("강원특별자치도"));
        assert_eq!(record.sigungu.as_deref(), Some("속초시"));
        assert_eq!(record.latitude, Some(38.2070));
        assert_eq!(record.longitude, Some(128.5912));
        assert_eq!(record.website.as_deref(), Some("https://pension.example.com"));
        assert_eq!(record.raw_payload(), &item("125266"));
    }

    #[test]
    fn test_single_object_equals_one_element_array() {
        let single = KorPetTourParser.parse_items(&page(item("1")));
        let wrapped = KorPetTourParser.parse_items(&page(json!([item("1")])));

        assert_eq!(single.records.len(), 1);
        assert_eq!(single.records, wrapped.records);
    }

    #[test]
    fn test_empty_items_string_is_empty_page() {
        let body = json!({
            "response": {
                "header": {"resultCode": "0000", "resultMsg": "OK"},
                "body": {"items": "", "numOfRows": 10, "pageNo": 4, "totalCount": 30}
            }
        });
        assert!(KorPetTourParser.check_envelope(&body).is_ok());
        assert!(KorPetTourParser.parse_items(&body).is_empty());
    }

    #[test]
    fn test_error_envelope() {
        let body = json!({
            "response": {"header": {"resultCode": "22", "resultMsg": "LIMITED_NUMBER_OF_SERVICE_REQUESTS_EXCEEDS_ERROR"}}
        });
        let err = KorPetTourParser.check_envelope(&body).unwrap_err();
        assert!(matches!(err, IngestionError::ApiError { ref code, .. } if code == "22"));

        let bare = json!({"resultCode": "30", "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR"});
        assert!(KorPetTourParser.check_envelope(&bare).is_err());
    }

    #[test]
    fn test_numeric_result_code_is_still_an_error() {
        let body = json!({
            "response": {"header": {"resultCode": 30, "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR"}}
        });
        let err = KorPetTourParser.check_envelope(&body).unwrap_err();
        assert!(matches!(err, IngestionError::ApiError { ref code, .. } if code == "30"));

        let bare = json!({"resultCode": 22, "resultMsg": "LIMITED_NUMBER_OF_SERVICE_REQUESTS_EXCEEDS_ERROR"});
        let err = KorPetTourParser.check_envelope(&bare).unwrap_err();
        assert!(matches!(err, IngestionError::ApiError { ref code, .. } if code == "22"));
    }

    #[test]
    fn test_unparseable_items_are_dropped() {
        let body = page(json!([item("1"), "garbage", {"cat1": "A01"}, item("2")]));
        let parsed = KorPetTourParser.parse_items(&body);

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.dropped, 2);
    }

    #[test]
    fn test_missing_content_id_gets_fallback() {
        let mut raw = item("");
        raw["contentid"] = json!("");
        let record = KorPetTourParser.parse_item(&raw).unwrap();
        assert!(record.external_id().starts_with("gen-"));
    }

    #[test]
    fn test_unknown_content_type_is_other() {
        let mut raw = item("9");
        raw["contenttypeid"] = json!("77");
        raw["mapx"] = json!("0");
        raw["mapy"] = json!("0");
        let record = KorPetTourParser.parse_item(&raw).unwrap();
        assert_eq!(record.category, PlaceCategory::Other);
        assert_eq!(record.latitude, None);
    }
}
