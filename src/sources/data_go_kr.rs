//! data.go.kr standard datasets
//!
//! The item array sits under the first key of the body, then the first key of
//! that object (for example `{"data": {"list": [...]}}`). Field names are the
//! Korean column headings of the published dataset.

use serde_json::Value;

use super::{ensure_success, SourceParser};
use crate::error::Result;
use crate::normalize::{category_from_labels, first_entry, first_text, item_list, number, wgs84};
use crate::schemas::{PlaceRecord, SourceApi};

const SUCCESS_CODES: &[&str] = &["0", "00", "0000", "OK"];

const ID_FIELDS: &[&str] = &["관리번호", "시설ID", "id", "ID", "번호", "연번"];
const NAME_FIELDS: &[&str] = &["시설명", "업소명", "상호명", "name"];
const CATEGORY_FIELDS: &[&str] = &["카테고리3", "카테고리2", "카테고리1", "업종", "분류"];
const ADDRESS_FIELDS: &[&str] = &["도로명주소", "소재지도로명주소", "지번주소", "소재지지번주소", "주소"];
const DESCRIPTION_FIELDS: &[&str] = &["기본 정보_장소설명", "장소설명", "설명"];
const PHONE_FIELDS: &[&str] = &["전화번호", "연락처"];
const WEBSITE_FIELDS: &[&str] = &["홈페이지", "홈페이지주소"];

pub struct DataGoKrParser;

impl DataGoKrParser {
    fn coordinates(item: &Value) -> Option<(f64, f64)> {
        let latitude = number(item, "위도")?;
        let longitude = number(item, "경도")?;
        wgs84(latitude, longitude)
    }
}

impl SourceParser for DataGoKrParser {
    fn source_api(&self) -> SourceApi {
        SourceApi::DataGoKr
    }

    fn check_envelope(&self, body: &Value) -> Result<()> {
        // Gateway style: {"resultCode": "30", "resultMsg": "..."} or nested under header
        let header = body.pointer("/response/header");
        let code = first_text(body, &["resultCode"])
            .or_else(|| header.and_then(|h| first_text(h, &["resultCode"])));
        let message = first_text(body, &["resultMsg"])
            .or_else(|| header.and_then(|h| first_text(h, &["resultMsg"])));
        ensure_success(code, message, SUCCESS_CODES)?;

        // Open-data cloud style: {"code": -4, "msg": "..."}, negative codes are failures
        if let Some(code) = body.get("code").and_then(Value::as_i64) {
            if code < 0 {
                return ensure_success(
                    Some(code.to_string()),
                    first_text(body, &["msg", "message"]),
                    SUCCESS_CODES,
                );
            }
        }
        Ok(())
    }

    fn extract_items(&self, body: &Value) -> Vec<Value> {
        item_list(first_entry(body).and_then(first_entry))
    }

    fn parse_item(&self, item: &Value) -> Option<PlaceRecord> {
        if !item.is_object() {
            return None;
        }

        let external_id = first_text(item, ID_FIELDS);
        let name = first_text(item, NAME_FIELDS);
        if external_id.is_none() && name.is_none() {
            return None;
        }

        let labels: Vec<String> = CATEGORY_FIELDS
            .iter()
            .filter_map(|field| first_text(item, &[*field]))
            .collect();
        let category = category_from_labels(labels.iter().map(String::as_str));

        let record = PlaceRecord::new(SourceApi::DataGoKr, external_id.unwrap_or_default(), item.clone())
            .with_name(name.unwrap_or_default())
            .with_category(category)
            .with_description(first_text(item, DESCRIPTION_FIELDS))
            .with_address(first_text(item, ADDRESS_FIELDS))
            .with_region_fallback(first_text(item, &["시도 명칭", "시도명"]), first_text(item, &["시군구 명칭", "시군구명"]))
            .with_coordinates(Self::coordinates(item))
            .with_phone(first_text(item, PHONE_FIELDS))
            .with_website(first_text(item, WEBSITE_FIELDS));

        Some(record)
    }
}
