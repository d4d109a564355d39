//! Seoul Metropolitan Government open API
//!
//! Bodies look like `{"<SERVICE>": {"list_total_count": n, "RESULT": {...}, "row": [...]}}`.
//! Failures come back as `{"RESULT": {"CODE": "INFO-100", "MESSAGE": "..."}}`,
//! either at the top level or inside the service object. `INFO-200` means
//! "no data" and marks the end of the result set.
//!
//! Positions are planar `X`/`Y` values converted with the fixed linear scale in
//! [`crate::normalize::coords`]; when a dataset carries `LAT`/`LNG` those win.

use serde_json::Value;

use super::{ensure_success, SourceParser};
use crate::error::Result;
use crate::normalize::{
    category_from_labels, first_entry, first_text, item_list, number, planar_to_wgs84, text, wgs84,
};
use crate::schemas::{PlaceRecord, SourceApi};

const SUCCESS_CODES: &[&str] = &["INFO-000", "INFO-200"];
const NO_DATA_CODE: &str = "INFO-200";

const ID_FIELDS: &[&str] = &["MGTNO", "ID", "SN"];
const NAME_FIELDS: &[&str] = &["BPLCNM", "FCLTY_NM", "NM", "NAME"];
const ADDRESS_FIELDS: &[&str] = &["RDNWHLADDR", "SITEWHLADDR", "ADDR", "ADRES"];
const CATEGORY_FIELDS: &[&str] = &["UPTAENM", "SNTUPTAENM", "CATEGORY"];

#[derive(Debug)]
struct ServiceResult {
    code: Option<String>,
    message: Option<String>,
}

fn service_result(node: Option<&Value>) -> Option<ServiceResult> {
    let result = node.and_then(|v| v.get("RESULT"))?;
    Some(ServiceResult {
        code: text(result, "CODE"),
        message: text(result, "MESSAGE"),
    })
}

pub struct SeoulOpenApiParser;

impl SeoulOpenApiParser {
    /// True when the body reports the "no data" code
    pub fn is_no_data(body: &Value) -> bool {
        [service_result(Some(body)), service_result(first_entry(body))]
            .into_iter()
            .flatten()
            .any(|result| result.code.as_deref() == Some(NO_DATA_CODE))
    }

    fn coordinates(item: &Value) -> Option<(f64, f64)> {
        if let (Some(latitude), Some(longitude)) = (number(item, "LAT"), number(item, "LNG")) {
            return wgs84(latitude, longitude);
        }
        let x = number(item, "X")?;
        let y = number(item, "Y")?;
        planar_to_wgs84(x, y)
    }
}

impl SourceParser for SeoulOpenApiParser {
    fn source_api(&self) -> SourceApi {
        SourceApi::SeoulOpenApi
    }

    fn check_envelope(&self, body: &Value) -> Result<()> {
        for result in [service_result(Some(body)), service_result(first_entry(body))]
            .into_iter()
            .flatten()
        {
            ensure_success(result.code, result.message, SUCCESS_CODES)?;
        }
        Ok(())
    }

    fn extract_items(&self, body: &Value) -> Vec<Value> {
        if Self::is_no_data(body) {
            return Vec::new();
        }
        item_list(first_entry(body).and_then(|service| service.get("row")))
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

        let record = PlaceRecord::new(SourceApi::SeoulOpenApi, external_id.unwrap_or_default(), item.clone())
            .with_name(name.unwrap_or_default())
            .with_category(category_from_labels(labels.iter().map(String::as_str)))
            .with_address(first_text(item, ADDRESS_FIELDS))
            .with_coordinates(Self::coordinates(item))
            .with_phone(first_text(item, &["SITETEL", "TELNO", "TEL"]))
            .with_website(first_text(item, &["HMPG_URL", "HOMEPAGE"]));

        Some(record)
    }
}
