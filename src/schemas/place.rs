//! Place Schema
//!
//! The canonical place record every source converges to, plus the identity key
//! used for merge decisions and the insert shape produced by the writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::common::{PlaceCategory, SourceApi};
use crate::normalize::{decompose_address, fallback_external_id};

/// `(source_api, external_id)`: the sole identity used for new/existing decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct IdentityKey {
    pub source_api: SourceApi,
    pub external_id: String,
}

impl IdentityKey {
    pub fn new(source_api: SourceApi, external_id: impl Into<String>) -> Self {
        Self {
            source_api,
            external_id: external_id.into(),
        }
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source_api, self.external_id)
    }
}

/// Normalized place produced by a source parser.
///
/// `external_id` and `raw_payload` are fixed at construction: the identity key is
/// always well-formed and the upstream item is kept as received.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    external_id: String,
    source_api: SourceApi,
    raw_payload: Value,
    pub name: String,
    pub category: PlaceCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sido: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigungu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl PlaceRecord {
    /// Creates a record with empty descriptive fields.
    /// A blank `external_id` is replaced by a fallback derived from the payload.
    pub fn new(source_api: SourceApi, external_id: impl Into<String>, raw_payload: Value) -> Self {
        let external_id = external_id.into().trim().to_string();
        let external_id = if external_id.is_empty() {
            fallback_external_id(&raw_payload)
        } else {
            external_id
        };

        Self {
            external_id,
            source_api,
            raw_payload,
            name: String::new(),
            category: PlaceCategory::Other,
            description: None,
            address: None,
            sido: None,
            sigungu: None,
            latitude: None,
            longitude: None,
            phone: None,
            website: None,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn source_api(&self) -> SourceApi {
        self.source_api
    }

    pub fn raw_payload(&self) -> &Value {
        &self.raw_payload
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(self.source_api, self.external_id.clone())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into().trim().to_string();
        self
    }

    pub fn with_category(mut self, category: PlaceCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the address and derives `sido`/`sigungu` from it
    pub fn with_address(mut self, address: Option<String>) -> Self {
        let (sido, sigungu) = match address.as_deref() {
            Some(addr) => decompose_address(addr),
            None => (None, None),
        };
        self.address = address;
        self.sido = sido;
        self.sigungu = sigungu;
        self
    }

    /// Province/district reported by the upstream directly; fills only what the
    /// address decomposition left empty
    pub fn with_region_fallback(mut self, sido: Option<String>, sigungu: Option<String>) -> Self {
        if self.sido.is_none() {
            self.sido = sido;
        }
        if self.sigungu.is_none() {
            self.sigungu = sigungu;
        }
        self
    }

    pub fn with_coordinates(mut self, coords: Option<(f64, f64)>) -> Self {
        if let Some((lat, lng)) = coords {
            self.latitude = Some(lat);
            self.longitude = Some(lng);
        }
        self
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }

    pub fn with_website(mut self, website: Option<String>) -> Self {
        self.website = website;
        self
    }
}

/// Insert shape: a candidate plus the identity and slug generated for it
#[derive(Debug, Clone)]
pub struct NewPlace {
    pub id: Uuid,
    pub slug: String,
    pub record: PlaceRecord,
    pub collected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_external_id_gets_fallback() {
        let raw = json!({"title": "Somewhere"});
        let a = PlaceRecord::new(SourceApi::KorPetTour, "  ", raw.clone());
        let b = PlaceRecord::new(SourceApi::KorPetTour, "", raw);

        assert!(a.external_id().starts_with("gen-"));
        assert_eq!(a.external_id(), b.external_id());
    }

    #[test]
    fn test_address_derives_region() {
        let record = PlaceRecord::new(SourceApi::DataGoKr, "1", json!({}))
            .with_address(Some("서울특별시 강남구 테헤란로 152".to_string()));

        assert_eq!(record.sido.as_deref(), Some("서울특별시"));
        assert_eq!(record.sigungu.as_deref(), Some("강남구"));
    }

    #[test]
    fn test_region_fallback_does_not_override() {
        let record = PlaceRecord::new(SourceApi::DataGoKr, "1", json!({}))
            .with_address(Some("부산 해운대구 우동".to_string()))
            .with_region_fallback(Some("서울특별시".to_string()), Some("종로구".to_string()));

        assert_eq!(record.sido.as_deref(), Some("부산광역시"));
        assert_eq!(record.sigungu.as_deref(), Some("해운대구"));
    }

    #[test]
    fn test_identity_key() {
        let record = PlaceRecord::new(SourceApi::SeoulOpenApi, "A-1", json!({}));
        assert_eq!(record.identity_key(), IdentityKey::new(SourceApi::SeoulOpenApi, "A-1"));
        assert_eq!(record.identity_key().to_string(), "seoul-open-api/A-1");
    }
}
