//! Common Schema Primitives
//!
//! Shared enumerations used across the place schemas

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IngestionError;

// ============================================
// SOURCE IDENTIFIERS
// ============================================

/// Upstream public-data integration that produced a record.
///
/// The string form is persisted as `source_api` and is half of the identity key,
/// so the values must never change once records exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceApi {
    /// Korea Tourism Organization pet-friendly travel service
    #[serde(rename = "kor-pet-tour")]
    KorPetTour,
    /// Standard datasets published through the data.go.kr gateway
    #[serde(rename = "data.go.kr")]
    DataGoKr,
    /// Seoul Metropolitan Government open API
    #[serde(rename = "seoul-open-api")]
    SeoulOpenApi,
}

impl SourceApi {
    /// All sources in the order the harvester visits them
    pub const ALL: [SourceApi; 3] = [
        SourceApi::KorPetTour,
        SourceApi::DataGoKr,
        SourceApi::SeoulOpenApi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceApi::KorPetTour => "kor-pet-tour",
            SourceApi::DataGoKr => "data.go.kr",
            SourceApi::SeoulOpenApi => "seoul-open-api",
        }
    }
}

impl fmt::Display for SourceApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceApi {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kor-pet-tour" | "korpettour" | "pet-tour" => Ok(SourceApi::KorPetTour),
            "data.go.kr" | "data-go-kr" | "datagokr" => Ok(SourceApi::DataGoKr),
            "seoul-open-api" | "seoul" => Ok(SourceApi::SeoulOpenApi),
            other => Err(IngestionError::SourceNotConfigured(other.to_string())),
        }
    }
}

// ============================================
// CATEGORIES
// ============================================

/// Normalized place category. Unmapped upstream codes land on `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    TouristSite,
    Culture,
    Festival,
    TravelCourse,
    Leisure,
    Lodging,
    Shopping,
    Restaurant,
    Cafe,
    Hospital,
    Pharmacy,
    Grooming,
    PetCare,
    PetSupplies,
    Park,
    #[default]
    Other,
}

impl PlaceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::TouristSite => "tourist_site",
            PlaceCategory::Culture => "culture",
            PlaceCategory::Festival => "festival",
            PlaceCategory::TravelCourse => "travel_course",
            PlaceCategory::Leisure => "leisure",
            PlaceCategory::Lodging => "lodging",
            PlaceCategory::Shopping => "shopping",
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::Cafe => "cafe",
            PlaceCategory::Hospital => "hospital",
            PlaceCategory::Pharmacy => "pharmacy",
            PlaceCategory::Grooming => "grooming",
            PlaceCategory::PetCare => "pet_care",
            PlaceCategory::PetSupplies => "pet_supplies",
            PlaceCategory::Park => "park",
            PlaceCategory::Other => "other",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceCategory {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = match s.trim() {
            "tourist_site" => PlaceCategory::TouristSite,
            "culture" => PlaceCategory::Culture,
            "festival" => PlaceCategory::Festival,
            "travel_course" => PlaceCategory::TravelCourse,
            "leisure" => PlaceCategory::Leisure,
            "lodging" => PlaceCategory::Lodging,
            "shopping" => PlaceCategory::Shopping,
            "restaurant" => PlaceCategory::Restaurant,
            "cafe" => PlaceCategory::Cafe,
            "hospital" => PlaceCategory::Hospital,
            "pharmacy" => PlaceCategory::Pharmacy,
            "grooming" => PlaceCategory::Grooming,
            "pet_care" => PlaceCategory::PetCare,
            "pet_supplies" => PlaceCategory::PetSupplies,
            "park" => PlaceCategory::Park,
            "other" => PlaceCategory::Other,
            other => return Err(IngestionError::ParseError(format!("unknown category: {}", other))),
        };
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_api_serialization() {
        let json = serde_json::to_string(&SourceApi::DataGoKr).unwrap();
        assert_eq!(json, "\"data.go.kr\"");

        let parsed: SourceApi = serde_json::from_str("\"kor-pet-tour\"").unwrap();
        assert_eq!(parsed, SourceApi::KorPetTour);
    }

    #[test]
    fn test_source_api_from_str() {
        assert_eq!("seoul".parse::<SourceApi>().unwrap(), SourceApi::SeoulOpenApi);
        assert_eq!("Data.Go.Kr".parse::<SourceApi>().unwrap(), SourceApi::DataGoKr);
        assert!("unknown".parse::<SourceApi>().is_err());

        for api in SourceApi::ALL {
            assert_eq!(api.as_str().parse::<SourceApi>().unwrap(), api);
        }
    }

    #[test]
    fn test_category_strings_round_trip() {
        let json = serde_json::to_string(&PlaceCategory::TouristSite).unwrap();
        assert_eq!(json, "\"tourist_site\"");
        assert_eq!("pet_care".parse::<PlaceCategory>().unwrap(), PlaceCategory::PetCare);
        assert_eq!(PlaceCategory::default(), PlaceCategory::Other);
    }
}
