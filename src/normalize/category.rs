//! Source code / label to [`PlaceCategory`] lookup tables

use crate::schemas::PlaceCategory;

/// Tour API `contenttypeid` codes
const CONTENT_TYPE_CODES: &[(&str, PlaceCategory)] = &[
    ("12", PlaceCategory::TouristSite),
    ("14", PlaceCategory::Culture),
    ("15", PlaceCategory::Festival),
    ("25", PlaceCategory::TravelCourse),
    ("28", PlaceCategory::Leisure),
    ("32", PlaceCategory::Lodging),
    ("38", PlaceCategory::Shopping),
    ("39", PlaceCategory::Restaurant),
];

/// Keywords found in free-text category labels. Checked in order; the first
/// keyword contained in the label wins, so narrower terms come first.
const LABEL_KEYWORDS: &[(&str, PlaceCategory)] = &[
    ("동물병원", PlaceCategory::Hospital),
    ("동물약국", PlaceCategory::Pharmacy),
    ("약국", PlaceCategory::Pharmacy),
    ("병원", PlaceCategory::Hospital),
    ("미용", PlaceCategory::Grooming),
    ("위탁", PlaceCategory::PetCare),
    ("호텔", PlaceCategory::Lodging),
    ("펜션", PlaceCategory::Lodging),
    ("숙박", PlaceCategory::Lodging),
    ("캠핑", PlaceCategory::Lodging),
    ("카페", PlaceCategory::Cafe),
    ("식당", PlaceCategory::Restaurant),
    ("음식점", PlaceCategory::Restaurant),
    ("용품", PlaceCategory::PetSupplies),
    ("미술관", PlaceCategory::Culture),
    ("박물관", PlaceCategory::Culture),
    ("문예회관", PlaceCategory::Culture),
    ("문화", PlaceCategory::Culture),
    ("공원", PlaceCategory::Park),
    ("놀이터", PlaceCategory::Park),
    ("여행지", PlaceCategory::TouristSite),
    ("관광", PlaceCategory::TouristSite),
    ("레포츠", PlaceCategory::Leisure),
    ("쇼핑", PlaceCategory::Shopping),
];

/// Maps a numeric content-type code. Unknown or blank codes map to `Other`.
pub fn category_from_content_type(code: &str) -> PlaceCategory {
    let code = code.trim();
    CONTENT_TYPE_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, category)| *category)
        .unwrap_or(PlaceCategory::Other)
}

/// Maps a free-text label by keyword. Unmatched labels map to `Other`.
pub fn category_from_label(label: &str) -> PlaceCategory {
    LABEL_KEYWORDS
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(PlaceCategory::Other)
}

/// First label in `labels` that maps to something other than `Other`
pub fn category_from_labels<'a, I>(labels: I) -> PlaceCategory
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .map(category_from_label)
        .find(|category| *category != PlaceCategory::Other)
        .unwrap_or(PlaceCategory::Other)
}
