//! Best-effort decomposition of free-text Korean addresses into
//! province/metro (`sido`) and city/county/district (`sigungu`).

use once_cell::sync::Lazy;
use regex::Regex;

/// Accepted first-level region stems and the official name each expands to.
/// Long-form stems (e.g. `충청북`) sit next to their abbreviations so both
/// spellings found in upstream data resolve to the same name.
const PROVINCE_STEMS: &[(&str, &str)] = &[
    ("서울", "서울특별시"),
    ("부산", "부산광역시"),
    ("대구", "대구광역시"),
    ("인천", "인천광역시"),
    ("광주", "광주광역시"),
    ("대전", "대전광역시"),
    ("울산", "울산광역시"),
    ("세종", "세종특별자치시"),
    ("경기", "경기도"),
    ("강원", "강원특별자치도"),
    ("충북", "충청북도"),
    ("충청북", "충청북도"),
    ("충남", "충청남도"),
    ("충청남", "충청남도"),
    ("전북", "전북특별자치도"),
    ("전라북", "전북특별자치도"),
    ("전남", "전라남도"),
    ("전라남", "전라남도"),
    ("경북", "경상북도"),
    ("경상북", "경상북도"),
    ("경남", "경상남도"),
    ("경상남", "경상남도"),
    ("제주", "제주특별자치도"),
];

/// Stems whose bare `<stem>시` form is also a city inside another province
/// (경기 광주시, 제주특별자치도 제주시), so `시` alone does not make them a sido
const AMBIGUOUS_CITY_STEMS: &[&str] = &["광주", "제주"];

/// `<stem><official suffix?><glued sigungu?>`, e.g. `서울`, `충청북도`, `서울특별시강남구`
static PROVINCE_RE: Lazy<Regex> = Lazy::new(|| {
    let mut stems: Vec<&str> = PROVINCE_STEMS.iter().map(|(stem, _)| *stem).collect();
    // Longest first so `충청북` wins over any shorter prefix
    stems.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    Regex::new(&format!(
        r"^({})(특별자치시|특별자치도|특별시|광역시|도|시)?(\S*)$",
        stems.join("|")
    ))
    .expect("province pattern is valid")
});

static SIGUNGU_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[가-힣]+[시군구]$").expect("sigungu pattern is valid"));

/// Expands a province stem to its official name
pub fn expand_province(stem: &str) -> Option<&'static str> {
    PROVINCE_STEMS
        .iter()
        .find(|(s, _)| *s == stem)
        .map(|(_, full)| *full)
}

/// A token naming a province, with whatever district was glued onto it
struct ProvinceToken<'a> {
    sido: &'static str,
    glued_sigungu: Option<&'a str>,
}

fn province_token(token: &str) -> Option<ProvinceToken<'_>> {
    let caps = PROVINCE_RE.captures(token)?;
    let stem = caps.get(1)?.as_str();
    let suffix = caps.get(2).map(|m| m.as_str());
    let rest = caps.get(3).map_or("", |m| m.as_str());

    if suffix == Some("시") && AMBIGUOUS_CITY_STEMS.contains(&stem) {
        return None;
    }
    if !rest.is_empty() && !SIGUNGU_RE.is_match(rest) {
        return None;
    }

    Some(ProvinceToken {
        sido: expand_province(stem)?,
        glued_sigungu: (!rest.is_empty()).then_some(rest),
    })
}

/// Splits an address into `(sido, sigungu)`. Either side is `None` when no
/// pattern matches; this never fails.
///
/// The province may sit behind a leading postal code and may have the
/// district glued on (`서울특별시강남구`). A district is only looked for after
/// the province token, and never in a token that itself names a province.
pub fn decompose_address(address: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = address.split_whitespace().collect();

    let province = tokens
        .iter()
        .enumerate()
        .find_map(|(idx, token)| province_token(token).map(|p| (idx, p)));

    let (sido, glued, rest) = match province {
        Some((idx, p)) => (Some(p.sido), p.glued_sigungu, &tokens[idx + 1..]),
        None => (None, None, &tokens[..]),
    };

    let sigungu = glued.or_else(|| {
        rest.iter()
            .copied()
            .find(|token| SIGUNGU_RE.is_match(token) && province_token(token).is_none())
    });

    (sido.map(str::to_string), sigungu.map(str::to_string))
}
