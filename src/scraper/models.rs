use serde::Deserialize;
use serde_json::Value;

// One row as exported by the external scraper.
//
// row
//  ├── url            (falls back to id)
//  ├── address
//  ├── postal_code    (aliases: zip_code)
//  ├── price          "€ 350.000 k.k." | 350000
//  ├── living_area    "75 m²" | 75
//  ├── room           "3 kamers" | 3
//  ├── bedroom
//  ├── energy_label
//  └── year_built     (aliases: year)
//
// Numeric columns arrive as either numbers or display strings, so they are
// kept as raw JSON here and normalised in `domain::listing`. A row that does
// not deserialize at all is kept with `rejected` set so it counts as invalid.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapedRow {
    pub url: Option<String>,
    pub id: Option<String>,
    pub address: Option<String>,
    #[serde(alias = "zip_code")]
    pub postal_code: Option<String>,

    pub price: Option<Value>,
    pub living_area: Option<Value>,
    #[serde(alias = "num_of_rooms", alias = "room_count")]
    pub room: Option<Value>,
    #[serde(alias = "num_of_bedrooms", alias = "bedroom_count")]
    pub bedroom: Option<Value>,
    pub energy_label: Option<String>,
    #[serde(alias = "year")]
    pub year_built: Option<Value>,

    #[serde(skip)]
    pub rejected: Option<String>,
}

impl ScrapedRow {
    /// A placeholder for a row that could not be read.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            rejected: Some(reason.into()),
            ..Default::default()
        }
    }

    /// The listing url; `url` wins over `id` when both are present.
    pub fn listing_url(&self) -> Option<&str> {
        [self.url.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Reads an integer out of a scraped cell.
///
/// Accepts plain numbers and display strings; the first run of digits wins
/// and `.`/`,` are dropped when they group thousands ("350.000" -> 350000).
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

fn parse_int_str(s: &str) -> Option<i64> {
    let chars: Vec<char> = s.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;

    let mut digits = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            digits.push(c);
            i += 1;
        } else if (c == '.' || c == ',') && is_thousands_group(&chars[i + 1..]) {
            i += 1;
        } else {
            break;
        }
    }

    digits.parse().ok()
}

fn is_thousands_group(rest: &[char]) -> bool {
    rest.len() >= 3
        && rest[..3].iter().all(|c| c.is_ascii_digit())
        && rest.get(3).map_or(true, |c| !c.is_ascii_digit())
}
