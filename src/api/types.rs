use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Geographic and identity metadata the API attaches to a country record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CountryInfo {
    #[serde(default)]
    pub iso2: Option<String>,
    #[serde(default)]
    pub iso3: Option<String>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub long: f64,
    #[serde(default)]
    pub flag: Option<String>,
}

/// Point-in-time counts for one country, or for the whole world when the
/// country fields are absent (the `/all` payload).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_info: Option<CountryInfo>,
    #[serde(default)]
    pub continent: Option<String>,
    /// Epoch milliseconds of the upstream refresh
    #[serde(default)]
    pub updated: Option<i64>,
    #[serde(default)]
    pub cases: u64,
    /// Daily and current figures can go negative when upstream revises
    /// its totals downward
    #[serde(default)]
    pub today_cases: Option<i64>,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub today_deaths: Option<i64>,
    #[serde(default)]
    pub recovered: u64,
    #[serde(default)]
    pub today_recovered: Option<i64>,
    #[serde(default)]
    pub active: Option<i64>,
    #[serde(default)]
    pub critical: Option<i64>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub affected_countries: Option<u32>,
}

impl Snapshot {
    /// Display name: the country, or "Worldwide" for the aggregate
    pub fn name(&self) -> &str {
        self.country.as_deref().unwrap_or("Worldwide")
    }

    /// Code usable against the per-country endpoint.
    /// Falls back to the country name for records without an ISO2 code
    /// (cruise ships and the like), which the API also accepts.
    pub fn code(&self) -> Option<&str> {
        self.country_info
            .as_ref()
            .and_then(|info| info.iso2.as_deref())
            .or(self.country.as_deref())
    }

    /// (lat, lon) of the country centroid, if known
    pub fn coords(&self) -> Option<(f64, f64)> {
        self.country_info.as_ref().map(|info| (info.lat, info.long))
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated.and_then(DateTime::from_timestamp_millis)
    }
}

/// Cumulative daily counts keyed by `M/D/YY` dates, as served by
/// `/historical/all`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub cases: HashMap<String, u64>,
    #[serde(default)]
    pub deaths: HashMap<String, u64>,
    #[serde(default)]
    pub recovered: HashMap<String, u64>,
}

/// Parse the API's `M/D/YY` date keys into a date-ordered series.
/// Keys that fail to parse are skipped.
pub fn ordered_series(raw: &HashMap<String, u64>) -> BTreeMap<NaiveDate, u64> {
    raw.iter()
        .filter_map(|(key, &value)| {
            NaiveDate::parse_from_str(key, "%m/%d/%y")
                .ok()
                .map(|date| (date, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_country_payload() {
        let mut body = br#"{
            "updated": 1700000000000,
            "country": "Afghanistan",
            "countryInfo": {"_id": 4, "iso2": "AF", "iso3": "AFG", "lat": 33, "long": 65, "flag": "https://disease.sh/assets/img/flags/af.png"},
            "cases": 230000, "todayCases": 12, "deaths": 7900, "todayDeaths": 0,
            "recovered": 211000, "todayRecovered": 3, "active": 11000, "critical": 0,
            "casesPerOneMillion": 5580.2, "population": 41000000, "continent": "Asia"
        }"#
        .to_vec();

        let snap: Snapshot = simd_json::serde::from_slice(&mut body).unwrap();
        assert_eq!(snap.name(), "Afghanistan");
        assert_eq!(snap.code(), Some("AF"));
        assert_eq!(snap.coords(), Some((33.0, 65.0)));
        assert_eq!(snap.cases, 230_000);
        assert_eq!(snap.today_recovered, Some(3));
        assert_eq!(snap.continent.as_deref(), Some("Asia"));
        assert!(snap.updated_at().is_some());
    }

    #[test]
    fn test_decode_global_payload() {
        let mut body = br#"{"updated": 1700000000000, "cases": 700000000, "todayCases": 100,
            "deaths": 7000000, "recovered": 670000000, "affectedCountries": 231}"#
            .to_vec();

        let snap: Snapshot = simd_json::serde::from_slice(&mut body).unwrap();
        assert_eq!(snap.name(), "Worldwide");
        assert_eq!(snap.code(), None);
        assert_eq!(snap.coords(), None);
        assert_eq!(snap.affected_countries, Some(231));
        assert_eq!(snap.today_deaths, None);
    }

    #[test]
    fn test_negative_counts_keep_country_list() {
        let mut body = br#"[
            {"country": "Aland", "countryInfo": {"iso2": "AX", "lat": 60, "long": 20},
             "cases": 100, "todayCases": 4, "deaths": 1, "recovered": 90, "todayRecovered": 2, "active": 9},
            {"country": "Borduria", "countryInfo": {"iso2": "BQ", "lat": 45, "long": 25},
             "cases": 50, "todayCases": 0, "deaths": 2, "recovered": 40, "todayRecovered": -3,
             "active": -2, "critical": -1}
        ]"#
        .to_vec();

        let list: Vec<Snapshot> = simd_json::serde::from_slice(&mut body).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].today_recovered, Some(2));
        assert_eq!(list[1].name(), "Borduria");
        assert_eq!(list[1].today_recovered, Some(-3));
        assert_eq!(list[1].active, Some(-2));
        assert_eq!(list[1].critical, Some(-1));
        assert_eq!(list[1].recovered, 40);
    }

    #[test]
    fn test_code_falls_back_to_name() {
        let mut body = br#"{"country": "MS Zaandam", "countryInfo": {"_id": null, "iso2": null, "iso3": null, "lat": 0, "long": 0},
            "cases": 9, "deaths": 2, "recovered": 7}"#
            .to_vec();

        let snap: Snapshot = simd_json::serde::from_slice(&mut body).unwrap();
        assert_eq!(snap.code(), Some("MS Zaandam"));
    }

    #[test]
    fn test_ordered_series_sorts_by_date_not_text() {
        let raw: HashMap<String, u64> = [
            ("1/9/23".to_string(), 30),
            ("1/10/23".to_string(), 40),
            ("12/31/22".to_string(), 10),
            ("garbage".to_string(), 99),
        ]
        .into_iter()
        .collect();

        let series = ordered_series(&raw);
        let values: Vec<u64> = series.values().copied().collect();
        assert_eq!(values, vec![10, 30, 40]);
    }
}
