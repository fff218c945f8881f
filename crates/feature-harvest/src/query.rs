//! Search URL construction.

use url::Url;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, HarvestResult};
use crate::types::{Query, SearchTerm};

/// Name of the query parameter carrying the search text. Always appended last.
pub const SEARCH_TEXT_PARAM: &str = "searchText";

/// Builds one [`Query`] per term against a fixed endpoint.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    /// Endpoint with every fixed parameter already applied.
    prefix: Url,
}

impl QueryBuilder {
    /// Prepare the fixed part of every search URL.
    ///
    /// Parameters already present on the base URL win; the configured
    /// selectors are only added when missing.
    pub fn new(config: &HarvestConfig) -> HarvestResult<Self> {
        let mut prefix = Url::parse(config.base_url.trim())
            .map_err(|e| HarvestError::Config(format!("invalid base URL '{}': {e}", config.base_url)))?;

        if prefix.cannot_be_a_base() {
            return Err(HarvestError::Config(format!(
                "base URL '{}' cannot carry query parameters",
                config.base_url
            )));
        }

        let existing: Vec<(String, String)> = prefix
            .query_pairs()
            .filter(|(k, _)| k != SEARCH_TEXT_PARAM && k != "contains")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let has = |name: &str| existing.iter().any(|(k, _)| k == name);

        let mut additions: Vec<(&str, String)> = Vec::new();
        if let Some(layers) = &config.layers {
            if !has("layers") {
                additions.push(("layers", layers.clone()));
            }
        }
        if let Some(fields) = &config.search_fields {
            if !has("searchFields") {
                additions.push(("searchFields", fields.clone()));
            }
        }
        if !has("returnGeometry") {
            additions.push(("returnGeometry", "true".to_string()));
        }
        if !has("f") {
            additions.push(("f", config.format.clone()));
        }
        if let Some(sr) = config.out_sr {
            if !has("sr") {
                additions.push(("sr", sr.to_string()));
            }
        }
        if let Some(contains) = config.contains {
            additions.push(("contains", contains.to_string()));
        }

        {
            let mut pairs = prefix.query_pairs_mut();
            pairs.clear();
            for (k, v) in &existing {
                pairs.append_pair(k, v);
            }
            for (k, v) in &additions {
                pairs.append_pair(k, v);
            }
        }

        Ok(Self { prefix })
    }

    /// Build the search URL for one term.
    pub fn build(&self, term: &str) -> Query {
        let mut url = self.prefix.clone();
        url.query_pairs_mut().append_pair(SEARCH_TEXT_PARAM, term);
        Query {
            term: term.to_string(),
            url,
        }
    }

    /// Build one query per term, in input order.
    pub fn build_all(&self, terms: &[SearchTerm]) -> Vec<Query> {
        terms.iter().map(|t| self.build(t)).collect()
    }

    /// The URL every query starts from.
    pub fn prefix(&self) -> &Url {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> HarvestConfig {
        HarvestConfig {
            base_url: base.to_string(),
            ..HarvestConfig::default()
        }
    }

    #[test]
    fn test_search_text_is_last_and_encoded() {
        let builder = QueryBuilder::new(&config("http://svc.test/MapServer/find")).unwrap();
        let q = builder.build("Endau Rompin & Co");
        assert_eq!(q.term, "Endau Rompin & Co");

        let pairs: Vec<(String, String)> = q
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs.last().unwrap(),
            &("searchText".to_string(), "Endau Rompin & Co".to_string())
        );
        assert!(q.url.as_str().ends_with("searchText=Endau+Rompin+%26+Co"));
        assert!(pairs.contains(&("returnGeometry".into(), "true".into())));
        assert!(pairs.contains(&("contains".into(), "true".into())));
        assert!(pairs.contains(&("f".into(), "json".into())));
    }

    #[test]
    fn test_existing_parameters_kept() {
        let builder = QueryBuilder::new(&HarvestConfig {
            base_url: "http://svc.test/MapServer/find?layers=1&returnGeometry=true&f=pjson"
                .to_string(),
            layers: Some("0".to_string()),
            ..HarvestConfig::default()
        })
        .unwrap();
        let q = builder.build("Banff");
        assert_eq!(
            q.url.as_str(),
            "http://svc.test/MapServer/find?layers=1&returnGeometry=true&f=pjson&contains=true&searchText=Banff"
        );
    }

    #[test]
    fn test_contains_toggle() {
        let builder = QueryBuilder::new(&HarvestConfig {
            contains: Some(false),
            ..config("http://svc.test/find")
        })
        .unwrap();
        assert!(builder.build("x").url.as_str().contains("contains=false"));

        let builder = QueryBuilder::new(&HarvestConfig {
            contains: None,
            ..config("http://svc.test/find")
        })
        .unwrap();
        assert!(!builder.build("x").url.as_str().contains("contains"));
    }

    #[test]
    fn test_selectors_and_spatial_reference() {
        let builder = QueryBuilder::new(&HarvestConfig {
            layers: Some("1".to_string()),
            search_fields: Some("NAME,ORIG_NAME".to_string()),
            out_sr: Some(3857),
            ..config("https://svc.test/find")
        })
        .unwrap();
        let url = builder.build("Kruger").url;
        let s = url.as_str();
        assert!(s.contains("layers=1"));
        assert!(s.contains("searchFields=NAME%2CORIG_NAME"));
        assert!(s.contains("sr=3857"));
    }

    #[test]
    fn test_one_query_per_term() {
        let builder = QueryBuilder::new(&config("http://svc.test/find")).unwrap();
        let terms = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let queries = builder.build_all(&terms);
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[2].term, "a");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = QueryBuilder::new(&config("not a url")).unwrap_err();
        assert!(err.is_fatal());
        let err = QueryBuilder::new(&config("mailto:someone@example.com")).unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
