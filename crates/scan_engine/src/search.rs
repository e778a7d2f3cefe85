use serde::{Deserialize, Serialize};
use url::Url;

use crate::ScanError;

/// One search: keyword, location text and radius.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: String,
    pub radius: u32,
}

/// A job board the scan can run against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Provider {
    pub name: String,
    pub base_url: String,
    pub search_path: String,
    pub keyword_param: String,
    pub location_param: String,
    pub radius_param: String,
    /// Appended verbatim after the query parameters, e.g. newest-first sorting.
    pub extra_params: Vec<(String, String)>,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            name: "simplyhired".to_string(),
            base_url: "https://www.simplyhired.ca".to_string(),
            search_path: "/search".to_string(),
            keyword_param: "q".to_string(),
            location_param: "l".to_string(),
            radius_param: "w".to_string(),
            extra_params: vec![("so".to_string(), "d".to_string())],
        }
    }
}

impl Provider {
    pub fn base_url(&self) -> Result<Url, ScanError> {
        let url = Url::parse(&self.base_url)
            .map_err(|err| ScanError::Config(format!("base url {:?}: {err}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScanError::Config(format!(
                "base url {:?} is not http(s)",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, ScanError> {
        let mut url = self
            .base_url()?
            .join(&self.search_path)
            .map_err(|err| ScanError::Config(format!("search path {:?}: {err}", self.search_path)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(&self.keyword_param, query.keyword.trim());
            if !query.location.trim().is_empty() {
                pairs.append_pair(&self.location_param, query.location.trim());
            }
            pairs.append_pair(&self.radius_param, &query.radius.to_string());
            for (key, value) in &self.extra_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_spaces_and_keeps_order() {
        let query = SearchQuery {
            keyword: "data scientist".to_string(),
            location: "Toronto, ON".to_string(),
            radius: 50,
        };
        let url = Provider::default().search_url(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.simplyhired.ca/search?q=data+scientist&l=Toronto%2C+ON&w=50&so=d"
        );
    }

    #[test]
    fn non_http_base_is_rejected() {
        let provider = Provider {
            base_url: "file:///tmp".to_string(),
            ..Provider::default()
        };
        assert!(provider.base_url().is_err());
    }
}
