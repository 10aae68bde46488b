use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::{ClientSettings, Credentials};
use crate::domain::{SearchQuery, SearchSession};
use crate::error::KiraError;

pub const DATABASE: &str = "nucleotide";
const TOOL_NAME: &str = "kira-taxscan";

pub trait NcbiClient: Send + Sync {
    /// Runs esearch with history enabled.
    fn search(&self, query: &SearchQuery) -> Result<SearchSession, KiraError>;

    /// Pulls up to `retmax` GenBank flat-text records from the search history.
    fn fetch_genbank(&self, session: &SearchSession, retmax: usize)
    -> Result<String, KiraError>;
}

#[derive(Clone)]
pub struct NcbiHttpClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl NcbiHttpClient {
    pub fn new(credentials: Credentials, settings: &ClientSettings) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("{TOOL_NAME}/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::NcbiHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            credentials,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}.fcgi", self.base_url)
    }

    fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("tool", TOOL_NAME.to_string()),
            ("email", self.credentials.email.clone()),
        ];
        if let Some(api_key) = &self.credentials.api_key {
            params.push(("api_key", api_key.clone()));
        }
        params
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, KiraError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "NCBI request failed".to_string());
        Err(KiraError::NcbiStatus { status, message })
    }
}

impl NcbiClient for NcbiHttpClient {
    fn search(&self, query: &SearchQuery) -> Result<SearchSession, KiraError> {
        let term = query.term();
        tracing::info!(%term, "esearch");
        let mut params = vec![
            ("db", DATABASE.to_string()),
            ("term", term),
            ("usehistory", "y".to_string()),
            ("retmode", "json".to_string()),
        ];
        params.extend(self.identity_params());

        let response = self
            .client
            .get(self.endpoint("esearch"))
            .query(&params)
            .send()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let payload: Value = response
            .json()
            .map_err(|err| KiraError::NcbiResponse(err.to_string()))?;
        parse_search_response(&payload)
    }

    fn fetch_genbank(
        &self,
        session: &SearchSession,
        retmax: usize,
    ) -> Result<String, KiraError> {
        tracing::info!(retmax, query_key = %session.query_key, "efetch");
        let mut params = vec![
            ("db", DATABASE.to_string()),
            ("rettype", "gb".to_string()),
            ("retmode", "text".to_string()),
            ("retstart", "0".to_string()),
            ("retmax", retmax.to_string()),
            ("WebEnv", session.web_env.clone()),
            ("query_key", session.query_key.clone()),
        ];
        params.extend(self.identity_params());

        let response = self
            .client
            .get(self.endpoint("efetch"))
            .query(&params)
            .send()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let text = response
            .text()
            .map_err(|err| KiraError::NcbiHttp(err.to_string()))?;
        check_flat_text(&text)?;
        Ok(text)
    }
}

/// Extracts the history handle and count from an esearch JSON payload.
pub fn parse_search_response(payload: &Value) -> Result<SearchSession, KiraError> {
    if let Some(message) = payload.get("error").and_then(|v| v.as_str()) {
        return Err(KiraError::NcbiResponse(message.to_string()));
    }
    let result = payload
        .get("esearchresult")
        .ok_or_else(|| KiraError::NcbiResponse("missing esearchresult".to_string()))?;
    if let Some(message) = result.get("ERROR").and_then(|v| v.as_str()) {
        return Err(KiraError::NcbiResponse(message.to_string()));
    }

    let count = result
        .get("count")
        .and_then(|v| match v {
            Value::String(text) => text.parse::<usize>().ok(),
            Value::Number(number) => number.as_u64().map(|n| n as usize),
            _ => None,
        })
        .ok_or_else(|| KiraError::NcbiResponse("missing or invalid count".to_string()))?;
    // An empty result set may come back without history tokens.
    let (web_env, query_key) = if count == 0 {
        (
            string_field(result, "webenv").unwrap_or_default(),
            string_field(result, "querykey").unwrap_or_default(),
        )
    } else {
        (
            string_field(result, "webenv")?,
            string_field(result, "querykey")?,
        )
    };

    Ok(SearchSession {
        web_env,
        query_key,
        count,
    })
}

fn string_field(value: &Value, key: &str) -> Result<String, KiraError> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| KiraError::NcbiResponse(format!("missing {key}")))
}

// efetch reports history and parameter errors as JSON or XML with a 200 status.
fn check_flat_text(text: &str) -> Result<(), KiraError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('<') {
        let snippet: String = trimmed.chars().take(200).collect();
        return Err(KiraError::NcbiResponse(snippet));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_count_is_accepted() {
        let payload = json!({
            "esearchresult": { "count": 7, "webenv": "MCID_1", "querykey": "1" }
        });
        let session = parse_search_response(&payload).unwrap();
        assert_eq!(session.count, 7);
    }

    #[test]
    fn flat_text_rejects_error_documents() {
        assert_matches!(
            check_flat_text("{\"error\":\"Cannot retrieve history data\"}"),
            Err(KiraError::NcbiResponse(_))
        );
        assert!(check_flat_text("LOCUS       AB000001").is_ok());
        assert!(check_flat_text("").is_ok());
    }
}
