use serde::Deserialize;

use crate::{RequestError, Result};

/// Configures method, retry budget and retry delay of a request.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestOptions {
    /// HTTP method name, validated when the options are applied to a spec.
    pub method: String,
    /// Fixed wait between a 404 and the next attempt, in milliseconds.
    pub delay_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retry: u32,
    /// Overrides the attempt budget that is otherwise derived as
    /// `max_retry + 1`.
    pub retry_counter_seed: Option<u32>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_owned(),
            delay_ms: 5_000,
            max_retry: 2,
            retry_counter_seed: None,
        }
    }
}

impl RequestOptions {
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn with_retry_counter_seed(mut self, seed: u32) -> Self {
        self.retry_counter_seed = Some(seed);
        self
    }

    /// Number of attempts a fresh invoker may spend on 404 answers.
    pub fn retry_budget(&self) -> u32 {
        self.retry_counter_seed
            .unwrap_or_else(|| self.max_retry.saturating_add(1))
    }

    /// Parses options from a JSON object. Missing keys keep their defaults.
    ///
    /// ```
    /// use retrying_request::RequestOptions;
    ///
    /// let opts = RequestOptions::from_json_str(r#"{"delay_ms": 250}"#).unwrap();
    /// assert_eq!(opts.delay_ms, 250);
    /// assert_eq!(opts.max_retry, 2);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| RequestError::Config(format!("invalid options JSON: {err}")))
    }

    /// Creates options from environment variables.
    ///
    /// Reads:
    /// - `RETRY_REQUEST_METHOD`
    /// - `RETRY_REQUEST_DELAY_MS`
    /// - `RETRY_REQUEST_MAX_RETRY`
    /// - `RETRY_REQUEST_COUNTER_SEED`
    ///
    /// Unset variables keep their defaults. A variable that is set but empty
    /// or unparsable is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(method) = non_empty(&lookup, "RETRY_REQUEST_METHOD")? {
            opts.method = method;
        }
        if let Some(delay) = non_empty(&lookup, "RETRY_REQUEST_DELAY_MS")? {
            opts.delay_ms = parse_number("RETRY_REQUEST_DELAY_MS", &delay)?;
        }
        if let Some(max_retry) = non_empty(&lookup, "RETRY_REQUEST_MAX_RETRY")? {
            opts.max_retry = parse_number("RETRY_REQUEST_MAX_RETRY", &max_retry)?;
        }
        if let Some(seed) = non_empty(&lookup, "RETRY_REQUEST_COUNTER_SEED")? {
            opts.retry_counter_seed = Some(parse_number("RETRY_REQUEST_COUNTER_SEED", &seed)?);
        }

        Ok(opts)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => {
            Err(RequestError::Config(format!("{key} is set but empty")))
        }
        Some(value) => Ok(Some(value.trim().to_owned())),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        RequestError::Config(format!(
            "{key} must be a non-negative integer, got '{value}'"
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::RequestOptions;
    use crate::RequestError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_legacy_parameters() {
        let opts = RequestOptions::default();
        assert_eq!(opts.method, "GET");
        assert_eq!(opts.delay_ms, 5_000);
        assert_eq!(opts.max_retry, 2);
        assert_eq!(opts.retry_budget(), 3);
    }

    #[test]
    fn counter_seed_overrides_budget() {
        let opts = RequestOptions::default()
            .with_max_retry(5)
            .with_retry_counter_seed(1);
        assert_eq!(opts.retry_budget(), 1);
    }

    #[test]
    fn budget_saturates_at_max() {
        let opts = RequestOptions::default().with_max_retry(u32::MAX);
        assert_eq!(opts.retry_budget(), u32::MAX);
    }

    #[test]
    fn json_rejects_unknown_keys() {
        let err = RequestOptions::from_json_str(r#"{"retries": 4}"#).expect_err("must reject");
        assert!(matches!(err, RequestError::Config(_)));
    }

    #[test]
    fn json_reads_all_fields() {
        let opts = RequestOptions::from_json_str(
            r#"{"method":"POST","delay_ms":10,"max_retry":0,"retry_counter_seed":7}"#,
        )
        .expect("valid options");
        assert_eq!(
            opts,
            RequestOptions {
                method: "POST".to_owned(),
                delay_ms: 10,
                max_retry: 0,
                retry_counter_seed: Some(7),
            }
        );
    }

    #[test]
    fn lookup_keeps_defaults_for_unset_variables() {
        let opts = RequestOptions::from_lookup(lookup_from(&[("RETRY_REQUEST_DELAY_MS", "100")]))
            .expect("valid env");
        assert_eq!(opts.delay_ms, 100);
        assert_eq!(opts.method, "GET");
        assert_eq!(opts.retry_counter_seed, None);
    }

    #[test]
    fn lookup_rejects_empty_and_garbage_values() {
        let empty = RequestOptions::from_lookup(lookup_from(&[("RETRY_REQUEST_METHOD", "  ")]));
        assert!(matches!(empty, Err(RequestError::Config(_))));

        let garbage =
            RequestOptions::from_lookup(lookup_from(&[("RETRY_REQUEST_MAX_RETRY", "-1")]));
        match garbage {
            Err(RequestError::Config(message)) => {
                assert!(message.contains("RETRY_REQUEST_MAX_RETRY"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
