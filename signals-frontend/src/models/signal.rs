use serde::{Deserialize, Serialize};

/// Filters for a signal search, as submitted by the search form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub isn_slug: String,
    pub signal_type_slug: String,
    pub sem_ver: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub signal_id: Option<String>,
    #[serde(default)]
    pub local_ref: Option<String>,
    #[serde(default)]
    pub include_withdrawn: bool,
    #[serde(default)]
    pub include_correlated: bool,
    #[serde(default)]
    pub include_previous_versions: bool,
}

/// Query string sent to the signals API. Unset filters are omitted.
#[derive(Debug, Serialize)]
pub(crate) struct SearchQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_ref: Option<&'a str>,
    pub include_withdrawn: bool,
    pub include_correlated: bool,
    pub include_previous_versions: bool,
}

impl<'a> From<&'a SearchParams> for SearchQuery<'a> {
    fn from(params: &'a SearchParams) -> Self {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        Self {
            start_date: non_empty(&params.start_date),
            end_date: non_empty(&params.end_date),
            account_id: non_empty(&params.account_id),
            signal_id: non_empty(&params.signal_id),
            local_ref: non_empty(&params.local_ref),
            include_withdrawn: params.include_withdrawn,
            include_correlated: params.include_correlated,
            include_previous_versions: params.include_previous_versions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousSignalVersion {
    pub signal_version_id: String,
    pub version_number: i32,
    pub created_at: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSignal {
    pub account_id: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub signal_id: String,
    pub local_ref: String,
    pub signal_version_id: String,
    pub version_number: i32,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_withdrawn: bool,
    #[serde(default)]
    pub correlated_to_signal_id: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub previous_signal_versions: Vec<PreviousSignalVersion>,
}
