//! DonDominio API request and response types
//!
//! Request structs are form-encoded; response structs are decoded from JSON.
//! Numeric values stay [`serde_json::Number`] so the literal is preserved.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

// ============ Request params ============

/// `/service/getinfo` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatusParams {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "infoType")]
    pub info_type: String,
}

/// `/service/dnslist` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct DnsListParams {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "filterValue")]
    pub filter_value: String,
}

/// `/service/dnscreate` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct DnsCreateParams {
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(rename = "serviceName")]
    pub service_name: String,
    pub name: String,
    pub value: String,
}

/// `/service/dnsdelete` parameters.
#[derive(Debug, Clone, Serialize)]
pub struct DnsDeleteParams {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "entityID")]
    pub entity_id: String,
}

// ============ Responses ============

/// `/service/getinfo` reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInfoResponse {
    pub success: bool,
    pub error_code: Option<Number>,
    pub error_code_msg: String,
    pub action: String,
    pub version: String,
    pub response_data: ServiceInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub productkey: String,
    pub status: String,
    pub ts_expir: String,
    pub ts_create: String,
    pub renewable: bool,
    pub renewal_mode: String,
}

/// `/service/dnslist` and `/service/dnscreate` reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsListResponse {
    pub success: bool,
    pub error_code: Option<Number>,
    pub error_code_msg: String,
    pub action: String,
    pub version: String,
    pub messages: Vec<String>,
    pub response_data: DnsListData,
}

impl DnsListResponse {
    /// Records carried by the reply, possibly none.
    pub fn records(&self) -> &[DnsRecord] {
        &self.response_data.dns
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsListData {
    pub query_info: Option<QueryInfo>,
    #[serde(deserialize_with = "null_as_empty")]
    pub dns: Vec<DnsRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryInfo {
    pub page: Option<Number>,
    pub page_length: Option<Number>,
    pub results: Option<Number>,
    pub total: Option<Number>,
}

/// DNS record as owned by DonDominio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DnsRecord {
    #[serde(rename = "entityID", deserialize_with = "string_or_number")]
    pub entity_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub ttl: String,
    #[serde(deserialize_with = "string_or_number")]
    pub priority: String,
    pub value: String,
}

/// Accepts `"300"`, `300` or `null`, keeping the literal text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => s,
        Some(Raw::Num(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
