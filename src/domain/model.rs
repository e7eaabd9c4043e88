use serde::{Deserialize, Serialize};

/// Ledgers have shipped both `0.1` and `"1.0"` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaVersion {
    Number(f64),
    Text(String),
}

impl Default for SchemaVersion {
    fn default() -> Self {
        SchemaVersion::Text(String::new())
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::Number(n) => write!(f, "{}", n),
            SchemaVersion::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductItemRecord {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub descriptor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassportMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub board_sn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassportAgent {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub signature: String,
}

/// Signed provenance record for a manufactured unit, as served by the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductItemPassport {
    #[serde(default)]
    pub schema_version: SchemaVersion,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub records: Vec<ProductItemRecord>,
    #[serde(default)]
    pub metadata: PassportMetadata,
    #[serde(default)]
    pub agent: PassportAgent,
    #[serde(default)]
    pub signature: String,
}

/// Body of the commissioning passport submission sent after TO2 completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissioningCreateRequest {
    pub controller_uuid: String,
    pub cert: String,
    pub deployed_location: String,
    pub timestamp: String,
}

impl CommissioningCreateRequest {
    /// Stamps the request with the current time in Unix nanoseconds.
    pub fn new_now(controller_uuid: &str, cert: &str, deployed_location: &str) -> Self {
        let now = chrono::Utc::now();
        // timestamp_nanos_opt is None only past the year 2262
        let timestamp = now
            .timestamp_nanos_opt()
            .map(|ns| ns.to_string())
            .unwrap_or_else(|| now.timestamp().to_string());

        Self {
            controller_uuid: controller_uuid.to_string(),
            cert: cert.to_string(),
            deployed_location: deployed_location.to_string(),
            timestamp,
        }
    }
}

/// Request extension carrying the passport fetched during DI.AppStart.
#[derive(Debug, Clone)]
pub struct ProductPassportContext(pub ProductItemPassport);
