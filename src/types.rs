use crate::constants::FEATURE_RECORD_TYPE;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Service type detected by probing a remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "ogcWms")]
    Wms,
    /// Never produced by the prober: XML responses are always classified as WMS
    #[serde(rename = "ogcWmts")]
    Wmts,
    #[serde(rename = "esriMapServer")]
    MapServer,
    #[serde(rename = "esriFeatureServer")]
    FeatureServer,
    #[serde(rename = "esriFeature")]
    Feature,
    #[serde(rename = "esriTile")]
    Tile,
    #[serde(rename = "esriImage")]
    Image,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Wms => "ogcWms",
            ServiceType::Wmts => "ogcWmts",
            ServiceType::MapServer => "esriMapServer",
            ServiceType::FeatureServer => "esriFeatureServer",
            ServiceType::Feature => "esriFeature",
            ServiceType::Tile => "esriTile",
            ServiceType::Image => "esriImage",
            ServiceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layer type written into the viewer configuration, after remapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerType {
    #[serde(rename = "ogcWms")]
    Wms,
    #[serde(rename = "ogcWmts")]
    Wmts,
    /// MapServer and FeatureServer endpoints
    #[serde(rename = "esriDynamic")]
    Dynamic,
    #[serde(rename = "esriFeature")]
    Feature,
    #[serde(rename = "esriTile")]
    Tile,
    #[serde(rename = "esriImage")]
    Image,
    #[serde(rename = "unknown")]
    Unknown,
}

impl LayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Wms => "ogcWms",
            LayerType::Wmts => "ogcWmts",
            LayerType::Dynamic => "esriDynamic",
            LayerType::Feature => "esriFeature",
            LayerType::Tile => "esriTile",
            LayerType::Image => "esriImage",
            LayerType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LayerType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ogcWms" => Ok(LayerType::Wms),
            "ogcWmts" => Ok(LayerType::Wmts),
            "esriDynamic" => Ok(LayerType::Dynamic),
            "esriFeature" => Ok(LayerType::Feature),
            "esriTile" => Ok(LayerType::Tile),
            "esriImage" => Ok(LayerType::Image),
            "unknown" => Ok(LayerType::Unknown),
            other => Err(RegistryError::Storage {
                message: format!("unrecognised layer type '{other}'"),
            }),
        }
    }
}

/// Languages every registration must describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lang {
    En,
    Fr,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Fr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fr => "fr",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the metadata record for a layer can be found
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_url: Option<String>,
}

/// The part of a registration request scoped to one language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangFields {
    pub service_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSource>,
    /// Any other per-language fields, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A registration request as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    pub en: LangFields,
    pub fr: LangFields,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawRequest {
    pub fn lang(&self, lang: Lang) -> &LangFields {
        match lang {
            Lang::En => &self.en,
            Lang::Fr => &self.fr,
        }
    }

    /// The record type the caller declared, when it names a known type.
    pub fn payload_type(&self) -> Option<RecordType> {
        self.extra
            .get("payload_type")
            .and_then(Value::as_str)
            .and_then(|tag| RecordType::try_from(tag.to_string()).ok())
    }
}

/// Per-language configuration fragment served to map viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "layerType")]
    pub layer_type: LayerType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalogue_url: Option<String>,
}

/// The stored `type` of a record: `feature` or the layer type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RecordType {
    Feature,
    Layer(LayerType),
}

impl RecordType {
    pub fn is_feature(&self) -> bool {
        matches!(self, RecordType::Feature)
    }
}

impl From<LayerType> for RecordType {
    fn from(layer_type: LayerType) -> Self {
        match layer_type {
            LayerType::Feature => RecordType::Feature,
            other => RecordType::Layer(other),
        }
    }
}

impl From<RecordType> for String {
    fn from(record_type: RecordType) -> Self {
        record_type.to_string()
    }
}

impl TryFrom<String> for RecordType {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self> {
        if value == FEATURE_RECORD_TYPE {
            Ok(RecordType::Feature)
        } else {
            value.parse::<LayerType>().map(RecordType::Layer)
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Feature => write!(f, "{FEATURE_RECORD_TYPE}"),
            RecordType::Layer(layer_type) => write!(f, "{layer_type}"),
        }
    }
}

/// The `data` member of a stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    /// Missing on records registered before requests were cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RawRequest>,
    pub en: LangRecord,
    pub fr: LangRecord,
}

/// A registered layer as held by the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub updated_at: DateTime<Utc>,
    pub data: RecordData,
}
