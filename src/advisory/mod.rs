pub mod engine;
pub mod sink;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    HighSeverityDetected,
    RepeatedDetection,
    RegionalAlert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryEvent {
    pub kind: AdvisoryKind,
    pub crop_type: String,
    pub title: String,
    pub body: String,
}
