use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two upstream ingest operations a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Raw,
    Features,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Features => "features",
        }
    }
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading set from a machine, as received from ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: BTreeMap<String, f64>,
}

impl TelemetrySample {
    pub fn new(machine_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            machine_id: machine_id.into(),
            timestamp,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}

/// Rolling statistics derived from one sample and the windows behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    pub features: BTreeMap<String, f64>,
}

impl FeatureSet {
    pub fn empty(machine_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            machine_id: machine_id.into(),
            timestamp,
            features: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A borrowed payload headed for the upstream sink.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Raw(&'a TelemetrySample),
    Features(&'a FeatureSet),
}

impl Payload<'_> {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Raw(_) => PayloadKind::Raw,
            Self::Features(_) => PayloadKind::Features,
        }
    }

    pub fn machine_id(&self) -> &str {
        match self {
            Self::Raw(sample) => &sample.machine_id,
            Self::Features(features) => &features.machine_id,
        }
    }
}

#[cfg(test)]
mod tests;
