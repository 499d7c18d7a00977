//! Secret-scan gate.
//!
//! Content is run through an ordered list of [`Detector`]s before it may be
//! stored or promoted. The first match decides the outcome:
//!
//! - RED (`error`): blocking, the operation fails with a security error
//! - YELLOW (`warn`): the operation proceeds and the caller is told
//! - GREEN: no match
//!
//! Matched text never leaves this module unmasked.

pub mod catalogue;
pub mod mask;

use std::fmt;
use std::ops::Range;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use catalogue::builtin_catalogue;
pub use mask::{mask_secret, mask_spans, FULL_MASK, MAX_MASK_RUN};

/// Detector severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
}

/// Three-tier gate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Red => "RED",
            Tier::Yellow => "YELLOW",
            Tier::Green => "GREEN",
        })
    }
}

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub id: String,
    pub name: String,
    pub regex: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

/// A match reported by a detector. Holds a byte span, not the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMatch {
    pub detector_id: String,
    pub name: String,
    pub severity: Severity,
    pub span: Range<usize>,
}

/// A pluggable secret detector.
pub trait Detector: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn severity(&self) -> Severity;

    fn remediation(&self) -> Option<&str> {
        None
    }

    /// Every match in `content`, in ascending position order.
    fn find_all(&self, content: &str) -> Vec<Range<usize>>;

    /// The first match in `content`, if any.
    fn test(&self, content: &str) -> Option<SecretMatch> {
        self.find_all(content)
            .into_iter()
            .next()
            .map(|span| SecretMatch {
                detector_id: self.id().to_string(),
                name: self.name().to_string(),
                severity: self.severity(),
                span,
            })
    }
}

/// Regex-backed detector built from a [`PatternEntry`].
#[derive(Debug, Clone)]
pub struct PatternDetector {
    entry: PatternEntry,
    regex: Regex,
}

impl PatternDetector {
    pub fn new(entry: PatternEntry) -> Result<Self, ValidationError> {
        let regex = Regex::new(&entry.regex).map_err(|e| ValidationError::InvalidPattern {
            id: entry.id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { entry, regex })
    }
}

impl Detector for PatternDetector {
    fn id(&self) -> &str {
        &self.entry.id
    }

    fn name(&self) -> &str {
        &self.entry.name
    }

    fn severity(&self) -> Severity {
        self.entry.severity
    }

    fn remediation(&self) -> Option<&str> {
        self.entry.remediation.as_deref()
    }

    fn find_all(&self, content: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(content).map(|m| m.range()).collect()
    }

    fn test(&self, content: &str) -> Option<SecretMatch> {
        self.regex.find(content).map(|m| SecretMatch {
            detector_id: self.entry.id.clone(),
            name: self.entry.name.clone(),
            severity: self.entry.severity,
            span: m.range(),
        })
    }
}

/// Result of scanning one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    /// Masked rendering of the matched text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl ScanResult {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn tier(&self) -> Tier {
        match (self.found, self.severity) {
            (true, Some(Severity::Error)) => Tier::Red,
            (true, _) => Tier::Yellow,
            (false, _) => Tier::Green,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.tier() == Tier::Red
    }
}

/// Ordered detector set. First match short-circuits.
pub struct SecretScanner {
    detectors: Vec<Box<dyn Detector>>,
}

impl fmt::Debug for SecretScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScanner")
            .field(
                "detectors",
                &self.detectors.iter().map(|d| d.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for SecretScanner {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SecretScanner {
    /// A scanner with no detectors; every scan is GREEN.
    pub fn empty() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Scanner over the builtin catalogue.
    pub fn builtin() -> Self {
        let detectors = builtin_catalogue()
            .into_iter()
            .filter_map(|entry| match PatternDetector::new(entry) {
                Ok(d) => Some(Box::new(d) as Box<dyn Detector>),
                Err(e) => {
                    tracing::error!(event = "scan.bad_builtin_pattern", error = %e);
                    None
                }
            })
            .collect();
        Self { detectors }
    }

    /// Scanner over a caller-supplied catalogue, in catalogue order.
    pub fn from_catalogue(entries: Vec<PatternEntry>) -> Result<Self, ValidationError> {
        let detectors = entries
            .into_iter()
            .map(|e| PatternDetector::new(e).map(|d| Box::new(d) as Box<dyn Detector>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { detectors })
    }

    /// Append a detector after the existing ones.
    pub fn with_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn scan(&self, content: &str) -> ScanResult {
        for detector in &self.detectors {
            if let Some(m) = detector.test(content) {
                let preview = content.get(m.span.clone()).map(mask_secret);
                return ScanResult {
                    found: true,
                    severity: Some(m.severity),
                    pattern_id: Some(m.detector_id),
                    pattern_name: Some(m.name),
                    remediation: detector.remediation().map(str::to_string),
                    preview,
                };
            }
        }
        ScanResult::clean()
    }

    /// Mask every detected secret in `text`.
    pub fn mask(&self, text: &str) -> String {
        let spans = self
            .detectors
            .iter()
            .flat_map(|d| d.find_all(text))
            .collect::<Vec<_>>();
        mask_spans(text, spans)
    }
}

/// Mask every match `scanner` finds in `text`.
pub fn mask_matches(text: &str, scanner: &SecretScanner) -> String {
    scanner.mask(text)
}
