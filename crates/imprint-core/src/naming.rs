//! Output file naming

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Dynamic part appended to a renamed output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SuffixMode {
    /// Zero-padded 3-digit running count, starting at 001
    #[default]
    Counter,
    /// Random 6-digit number
    Random,
}

impl SuffixMode {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_uppercase().as_str() {
            "3DIGITSCOUNT" => Ok(SuffixMode::Counter),
            "RAND" => Ok(SuffixMode::Random),
            _ => Err(ConfigError::InvalidNamingMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingPolicy {
    /// Keep the source file name
    #[default]
    Preserve,
    /// `prefix + suffix + extension`
    Rename { prefix: String, mode: SuffixMode },
}

impl NamingPolicy {
    /// An empty prefix means the source names are kept.
    pub fn from_options(prefix: Option<&str>, suffix: &str) -> Result<Self, ConfigError> {
        let mode = SuffixMode::parse(suffix)?;
        match prefix {
            Some(prefix) if !prefix.is_empty() => Ok(NamingPolicy::Rename {
                prefix: prefix.to_string(),
                mode,
            }),
            _ => Ok(NamingPolicy::Preserve),
        }
    }
}

/// Produces output file names for a run.
///
/// The running count only moves forward through [`OutputNamer::advance`], which the
/// batch driver calls after an item was written, so skipped or failed sources never
/// leave gaps in the numbering.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    policy: NamingPolicy,
    count: u32,
}

impl OutputNamer {
    pub fn new(policy: NamingPolicy) -> Self {
        Self { policy, count: 1 }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Name for the output of `source`, using the current count.
    pub fn file_name(&self, source: &Path) -> String {
        match &self.policy {
            NamingPolicy::Preserve => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            NamingPolicy::Rename { prefix, mode } => {
                let suffix = match mode {
                    SuffixMode::Counter => format!("{:03}", self.count),
                    SuffixMode::Random => {
                        format!("{:06}", rand::rng().random_range(0..1_000_000u32))
                    }
                };
                match source.extension() {
                    Some(ext) => format!("{}{}.{}", prefix, suffix, ext.to_string_lossy()),
                    None => format!("{}{}", prefix, suffix),
                }
            }
        }
    }

    pub fn advance(&mut self) {
        self.count += 1;
    }
}
