//! VM manifests and wave plans.
//!
//! A manifest is a CSV file whose first column names the VMs to
//! migrate. A plan is a TOML file listing the conversion jobs of a wave:
//!
//! ```toml
//! [[jobs]]
//! source = "/ctr1/.acropolis/vmdisk/0b5f..."
//! destination = "6f0b1c2e-..._scsi.0.qcow2"
//! owner = "web01"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::pool::Job;

/// Errors from manifest and plan files.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plan {path}: {message}")]
    Parse { path: String, message: String },

    /// Two jobs would write the same artifact.
    #[error("Destination {destination} appears more than once in the plan")]
    DuplicateDestination { destination: String },

    #[error("Plan job for {owner} has an empty {field}")]
    EmptyField { owner: String, field: &'static str },
}

/// Reads VM names from the first column of a CSV file.
pub fn load_vm_manifest(path: &Path) -> Result<Vec<String>, ManifestError> {
    let text = read(path)?;
    Ok(parse_vm_manifest(&text))
}

/// Empty lines and empty first columns are skipped.
pub fn parse_vm_manifest(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split(',').next())
        .map(|name| name.trim().trim_matches('"').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// The jobs of one wave.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Plan {
    pub fn new(jobs: Vec<Job>) -> Result<Self, ManifestError> {
        let plan = Self { jobs };
        plan.validate()?;
        Ok(plan)
    }

    /// Parses and validates a TOML plan.
    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        let plan: Plan = toml::from_str(text).map_err(|e| ManifestError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Keeps only jobs whose owner is listed in `owners`.
    pub fn filter_by_owners(&self, owners: &[String]) -> Plan {
        let wanted: HashSet<&str> = owners.iter().map(String::as_str).collect();
        Plan {
            jobs: self
                .jobs
                .iter()
                .filter(|job| wanted.contains(job.owner_label.as_str()))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// A job is placed at most once, so destinations must be unique.
    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.source_locator.trim().is_empty() {
                return Err(ManifestError::EmptyField {
                    owner: job.owner_label.clone(),
                    field: "source",
                });
            }
            if job.destination_name.trim().is_empty() {
                return Err(ManifestError::EmptyField {
                    owner: job.owner_label.clone(),
                    field: "destination",
                });
            }
            if !seen.insert(job.destination_name.as_str()) {
                return Err(ManifestError::DuplicateDestination {
                    destination: job.destination_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Loads a plan file.
pub fn load_plan(path: &Path) -> Result<Plan, ManifestError> {
    let text = read(path)?;
    Plan::from_toml_str(&text).map_err(|e| match e {
        ManifestError::Parse { message, .. } => ManifestError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })
}

fn read(path: &Path) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
        path: path.display().to_string(),
        source: e,
    })
}
