//! Candidate region resolution
//!
//! Precedence, first match wins: explicit allow-list, data-residency mapping,
//! discovery of every availability-zone-enabled region. The deny-list and the
//! region cap are applied afterwards, in that order.

use crate::cloud::CloudApi;
use crate::collector::CallGate;
use crate::error::AdvisorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cap on the number of regions evaluated per plan
pub const DEFAULT_MAX_REGIONS: usize = 8;

const FRANCE: &[&str] = &["francecentral", "francesouth"];
const GERMANY: &[&str] = &["germanywestcentral", "germanynorth"];
const NETHERLANDS: &[&str] = &["westeurope"];
const IRELAND: &[&str] = &["northeurope"];
const SWEDEN: &[&str] = &["swedencentral", "swedensouth"];
const POLAND: &[&str] = &["polandcentral"];
const ITALY: &[&str] = &["italynorth"];
const SPAIN: &[&str] = &["spaincentral"];
const SWITZERLAND: &[&str] = &["switzerlandnorth", "switzerlandwest"];
const NORWAY: &[&str] = &["norwayeast", "norwaywest"];
const UNITED_KINGDOM: &[&str] = &["uksouth", "ukwest"];
const UNITED_STATES: &[&str] = &[
    "eastus", "eastus2", "centralus", "westus2", "westus3", "southcentralus",
];
const CANADA: &[&str] = &["canadacentral", "canadaeast"];
const JAPAN: &[&str] = &["japaneast", "japanwest"];
const AUSTRALIA: &[&str] = &["australiaeast", "australiasoutheast"];

const EU_MEMBERS: &[&[&str]] = &[FRANCE, GERMANY, NETHERLANDS, IRELAND, SWEDEN, POLAND, ITALY, SPAIN];

/// Regions satisfying a data-residency code, or `None` when the code is unmapped
pub fn residency_regions(code: &str) -> Option<Vec<&'static str>> {
    let regions: Vec<&'static str> = match code.trim().to_ascii_uppercase().as_str() {
        "FR" => FRANCE.to_vec(),
        "DE" => GERMANY.to_vec(),
        "NL" => NETHERLANDS.to_vec(),
        "IE" => IRELAND.to_vec(),
        "SE" => SWEDEN.to_vec(),
        "PL" => POLAND.to_vec(),
        "IT" => ITALY.to_vec(),
        "ES" => SPAIN.to_vec(),
        "CH" => SWITZERLAND.to_vec(),
        "NO" => NORWAY.to_vec(),
        "UK" | "GB" => UNITED_KINGDOM.to_vec(),
        "US" => UNITED_STATES.to_vec(),
        "CA" => CANADA.to_vec(),
        "JP" => JAPAN.to_vec(),
        "AU" => AUSTRALIA.to_vec(),
        "EU" => EU_MEMBERS.iter().flat_map(|c| c.iter().copied()).collect(),
        _ => return None,
    };
    Some(regions)
}

/// Where the candidate list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSource {
    AllowList,
    DataResidency,
    Discovery,
}

/// Resolver input, independent of request shape
#[derive(Debug, Clone, Default)]
pub struct RegionQuery<'a> {
    pub subscription: &'a str,
    pub tenant: Option<&'a str>,
    pub allow: &'a [String],
    pub deny: &'a [String],
    pub data_residency: Option<&'a str>,
    pub max_regions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRegions {
    pub regions: Vec<String>,
    pub source: RegionSource,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ResolvedRegions {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

pub struct CandidateRegionResolver {
    api: Arc<dyn CloudApi>,
    gate: CallGate,
    default_max: usize,
}

impl CandidateRegionResolver {
    pub fn new(api: Arc<dyn CloudApi>, gate: CallGate) -> Self {
        Self {
            api,
            gate,
            default_max: DEFAULT_MAX_REGIONS,
        }
    }

    pub fn with_default_max(mut self, max: usize) -> Self {
        self.default_max = max.max(1);
        self
    }

    pub async fn resolve(&self, query: &RegionQuery<'_>) -> ResolvedRegions {
        let max = query.max_regions.unwrap_or(self.default_max).max(1);
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let (source, candidates) = if !query.allow.is_empty() {
            let mut allow = dedup_lowercase(query.allow.iter().map(String::as_str));
            allow.truncate(max);
            (RegionSource::AllowList, allow)
        } else if let Some(code) = query.data_residency {
            match residency_regions(code) {
                Some(regions) => (RegionSource::DataResidency, dedup_lowercase(regions)),
                None => {
                    warnings.push(AdvisorError::UnmappedResidency(code.to_string()).to_string());
                    (RegionSource::DataResidency, Vec::new())
                }
            }
        } else {
            match self
                .gate
                .call("list_regions", || {
                    self.api.list_regions(query.subscription, query.tenant)
                })
                .await
            {
                Ok(regions) => (
                    RegionSource::Discovery,
                    dedup_lowercase(regions.iter().map(|r| r.name.as_str())),
                ),
                Err(e) => {
                    warn!(error = %e, "Region discovery failed");
                    errors.push(format!("region discovery failed: {}", e));
                    (RegionSource::Discovery, Vec::new())
                }
            }
        };

        let deny: HashSet<String> = query
            .deny
            .iter()
            .map(|d| d.trim().to_ascii_lowercase())
            .collect();
        let mut regions: Vec<String> = candidates
            .into_iter()
            .filter(|r| !deny.contains(r))
            .collect();
        regions.truncate(max);

        debug!(source = ?source, regions = ?regions, "Resolved candidate regions");

        ResolvedRegions {
            regions,
            source,
            warnings,
            errors,
        }
    }
}

/// Lower-case, trim, drop blanks and duplicates, preserving first occurrence
fn dedup_lowercase<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| n.trim().to_ascii_lowercase())
        .filter(|n| !n.is_empty() && seen.insert(n.clone()))
        .collect()
}
