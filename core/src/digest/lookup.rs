use crate::error::{CoreError, CoreResult};
use crate::notification::model::VulnerabilityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VulnerabilityDetail {
    pub source: String,
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>, // HIGH|MEDIUM|LOW
}

/// Display information for every vulnerability currently known on one
/// component version.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentVulnerabilities {
    pub vulnerabilities: Vec<VulnerabilityDetail>,
}

impl ComponentVulnerabilities {
    pub fn detail(&self, vid: &VulnerabilityId) -> Option<&VulnerabilityDetail> {
        self.vulnerabilities
            .iter()
            .find(|d| d.source == vid.source && d.id == vid.id)
    }

    /// Display name for `vid`; ids unknown to the service (typically deleted
    /// ones) fall back to `source:id`.
    pub fn display_for(&self, vid: &VulnerabilityId) -> String {
        match self.detail(vid) {
            Some(d) => d.display_name.clone(),
            None => vid.to_string(),
        }
    }
}

/// Component metadata service used to name vulnerabilities in the digest.
pub trait VulnerabilityLookup {
    fn resolve(&self, component_version_url: &str) -> CoreResult<ComponentVulnerabilities>;
}

/// Per-run cache in front of a lookup: each component version is resolved at
/// most once, failures included.
pub struct MemoizedLookup<'a, L: VulnerabilityLookup + ?Sized> {
    inner: &'a L,
    cache: HashMap<String, Result<ComponentVulnerabilities, String>>,
    calls: usize,
}

impl<'a, L: VulnerabilityLookup + ?Sized> MemoizedLookup<'a, L> {
    pub fn new(inner: &'a L) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
            calls: 0,
        }
    }

    pub fn resolve(&mut self, component_version_url: &str) -> CoreResult<&ComponentVulnerabilities> {
        let inner = self.inner;
        let calls = &mut self.calls;
        let cached = self
            .cache
            .entry(component_version_url.to_string())
            .or_insert_with(|| {
                *calls += 1;
                inner
                    .resolve(component_version_url)
                    .map_err(|e| e.to_string())
            });
        match cached {
            Ok(info) => Ok(&*info),
            Err(message) => Err(CoreError::LookupFailed {
                component_version_url: component_version_url.to_string(),
                message: message.clone(),
            }),
        }
    }

    /// Calls that reached the underlying lookup.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

/// Lookup backed by a JSON document keyed by component-version URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VulnerabilityCatalog {
    pub components: BTreeMap<String, Vec<VulnerabilityDetail>>,
}

impl VulnerabilityCatalog {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let catalog: VulnerabilityCatalog = serde_json::from_slice(&bytes)?;
        Ok(catalog)
    }
}

impl VulnerabilityLookup for VulnerabilityCatalog {
    fn resolve(&self, component_version_url: &str) -> CoreResult<ComponentVulnerabilities> {
        Ok(ComponentVulnerabilities {
            vulnerabilities: self
                .components
                .get(component_version_url)
                .cloned()
                .unwrap_or_default(),
        })
    }
}
