//! Per-call deployment options.

use crate::types::ProxyKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything `deploy` recognises, plus one opaque bag for the proxy deployer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployOptions {
    /// Clear the cached address and pending operation before anything else.
    pub no_cache: bool,
    /// Skip the confirmation gate.
    pub no_confirm: bool,
    /// Install behind an upgradeable proxy instead of directly.
    pub proxy: Option<ProxyKind>,
    /// Forwarded verbatim to the proxy deployer. Ignored for direct deploys.
    pub extra: Map<String, Value>,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    pub fn no_confirm(mut self) -> Self {
        self.no_confirm = true;
        self
    }

    pub fn with_proxy(mut self, kind: ProxyKind) -> Self {
        self.proxy = Some(kind);
        self
    }

    /// Add an opaque parameter for the proxy deployer.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// What a proxy deployer receives: the kind plus the caller's extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyOptions {
    pub kind: ProxyKind,
    pub extra: Map<String, Value>,
}
