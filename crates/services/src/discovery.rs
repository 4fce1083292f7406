use async_trait::async_trait;
use practice_core::SetId;
use url::Url;

/// Menu entry describing a set before it is loaded: its id, an optional
/// display label, and where its document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDescriptor {
    id: SetId,
    label: Option<String>,
    source: Url,
}

impl SetDescriptor {
    #[must_use]
    pub fn new(id: SetId, label: Option<String>, source: Url) -> Self {
        let label = label
            .map(|raw| raw.trim().to_owned())
            .filter(|trimmed| !trimmed.is_empty());
        Self { id, label, source }
    }

    #[must_use]
    pub fn id(&self) -> &SetId {
        &self.id
    }

    /// Menu label, falling back to the id when none was provided.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    #[must_use]
    pub fn source(&self) -> &Url {
        &self.source
    }
}

/// Source of the set menu. Implementations decide where sets come from:
/// a directory scan, a manifest, a hard-coded list.
#[async_trait]
pub trait SetDiscovery: Send + Sync {
    /// Every set the menu should offer, in menu order. Discovery problems
    /// are the implementation's to log; callers only see what is usable.
    async fn discover(&self) -> Vec<SetDescriptor>;
}

/// Discovery backed by a fixed list.
#[derive(Clone, Default)]
pub struct StaticDiscovery {
    sets: Vec<SetDescriptor>,
}

impl StaticDiscovery {
    #[must_use]
    pub fn new(sets: Vec<SetDescriptor>) -> Self {
        Self { sets }
    }
}

#[async_trait]
impl SetDiscovery for StaticDiscovery {
    async fn discover(&self) -> Vec<SetDescriptor> {
        self.sets.clone()
    }
}
