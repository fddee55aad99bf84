/// Supplies the client description embedded in heartbeats
pub trait MetaInfoProvider: Send + Sync {
    fn current_meta_info(&self) -> String;
}

/// Fixed meta info, e.g. `"order-service@10.0.0.7:8080"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMetaInfo(pub String);

impl StaticMetaInfo {
    pub fn new(meta: impl Into<String>) -> Self {
        Self(meta.into())
    }
}

impl MetaInfoProvider for StaticMetaInfo {
    fn current_meta_info(&self) -> String {
        self.0.clone()
    }
}

impl<F> MetaInfoProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current_meta_info(&self) -> String {
        self()
    }
}
