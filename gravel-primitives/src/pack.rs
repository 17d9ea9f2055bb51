/// Descriptor of a resource or behaviour pack offered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePackInfo {
    /// The pack UUID, in its textual form.
    pub id: String,
    pub version: String,
    /// Size of the pack archive in bytes.
    pub size: u64,
}

impl ResourcePackInfo {
    pub fn new(id: impl Into<String>, version: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            size,
        }
    }
}
