use std::time::SystemTime;

/// A single unit of fetch work.
///
/// A [`WorkItem`] is immutable once created: the identifier, the target and
/// the submission timestamp are only readable. Identifiers are expected to be
/// unique per item, but the pool never deduplicates on them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkItem {
    id: String,
    #[cfg_attr(feature = "serde", serde(rename = "url"))]
    target: String,
    #[cfg_attr(feature = "serde", serde(rename = "start_at"))]
    submitted_at: SystemTime,
}

impl WorkItem {
    /// Creates an item stamped with the current wall-clock time.
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_submitted_at(id, target, SystemTime::now())
    }

    /// Creates an item with an explicit submission time.
    pub fn with_submitted_at(
        id: impl Into<String>,
        target: impl Into<String>,
        submitted_at: SystemTime,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            submitted_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resource to fetch, typically a URL.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub const fn submitted_at(&self) -> SystemTime {
        self.submitted_at
    }

    /// Consumes the item, returning its identifier.
    pub(crate) fn into_id(self) -> String {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn accessors_return_construction_values() {
        let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let item = WorkItem::with_submitted_at("task-7", "https://example.com", at);

        assert_eq!(item.id(), "task-7");
        assert_eq!(item.target(), "https://example.com");
        assert_eq!(item.submitted_at(), at);
        assert_eq!(item.into_id(), "task-7");
    }

    #[test]
    fn new_stamps_current_time() {
        let before = SystemTime::now();
        let item = WorkItem::new("task-1", "https://example.com");
        let after = SystemTime::now();

        assert!(item.submitted_at() >= before && item.submitted_at() <= after);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_wire_field_names() {
        let item = WorkItem::with_submitted_at("task-1", "https://example.com", UNIX_EPOCH);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["id"], "task-1");
        assert_eq!(json["url"], "https://example.com");
        assert!(json.get("start_at").is_some());

        let back: WorkItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
