use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for object IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter shared by every generated ID.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// The reserved ID of the implicit scene root.
pub const ROOT_ID: &str = "__root__";

/// Application-assigned identifier of a canvas object.
///
/// Interned, so it is `Copy` and compares in O(1). Serializes as the plain
/// string that correlates the object across snapshots and the web UI.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Spur);

impl ObjectId {
    /// Intern a string as an ObjectId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ObjectId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The ID of the scene root.
    pub fn root() -> Self {
        Self::intern(ROOT_ID)
    }

    pub fn is_root(&self) -> bool {
        self.as_str() == ROOT_ID
    }

    /// Generate a fresh ID with a type prefix, e.g. `rect-12`.
    pub fn generate(prefix: &str) -> Self {
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}-{n}");
            // IDs loaded from JSON may already occupy this name.
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ObjectId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ObjectId::intern("hero_title");
        let b = ObjectId::intern("hero_title");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hero_title");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = ObjectId::generate("rect");
        let b = ObjectId::generate("rect");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rect-"));
    }

    #[test]
    fn generate_skips_taken_names() {
        let next = COUNTER.load(Ordering::Relaxed);
        let taken = ObjectId::intern(&format!("circle-{next}"));
        let fresh = ObjectId::generate("circle");
        assert_ne!(taken, fresh);
    }

    #[test]
    fn root_is_reserved() {
        assert!(ObjectId::root().is_root());
        assert!(!ObjectId::intern("rect-1").is_root());
    }
}
