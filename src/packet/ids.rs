//! Page id generation.
//!
//! Ids are supplied by an injected generator so `create_page` stays pure and
//! tests stay deterministic.

use uuid::Uuid;

/// Source of fresh page identifiers.
pub trait IdGenerator {
    /// Returns an id not previously returned by this generator.
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs. The default for real documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` ids, starting at 1.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

impl<F> IdGenerator for F
where
    F: FnMut() -> String,
{
    fn next_id(&mut self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_unique_and_parse() {
        let mut ids = UuidIds;
        let a = ids.next_id();
        let b = ids.next_id();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("page");
        assert_eq!(ids.next_id(), "page-1");
        assert_eq!(ids.next_id(), "page-2");
    }

    #[test]
    fn test_closure_generator() {
        let mut n = 0;
        let mut next = || {
            n += 10;
            format!("c{}", n)
        };
        assert_eq!(next.next_id(), "c10");
        assert_eq!(next.next_id(), "c20");
    }
}
