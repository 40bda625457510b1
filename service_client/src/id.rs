use std::sync::atomic::{AtomicI64, Ordering};

/// Identifies one connection for diagnostics. Never protocol-visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ConnectionId(i64);

/// Sequential id source, owned by the [`Connector`](crate::Connector) that
/// creates the connections rather than being process-wide state.
#[derive(Debug)]
pub struct ConnectionIdGenerator {
    last_id: AtomicI64,
}

impl ConnectionIdGenerator {
    pub fn new(start: i64) -> Self {
        Self {
            last_id: AtomicI64::new(start),
        }
    }

    pub fn next(&self) -> ConnectionId {
        ConnectionId(self.last_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential() {
        let gen = ConnectionIdGenerator::new(5);

        assert_eq!(gen.next(), ConnectionId(5));
        assert_eq!(gen.next(), ConnectionId(6));
        assert_ne!(gen.next(), gen.next());
    }
}
