use crate::id::Id;
use std::fmt;

/// An immutable reference to a peer: its network endpoint plus the
/// identifier derived from it. Cheap to clone, never mutated in place.
#[derive(Clone, Eq)]
pub struct NodeRef {
    host: String,
    port: u16,
    id: Id,
}

impl NodeRef {
    pub fn new(host: &str, port: u16) -> Self {
        let id = Id::compute(host, port);
        NodeRef {
            host: host.to_string(),
            port,
            id,
        }
    }

    /// Build a `NodeRef` from a host/port whose identifier is already known
    /// (e.g. decoded off the wire), skipping the hash.
    pub fn with_id(host: impl Into<String>, port: u16, id: Id) -> Self {
        NodeRef {
            host: host.into(),
            port,
            id,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_valid(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
}

// Two NodeRefs are equal when their (host, port) match, per the data model:
// the identifier is a deterministic function of the two so this also implies
// identifier equality, but comparing the endpoint directly is the primary
// notion of identity.
impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("addr", &self.addr())
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.addr(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_endpoint() {
        let a = NodeRef::new("127.0.0.1", 5000);
        let b = NodeRef::new("127.0.0.1", 5000);
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn different_endpoints_differ() {
        let a = NodeRef::new("127.0.0.1", 5000);
        let b = NodeRef::new("127.0.0.1", 5001);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn rejects_empty_host_or_zero_port_as_invalid() {
        assert!(!NodeRef::new("", 5000).is_valid());
        assert!(!NodeRef::new("127.0.0.1", 0).is_valid());
        assert!(NodeRef::new("127.0.0.1", 5000).is_valid());
    }
}
