type TtlInnerType = u8;

/// Time-to-live of a received IPv4 datagram.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Ttl(pub TtlInnerType);

impl From<TtlInnerType> for Ttl {
    fn from(integer: TtlInnerType) -> Self {
        Ttl(integer)
    }
}

impl From<Ttl> for TtlInnerType {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
