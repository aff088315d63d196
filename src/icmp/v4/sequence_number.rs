type SequenceNumberInnerType = u16;

/// Per-attempt counter carried in the ICMP echo header.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct SequenceNumber(SequenceNumberInnerType);

impl SequenceNumber {
    pub(crate) fn start_value() -> SequenceNumber {
        // Each session numbers its attempts from 0.
        SequenceNumber(0)
    }

    pub(crate) fn next(self) -> Self {
        SequenceNumber(self.0.wrapping_add(1))
    }
}

impl From<SequenceNumber> for SequenceNumberInnerType {
    fn from(value: SequenceNumber) -> Self {
        value.0
    }
}

impl From<SequenceNumberInnerType> for SequenceNumber {
    fn from(value: SequenceNumberInnerType) -> Self {
        SequenceNumber(value)
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
