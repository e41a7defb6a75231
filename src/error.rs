use core::fmt;

/// Possible failures of one decode attempt.
///
/// Every variant is attempt-local. The caller gets a declined reading and
/// may retry after the sensor's minimum read interval; no variant leaves
/// state behind that a later attempt could trip over.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor never pulled the line low to acknowledge the handshake.
    NoResponse,
    /// The line was in an unexpected state during the handshake.
    ProtocolViolation,
    /// A bounded wait for a line transition exceeded its budget.
    Timeout,
    /// A measured pulse width fell outside both classification bands.
    Measurement,
    /// The frame checksum did not match the received data.
    ChecksumError,
    /// Error from the underlying line.
    LineError(E),
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::LineError(value)
    }
}

impl<E: fmt::Display> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtError::NoResponse => write!(f, "sensor did not acknowledge the handshake"),
            DhtError::ProtocolViolation => write!(f, "unexpected line state during the handshake"),
            DhtError::Timeout => write!(f, "bounded wait for a line transition ran out"),
            DhtError::Measurement => write!(f, "pulse width outside both bit bands"),
            DhtError::ChecksumError => write!(f, "frame checksum mismatch"),
            DhtError::LineError(e) => write!(f, "line error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for DhtError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DhtError::LineError(e) => Some(e),
            _ => None,
        }
    }
}
