use tokio::task::JoinError;

/// Why a whole ingestion cycle aborted. Per-event failures are logged and
/// counted instead; they never surface here.
#[derive(Debug)]
pub enum CycleError {
    /// The sink could not answer the checkpoint query. The cycle must not
    /// fall back to genesis, or a transient sink error would re-scan the
    /// entire history.
    Checkpoint(eyre::Report),
    /// The node could not serve the event request for this range.
    Source {
        from_block: u64,
        to_block: u64,
        source: eyre::Report,
    },
    /// An event task panicked. Not recoverable within the schedule.
    Fault(JoinError),
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Checkpoint(report) => Some(report.as_ref()),
            CycleError::Source { source, .. } => Some(source.as_ref()),
            CycleError::Fault(err) => Some(err),
        }
    }
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleError::Checkpoint(e) => write!(f, "checkpoint query failed: {}", e),
            CycleError::Source {
                from_block,
                to_block,
                source,
            } => write!(
                f,
                "event fetch failed for blocks {} to {}: {}",
                from_block, to_block, source
            ),
            CycleError::Fault(e) => write!(f, "event task panicked: {}", e),
        }
    }
}

/// A single log could not be turned into a persistable record.
#[derive(Debug, PartialEq, Eq)]
pub enum RecordError {
    MissingBlockNumber,
    MissingTransactionIndex,
    MissingLogIndex,
    InvalidTimestamp { value: u64 },
    NumberOverflow { value: u64 },
}

impl std::error::Error for RecordError {}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::MissingBlockNumber => write!(f, "missing block number in log"),
            RecordError::MissingTransactionIndex => {
                write!(f, "missing transaction index in log")
            }
            RecordError::MissingLogIndex => write!(f, "missing log index in log"),
            RecordError::InvalidTimestamp { value } => {
                write!(f, "block timestamp {} is not a valid instant", value)
            }
            RecordError::NumberOverflow { value } => {
                write!(f, "value {} exceeds the sink's integer range", value)
            }
        }
    }
}
