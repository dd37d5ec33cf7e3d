/// The cryptodisk error taxonomy.
///
/// No error is ever recovered inside the core; every variant here is meant
/// to reach the caller unchanged, at the highest resolution the caller's
/// error channel can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CryptoDiskError {
    /// Buffer length not a multiple of the sector size, or a key length
    /// inconsistent with the configured mode.
    #[error("invalid argument")]
    InvalidArgument,
    /// A cipher handle was asked to decrypt but has no decrypt implementation.
    #[error("operation not supported by this cipher")]
    NotSupported,
    /// A `mode` value not covered by the chaining-mode dispatch (defensive).
    #[error("mode not implemented")]
    NotImplemented,
    /// Allocating the LRW precalculation table failed.
    #[error("out of memory")]
    OutOfMemory,
    /// A registry lookup by id or UUID found nothing.
    #[error("unknown device")]
    UnknownDevice,
    /// The backing disk reported an I/O failure.
    #[error("disk i/o error")]
    Io(#[from] cryptodisk_io::IoError),
    /// The backing disk read failed (distinct from a generic I/O error so
    /// callers can tell "bad sector" from "wrong configuration").
    #[error("read error")]
    ReadError,
    /// The write path is unimplemented by design.
    #[error("write not implemented")]
    NotImplementedYet,
}
