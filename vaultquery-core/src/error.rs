//! Error taxonomy shared by every bridged store operation.
//!
//! The native record store reports failures as numeric codes. Codes are
//! grouped by the subsystem that raises them; [`ErrorKind::from_code`] turns a
//! code into the matching semantic kind and keeps unmapped codes in
//! [`ErrorKind::Unknown`] so newer stores stay diagnosable.

use strum::{Display, FromRepr};
use thiserror::Error;

/// Numeric status reported by the store when an operation succeeds.
pub const SUCCESS_CODE: i32 = 0;

/// Result type for every operation of this crate.
pub type VaultQueryResult<T> = Result<T, ErrorKind>;

/// Subsystem a failure originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Subsystem {
    /// Parameter validation and generic engine failures.
    Common,
    /// Wallet storage, including record queries and search cursors.
    Wallet,
    /// Ledger pool connectivity.
    Pool,
    /// Anonymous credentials.
    AnonCreds,
    /// Cryptographic primitives.
    Crypto,
    /// Decentralized identifiers.
    Did,
    /// Payment plugins.
    Payment,
    /// Failures raised by this crate rather than by the store.
    Wrapper,
}

/// Generic engine failures (codes `100..=116`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CommonError {
    /// The n-th parameter of the native call was rejected (1-based).
    #[error("invalid_parameter_{0}")]
    InvalidParameter(u8),
    /// The engine reached an internal state it considers a bug.
    #[error("invalid_internal_state")]
    InvalidInternalState,
    /// A structured payload did not have the expected shape.
    #[error("invalid_structure")]
    InvalidStructure,
    /// An I/O operation of the engine failed.
    #[error("io")]
    Io,
}

impl CommonError {
    /// Looks up a common error by its numeric code.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            // 100..=111 are parameters 1..=12, 115 and 116 were appended later.
            100..=111 => Some(Self::InvalidParameter((code - 99) as u8)),
            115 => Some(Self::InvalidParameter(13)),
            116 => Some(Self::InvalidParameter(14)),
            112 => Some(Self::InvalidInternalState),
            113 => Some(Self::InvalidStructure),
            114 => Some(Self::Io),
            _ => None,
        }
    }

    /// Numeric code of this error. Parameter indices outside `1..=14` have no
    /// code of their own and report as the invalid internal state code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidParameter(index @ 1..=12) => 99 + index as i32,
            Self::InvalidParameter(13) => 115,
            Self::InvalidParameter(14) => 116,
            Self::InvalidParameter(_) | Self::InvalidInternalState => 112,
            Self::InvalidStructure => 113,
            Self::Io => 114,
        }
    }
}

/// Wallet storage failures (codes `200..=214`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, FromRepr)]
#[repr(i32)]
pub enum WalletError {
    /// The wallet or search handle is not (or no longer) valid.
    #[error("wallet_invalid_handle")]
    InvalidHandle = 200,
    /// Unknown wallet storage type.
    #[error("wallet_unknown_type")]
    UnknownType = 201,
    /// The wallet storage type is already registered.
    #[error("wallet_type_already_registered")]
    TypeAlreadyRegistered = 202,
    /// A wallet with this name already exists.
    #[error("wallet_already_exists")]
    AlreadyExists = 203,
    /// The wallet was not found.
    #[error("wallet_not_found")]
    NotFound = 204,
    /// The wallet belongs to a different pool.
    #[error("wallet_incompatible_pool")]
    IncompatiblePool = 205,
    /// The wallet is already open.
    #[error("wallet_already_opened")]
    AlreadyOpened = 206,
    /// Wrong wallet credentials.
    #[error("wallet_access_failed")]
    AccessFailed = 207,
    /// Invalid wallet input.
    #[error("wallet_input_invalid")]
    InputInvalid = 208,
    /// Stored data could not be decoded.
    #[error("wallet_decoding")]
    Decoding = 209,
    /// The storage backend failed.
    #[error("wallet_storage")]
    Storage = 210,
    /// Encryption or decryption of stored data failed.
    #[error("wallet_encryption")]
    Encryption = 211,
    /// The requested record does not exist.
    #[error("wallet_item_not_found")]
    ItemNotFound = 212,
    /// A record with the same type and id already exists.
    #[error("wallet_item_already_exists")]
    ItemAlreadyExists = 213,
    /// The filter could not be parsed or is not supported for the tags used.
    #[error("wallet_query_error")]
    QueryError = 214,
}

/// Ledger pool failures (codes `300..=309`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, FromRepr)]
#[repr(i32)]
pub enum PoolError {
    /// The pool ledger config was never created.
    #[error("pool_ledger_not_created")]
    LedgerNotCreated = 300,
    /// The pool handle is not valid.
    #[error("pool_invalid_handle")]
    InvalidHandle = 301,
    /// The pool connection was terminated.
    #[error("pool_terminated")]
    Terminated = 302,
    /// The ledger nodes did not reach consensus.
    #[error("pool_no_consensus")]
    NoConsensus = 303,
    /// The ledger rejected the transaction.
    #[error("pool_invalid_transaction")]
    InvalidTransaction = 304,
    /// The caller lacks permission for the transaction.
    #[error("pool_security")]
    Security = 305,
    /// A pool config with this name already exists.
    #[error("pool_config_already_exists")]
    ConfigAlreadyExists = 306,
    /// The pool request timed out.
    #[error("pool_timeout")]
    Timeout = 307,
    /// The ledger speaks an incompatible protocol version.
    #[error("pool_incompatible_protocol")]
    IncompatibleProtocol = 308,
    /// The requested ledger entry was not found.
    #[error("pool_not_found")]
    NotFound = 309,
}

/// Anonymous credential failures (codes `400..=407`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, FromRepr)]
#[repr(i32)]
pub enum AnonCredsError {
    /// The revocation registry is full.
    #[error("anoncreds_revocation_registry_full")]
    RevocationRegistryFull = 400,
    /// The user revocation index is invalid.
    #[error("anoncreds_invalid_user_revocation_id")]
    InvalidUserRevocationId = 401,
    /// The accumulator is full.
    #[error("anoncreds_accumulator_full")]
    AccumulatorFull = 402,
    /// A master secret with this name already exists.
    #[error("anoncreds_master_secret_duplicate_name")]
    MasterSecretDuplicateName = 404,
    /// The proof was rejected.
    #[error("anoncreds_proof_rejected")]
    ProofRejected = 405,
    /// The credential has been revoked.
    #[error("anoncreds_credential_revoked")]
    CredentialRevoked = 406,
    /// The credential definition already exists.
    #[error("anoncreds_credential_definition_already_exists")]
    CredentialDefinitionAlreadyExists = 407,
}

/// Crypto failures (code `500`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, FromRepr)]
#[repr(i32)]
pub enum CryptoError {
    /// The requested crypto type is not supported.
    #[error("crypto_unknown_type")]
    UnknownType = 500,
}

/// DID failures (code `600`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, FromRepr)]
#[repr(i32)]
pub enum DidError {
    /// The DID already exists in the wallet.
    #[error("did_already_exists")]
    AlreadyExists = 600,
}

/// Payment plugin failures (codes `700..=706`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, FromRepr)]
#[repr(i32)]
pub enum PaymentError {
    /// No payment method registered for the address.
    #[error("payment_unknown_method")]
    UnknownMethod = 700,
    /// Inputs from incompatible payment methods were mixed.
    #[error("payment_incompatible_method")]
    IncompatibleMethod = 701,
    /// Not enough funds on the inputs.
    #[error("payment_insufficient_funds")]
    InsufficientFunds = 702,
    /// A payment source does not exist.
    #[error("payment_source_does_not_exist")]
    SourceDoesNotExist = 703,
    /// The payment method does not support the operation.
    #[error("payment_operation_not_supported")]
    OperationNotSupported = 704,
    /// More funds on the inputs than outputs and fees.
    #[error("payment_extra_funds")]
    ExtraFunds = 705,
    /// The transaction is not allowed to a payment address.
    #[error("payment_transaction_not_allowed")]
    TransactionNotAllowed = 706,
}

/// Every way a bridged operation can fail.
///
/// Store failures keep their subsystem grouping; `Encoding`, `Decoding` and
/// `InvalidState` are raised by this crate, `Unknown` keeps codes the taxonomy
/// does not know yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum ErrorKind {
    /// Generic engine failure.
    #[error(transparent)]
    Common(#[from] CommonError),
    /// Wallet storage failure, including filter and cursor errors.
    #[error(transparent)]
    Wallet(#[from] WalletError),
    /// Ledger pool failure.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Anonymous credential failure.
    #[error(transparent)]
    AnonCreds(#[from] AnonCredsError),
    /// Crypto failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// DID failure.
    #[error(transparent)]
    Did(#[from] DidError),
    /// Payment plugin failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),
    /// A request payload could not be serialized.
    #[error("encoding_error: {0}")]
    Encoding(String),
    /// A response payload could not be parsed.
    #[error("decoding_error: {0}")]
    Decoding(String),
    /// The store reported success without the payload the operation promises.
    #[error("invalid_state")]
    InvalidState,
    /// The store reported a code this taxonomy does not know.
    #[error("unknown_error_code: {0}")]
    Unknown(i32),
}

impl ErrorKind {
    /// Maps a non-zero store status code to its semantic kind.
    ///
    /// [`SUCCESS_CODE`] is not a failure and maps to `Unknown(0)`; callers are
    /// expected to check for success first.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        if let Some(error) = CommonError::from_code(code) {
            return Self::Common(error);
        }
        match code / 100 {
            2 => WalletError::from_repr(code).map(Self::Wallet),
            3 => PoolError::from_repr(code).map(Self::Pool),
            4 => AnonCredsError::from_repr(code).map(Self::AnonCreds),
            5 => CryptoError::from_repr(code).map(Self::Crypto),
            6 => DidError::from_repr(code).map(Self::Did),
            7 => PaymentError::from_repr(code).map(Self::Payment),
            _ => None,
        }
        .unwrap_or(Self::Unknown(code))
    }

    /// Numeric store code of this error, `None` for failures raised by this
    /// crate.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Common(error) => Some(error.code()),
            Self::Wallet(error) => Some(*error as i32),
            Self::Pool(error) => Some(*error as i32),
            Self::AnonCreds(error) => Some(*error as i32),
            Self::Crypto(error) => Some(*error as i32),
            Self::Did(error) => Some(*error as i32),
            Self::Payment(error) => Some(*error as i32),
            Self::Unknown(code) => Some(*code),
            Self::Encoding(_) | Self::Decoding(_) | Self::InvalidState => None,
        }
    }

    /// Subsystem the failure originates from.
    #[must_use]
    pub const fn subsystem(&self) -> Subsystem {
        match self {
            Self::Common(_) | Self::Unknown(_) => Subsystem::Common,
            Self::Wallet(_) => Subsystem::Wallet,
            Self::Pool(_) => Subsystem::Pool,
            Self::AnonCreds(_) => Subsystem::AnonCreds,
            Self::Crypto(_) => Subsystem::Crypto,
            Self::Did(_) => Subsystem::Did,
            Self::Payment(_) => Subsystem::Payment,
            Self::Encoding(_) | Self::Decoding(_) | Self::InvalidState => Subsystem::Wrapper,
        }
    }
}
