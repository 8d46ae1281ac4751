//! Single-shot bridge between callback-style store calls and `async` code.
//!
//! The record store reports the outcome of every call through a
//! [`CompletionSink`]: a numeric status code plus an optional payload. The
//! sink is consumed when completed, so a store cannot resume a caller twice.
//! [`invoke`] issues one call and awaits its completion.

use tokio::sync::oneshot;

use crate::error::{CommonError, ErrorKind, VaultQueryResult, SUCCESS_CODE};

struct Completion<T> {
    code: i32,
    payload: Option<T>,
}

/// Receives the outcome of exactly one store call.
///
/// May be moved to and completed from any thread.
#[must_use = "the caller stays suspended until the sink is completed"]
pub struct CompletionSink<T> {
    tx: oneshot::Sender<Completion<T>>,
}

impl<T> CompletionSink<T> {
    /// Reports the raw outcome of the call: a status code (`0` on success) and
    /// the payload, if any.
    pub fn complete(self, code: i32, payload: Option<T>) {
        if self.tx.send(Completion { code, payload }).is_err() {
            log::debug!("store completion with code {code} dropped: caller no longer waiting");
        }
    }

    /// Reports success with `value`.
    pub fn succeed(self, value: T) {
        self.complete(SUCCESS_CODE, Some(value));
    }

    /// Reports failure with a non-zero status `code`.
    pub fn fail(self, code: i32) {
        self.complete(code, None);
    }

    /// Reports `result`, sending the payload on success and the error's code
    /// on failure.
    ///
    /// Failures raised by this crate carry no store code and are reported as
    /// the engine's invalid internal state.
    pub fn resolve(self, result: VaultQueryResult<T>) {
        match result {
            Ok(value) => self.succeed(value),
            Err(error) => self.fail(error.code().unwrap_or(INVALID_INTERNAL_STATE)),
        }
    }
}

impl CompletionSink<()> {
    /// Reports the status of a call that carries no payload.
    pub fn finish(self, code: i32) {
        self.complete(code, Some(()));
    }
}

const INVALID_INTERNAL_STATE: i32 = CommonError::InvalidInternalState.code();

/// Issues one store call and waits for its single completion.
///
/// `call` receives the sink and must arrange for it to be completed, either
/// before returning or later from another thread. The bridge neither retries
/// nor times out.
///
/// # Errors
///
/// - the taxonomy kind of a non-zero status code, [`ErrorKind::Unknown`] for
///   codes it does not know;
/// - [`ErrorKind::InvalidState`] if the store reports success without a
///   payload, or drops the sink without completing it.
pub async fn invoke<T, F>(call: F) -> VaultQueryResult<T>
where
    T: Send,
    F: FnOnce(CompletionSink<T>),
{
    let (tx, rx) = oneshot::channel();
    call(CompletionSink { tx });

    let Ok(Completion { code, payload }) = rx.await else {
        log::warn!("record store dropped a completion sink without reporting a result");
        return Err(ErrorKind::InvalidState);
    };

    if code != SUCCESS_CODE {
        return Err(ErrorKind::from_code(code));
    }
    payload.ok_or_else(|| {
        log::warn!("record store reported success without a payload");
        ErrorKind::InvalidState
    })
}
