use super::*;

/// Raised when the host abandons a resolution request.
///
/// This is a control signal, not a data error: every recursive step checks
/// the token and bails out with `?` instead of returning a partial result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("resolution cancelled")]
pub struct Cancelled;

#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  pub fn cancel(&self) {
    self.0.store(true, AtomicOrdering::SeqCst);
  }

  pub fn check(&self) -> Result<(), Cancelled> {
    if self.is_cancelled() {
      Err(Cancelled)
    } else {
      Ok(())
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(AtomicOrdering::SeqCst)
  }

  pub fn new() -> Self {
    Self::default()
  }
}

/// Cancels the wrapped token when dropped, tying a blocking computation to
/// the lifetime of the request future that spawned it.
pub(crate) struct CancelOnDrop(pub(crate) CancellationToken);

impl Drop for CancelOnDrop {
  fn drop(&mut self) {
    self.0.cancel();
  }
}
