use std::cell::{
  Cell,
  RefCell
};
use std::rc::Rc;

#[derive(Default)]
struct Inner {
  cancelled: Cell<bool>,
  on_cancel: RefCell<Vec<Box<dyn FnOnce()>>>
}

/// Shared cancellation flag threaded
/// through a collaborator call.
/// Transports register `on_cancel`
/// hooks to abort in-flight work.
#[derive(Clone, Default)]
pub struct CancelToken {
  inner: Rc<Inner>
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_cancelled(&self) -> bool {
    self.inner.cancelled.get()
  }

  pub fn cancel(&self) {
    if self.inner.cancelled.replace(true) {
      return;
    }
    let hooks = std::mem::take(
      &mut *self.inner.on_cancel.borrow_mut()
    );
    for hook in hooks {
      hook();
    }
  }

  /// Runs `hook` on cancellation, or
  /// right away if already cancelled.
  pub fn on_cancel(
    &self,
    hook: impl FnOnce() + 'static
  ) {
    if self.is_cancelled() {
      hook();
    } else {
      self
        .inner
        .on_cancel
        .borrow_mut()
        .push(Box::new(hook));
    }
  }
}

impl std::fmt::Debug for CancelToken {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    f.debug_struct("CancelToken")
      .field(
        "cancelled",
        &self.is_cancelled()
      )
      .finish()
  }
}
