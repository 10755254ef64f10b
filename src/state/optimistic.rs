use std::future::Future;

/// A local state change applied ahead of the remote effect it mirrors.
///
/// `apply` runs before the remote future is polled; `revert` runs only when the
/// remote effect fails, after which the error is handed back to the caller.
pub struct OptimisticCommand<A, R> {
    apply: A,
    revert: R,
}

impl<A, R> OptimisticCommand<A, R>
where
    A: FnOnce(),
    R: FnOnce(),
{
    /// Pair a local transition with its inverse.
    pub fn new(apply: A, revert: R) -> Self {
        Self { apply, revert }
    }

    /// Apply locally, await `remote`, and compensate on failure.
    pub async fn run<Fut, T, E>(self, remote: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        (self.apply)();
        match remote.await {
            Ok(value) => Ok(value),
            Err(err) => {
                (self.revert)();
                Err(err)
            }
        }
    }
}
