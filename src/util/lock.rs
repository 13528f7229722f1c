//! Lock accessors that recover from poisoning.
//!
//! A renderer panic on another thread must not take the shared registries or
//! template store down with it; the guarded maps stay structurally valid, so
//! the poisoned guard is reused after a warning.

use std::sync::{
    LockResult, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use tracing::warn;

/// Which accessor hit the poisoned lock, for the recovery log.
#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
    Lock,
}

impl Access {
    fn as_str(self) -> &'static str {
        match self {
            Access::Read => "rwlock.read",
            Access::Write => "rwlock.write",
            Access::Lock => "mutex.lock",
        }
    }
}

fn recover<G>(result: LockResult<G>, access: Access, owner: &'static str, op: &'static str) -> G {
    result.unwrap_or_else(|poisoned: PoisonError<G>| {
        warn!(
            target = "util::lock",
            owner,
            op,
            access = access.as_str(),
            "Poisoned lock recovered; continuing with inner state"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), Access::Read, owner, op)
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), Access::Write, owner, op)
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    owner: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    recover(lock.lock(), Access::Lock, owner, op)
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    #[test]
    fn read_and_write_survive_poisoning() {
        let lock = RwLock::new(vec![1]);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.write().expect("lock should be acquired");
            panic!("poison the lock");
        }));

        assert!(lock.is_poisoned());
        rw_write(&lock, "util::lock", "test").push(2);
        assert_eq!(*rw_read(&lock, "util::lock", "test"), vec![1, 2]);
    }

    #[test]
    fn mutex_survives_poisoning() {
        let lock = Mutex::new(0);

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.lock().expect("lock should be acquired");
            panic!("poison the mutex");
        }));

        *mutex_lock(&lock, "util::lock", "test") += 1;
        assert_eq!(*mutex_lock(&lock, "util::lock", "test"), 1);
    }
}
