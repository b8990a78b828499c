//! Async runtime helpers for blocking callers.
//!
//! The engine walks a workflow synchronously; only the process runner needs
//! Tokio (for child processes with a deadline). This module bridges the two.

use std::{future::Future, io, thread};

use tokio::{
    runtime::{Handle, RuntimeFlavor},
    task,
};

/// Execute an async future from synchronous code.
///
/// Reuses the current runtime when called from inside a multi-threaded Tokio
/// runtime. A current-thread runtime cannot block in place, so the future runs
/// on a dedicated thread with its own runtime. Outside Tokio a single-threaded
/// runtime is built for the call.
///
/// # Errors
/// Returns an error when a fallback runtime cannot be created or its thread
/// panics.
pub fn block_on_future<F, T>(future: F) -> io::Result<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(task::block_in_place(|| handle.block_on(future)))
        }
        Ok(_) => thread::spawn(move || block_on_fresh_runtime(future))
            .join()
            .map_err(|_| io::Error::other("async runtime thread panicked"))?,
        Err(_) => block_on_fresh_runtime(future),
    }
}

fn block_on_fresh_runtime<F, T>(future: F) -> io::Result<T>
where
    F: Future<Output = T>,
{
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}
