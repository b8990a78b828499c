use std::{thread, time::Duration};

/// Blocking wait used by `sleep` steps.
pub trait Delay {
    fn wait(&self, duration: Duration);
}

impl<F> Delay for F
where
    F: Fn(Duration),
{
    fn wait(&self, duration: Duration) {
        self(duration)
    }
}

/// Sleeps the calling thread for the full duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn wait(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
