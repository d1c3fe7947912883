use core::fmt;

/// Receives a task's return value on the worker thread that ran it.
pub type ResultCallback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// A task, the data it runs on, and an optional result callback, erased into a
/// single job so one queue can carry tasks of any type.
pub struct WorkItem {
    job: Box<dyn FnOnce() + Send + 'static>,
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem").finish_non_exhaustive()
    }
}

impl WorkItem {
    pub fn new<D, T, F>(task: F, data: D, callback: Option<ResultCallback<T>>) -> Self
    where
        F: FnOnce(D) -> T + Send + 'static,
        D: Send + 'static,
        T: 'static,
    {
        Self {
            job: Box::new(move || {
                // The callback is dropped unrun if the task panics.
                let output = task(data);
                if let Some(callback) = callback {
                    callback(output);
                }
            }),
        }
    }

    /// A task with no data and no callback.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { job: Box::new(f) }
    }

    /// Run the task, then the callback. Consumes the item.
    pub fn run(self) {
        (self.job)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn callback_receives_output() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let item = WorkItem::new(
            |v: Vec<u8>| v.iter().map(|&b| u32::from(b)).sum::<u32>(),
            vec![1, 2, 3],
            Some(Box::new(move |sum: u32| *sink.lock().unwrap() = Some(sum))),
        );
        item.run();
        assert_eq!(*seen.lock().unwrap(), Some(6));
    }

    #[test]
    fn no_callback() {
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        WorkItem::new(move |n: i32| *h.lock().unwrap() += n, 5, None).run();
        assert_eq!(*hits.lock().unwrap(), 5);
    }

    #[test]
    fn unrun_item_drops_its_data() {
        let data = Arc::new(());
        let item = WorkItem::new(|_d: Arc<()>| (), Arc::clone(&data), None);
        assert_eq!(Arc::strong_count(&data), 2);
        drop(item);
        assert_eq!(Arc::strong_count(&data), 1);
    }
}
