//! Thread-local run context
//!
//! Each thread owns one optional run identifier. Records created on a thread
//! pick up that thread's value; other threads never see it.

use std::cell::RefCell;

thread_local! {
    static RUN_ID: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Set the run identifier for the calling thread, replacing any previous one
pub fn set_run_context(run_id: impl Into<String>) {
    let run_id = run_id.into();
    RUN_ID.with(|slot| *slot.borrow_mut() = Some(run_id));
}

/// Current run identifier of the calling thread, if one was set
pub fn get_run_context() -> Option<String> {
    RUN_ID.with(|slot| slot.borrow().clone())
}

/// Reset the calling thread's run identifier
pub fn clear_run_context() {
    RUN_ID.with(|slot| *slot.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_absent_on_fresh_thread() {
        let seen = thread::spawn(get_run_context).join().unwrap();
        assert_eq!(seen, None);
    }

    #[test]
    fn test_set_then_get_latest() {
        thread::spawn(|| {
            set_run_context("first");
            assert_eq!(get_run_context().as_deref(), Some("first"));
            set_run_context("second");
            assert_eq!(get_run_context().as_deref(), Some("second"));
            clear_run_context();
            assert_eq!(get_run_context(), None);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_not_visible_across_threads() {
        let (set_tx, set_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let owner = thread::spawn(move || {
            set_run_context("owner-run");
            set_tx.send(()).unwrap();
            done_rx.recv().unwrap();
            get_run_context()
        });

        set_rx.recv().unwrap();
        let other = thread::spawn(get_run_context).join().unwrap();
        done_tx.send(()).unwrap();

        assert_eq!(other, None);
        assert_eq!(owner.join().unwrap().as_deref(), Some("owner-run"));
    }
}
