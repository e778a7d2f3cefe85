use std::cell::Cell;

use scan_engine::{with_scoped, Closable, ScanError};

struct Tab<'a> {
    closed: &'a Cell<u32>,
}

impl Closable for Tab<'_> {
    fn close(&self) {
        self.closed.set(self.closed.get() + 1);
    }
}

#[test]
fn tab_is_closed_after_success() {
    let closed = Cell::new(0);
    let html = with_scoped(Tab { closed: &closed }, |tab| {
        assert_eq!(tab.closed.get(), 0);
        Ok::<_, ScanError>("<html></html>".to_string())
    });
    assert_eq!(html.unwrap(), "<html></html>");
    assert_eq!(closed.get(), 1);
}

#[test]
fn tab_is_closed_after_failure() {
    let closed = Cell::new(0);
    let result: Result<String, ScanError> = with_scoped(Tab { closed: &closed }, |_| {
        Err(ScanError::MissingElement("div".into()))
    });
    assert!(result.is_err());
    assert_eq!(closed.get(), 1);
}

#[test]
fn tab_is_closed_when_work_panics() {
    let closed = Cell::new(0);
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: u32 = with_scoped(Tab { closed: &closed }, |_| panic!("page crashed"));
    }));
    assert!(outcome.is_err());
    assert_eq!(closed.get(), 1);
}
