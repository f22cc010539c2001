use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// A named variable.
///
/// Every symbol gets a process-unique serial at construction. Symbols compare
/// by serial, so two symbols that share a name are still different variables
/// unless they are the same symbol.
#[derive(Clone, Debug)]
pub struct Symbol {
    name: String,
    serial: u64,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: next_serial(),
        }
    }

    /// Symbol named after its own serial.
    pub fn anonymous() -> Self {
        let serial = next_serial();
        Self {
            name: format!("symbol{serial}"),
            serial,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn next_serial() -> u64 {
    NEXT_SERIAL.fetch_add(1, Ordering::Relaxed)
}
