#![allow(dead_code)]

pub mod fixtures {
    use faultline::{ErrorKind, Fault, KindHierarchy};
    use std::fmt;

    pub const ARITHMETIC: ErrorKind = ErrorKind::new("ArithmeticError");
    pub const ZERO_DIVISION: ErrorKind = ErrorKind::new("ZeroDivisionError");
    pub const OVERFLOW: ErrorKind = ErrorKind::new("OverflowError");
    pub const LOOKUP: ErrorKind = ErrorKind::new("LookupError");
    pub const KEY: ErrorKind = ErrorKind::new("KeyError");
    pub const VALUE: ErrorKind = ErrorKind::new("ValueError");
    pub const RUNTIME: ErrorKind = ErrorKind::new("RuntimeError");

    /// Error → {Arithmetic → {ZeroDivision, Overflow}, Lookup → Key, Value, Runtime}
    pub fn hierarchy() -> KindHierarchy {
        KindHierarchy::builder()
            .kind(ARITHMETIC, ErrorKind::ROOT)
            .and_then(|b| b.kind(ZERO_DIVISION, ARITHMETIC))
            .and_then(|b| b.kind(OVERFLOW, ARITHMETIC))
            .and_then(|b| b.kind(LOOKUP, ErrorKind::ROOT))
            .and_then(|b| b.kind(KEY, LOOKUP))
            .and_then(|b| b.kind(VALUE, ErrorKind::ROOT))
            .and_then(|b| b.kind(RUNTIME, ErrorKind::ROOT))
            .map(|b| b.build())
            .expect("fixture hierarchy is valid")
    }

    #[derive(Debug, Clone, PartialEq, Eq, Fault)]
    pub enum TestError {
        #[fault(kind = ZERO_DIVISION)]
        ZeroDivision,
        #[fault(kind = OVERFLOW)]
        Overflow,
        #[fault(kind = KEY)]
        Key(String),
        #[fault(kind = VALUE)]
        Value(String),
        #[fault(kind = RUNTIME)]
        Runtime(String),
        /// Both a missing key and a bad value
        #[fault(kind = KEY, also = [VALUE])]
        BadKeyValue,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TestError::ZeroDivision => f.write_str("division by zero"),
                TestError::Overflow => f.write_str("numeric overflow"),
                TestError::Key(k) => write!(f, "missing key '{k}'"),
                TestError::Value(v) => write!(f, "bad value '{v}'"),
                TestError::Runtime(m) => write!(f, "runtime failure: {m}"),
                TestError::BadKeyValue => f.write_str("bad key and value"),
            }
        }
    }

    impl std::error::Error for TestError {}
}

pub mod sink {
    use faultline::sink::{FailureContext, FailureSink};
    use faultline::ErrorKind;
    use parking_lot::Mutex;

    /// One failure reported to the sink
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Recorded {
        pub operation: String,
        pub kind: ErrorKind,
        pub matched: ErrorKind,
        pub bind_name: Option<String>,
        pub message: String,
    }

    /// Sink that keeps every reported failure for assertions
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        records: Mutex<Vec<Recorded>>,
    }

    impl RecordingSink {
        pub fn records(&self) -> Vec<Recorded> {
            self.records.lock().clone()
        }

        pub fn len(&self) -> usize {
            self.records.lock().len()
        }
    }

    impl FailureSink for RecordingSink {
        fn log_failure(
            &self,
            error: &(dyn std::error::Error + 'static),
            context: &FailureContext<'_>,
        ) {
            self.records.lock().push(Recorded {
                operation: context.operation.to_string(),
                kind: context.kind,
                matched: context.matched,
                bind_name: context.bind_name.map(str::to_string),
                message: error.to_string(),
            });
        }
    }
}

pub mod engine {
    use super::fixtures::{hierarchy, TestError};
    use super::sink::RecordingSink;
    use faultline::Engine;
    use std::sync::Arc;

    pub type TestEngine<A> = Engine<A, String, TestError>;

    /// Fixture-hierarchy engine reporting to a fresh [`RecordingSink`]
    pub fn engine<A>(debug: bool) -> (TestEngine<A>, Arc<RecordingSink>)
    where
        A: Clone + Send + Sync + 'static,
    {
        let sink = Arc::new(RecordingSink::default());
        let engine = Engine::new(hierarchy(), Arc::clone(&sink) as _, debug);
        (engine, sink)
    }
}

pub mod flags {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Shared "was it called" flag for closures
    #[derive(Debug, Clone, Default)]
    pub struct Called(Arc<AtomicBool>);

    impl Called {
        pub fn hit(&self) {
            self.0.store(true, Ordering::SeqCst);
        }

        pub fn get(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Shared call counter for closures
    #[derive(Debug, Clone, Default)]
    pub struct Counter(Arc<AtomicUsize>);

    impl Counter {
        pub fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }
}
