use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// Selects the JSON formatter when set to `json`.
pub const ENV_LOG_FORMAT: &str = "SOLVEGATE_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info,solvegate_web=debug";

/// One captured event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Captures events in memory so tests can assert on what was logged.
#[derive(Debug, Clone)]
pub struct TestLogSubscriber {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Default for TestLogSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLogSubscriber {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn find(&self, message: &str) -> Option<LogEntry> {
        self.lock()
            .iter()
            .find(|e| e.message.contains(message))
            .cloned()
    }

    pub fn into_layer<S>(self) -> TestLayer<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        TestLayer {
            subscriber: self,
            _phantom: PhantomData,
        }
    }
}

pub struct TestLayer<S> {
    subscriber: TestLogSubscriber,
    _phantom: PhantomData<S>,
}

impl<S> Layer<S> for TestLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.subscriber.lock().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let value_str = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value_str);
        } else {
            self.fields.push((field.name().to_string(), value_str));
        }
    }
}

/// Installs the process-wide subscriber.
///
/// Filtering follows `RUST_LOG`. Output is human-readable unless
/// `SOLVEGATE_LOG_FORMAT=json`. Calling this twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init_logging() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = json_requested(std::env::var(ENV_LOG_FORMAT).ok().as_deref());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

fn json_requested(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

/// Installs a capturing subscriber once per test binary and returns it
/// with its buffer cleared.
pub fn init_test_logging() -> TestLogSubscriber {
    static SUBSCRIBER: OnceLock<TestLogSubscriber> = OnceLock::new();
    static REGISTERED: OnceLock<()> = OnceLock::new();

    let subscriber = SUBSCRIBER.get_or_init(TestLogSubscriber::new);

    REGISTERED.get_or_init(|| {
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);
        let _ = tracing::subscriber::set_global_default(registry);
    });

    subscriber.clear();
    subscriber.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, error, info, warn};

    fn capture<F: FnOnce()>(f: F) -> Vec<LogEntry> {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        tracing::subscriber::with_default(registry, f);
        subscriber.entries()
    }

    #[test]
    fn captures_levels_in_order() {
        let entries = capture(|| {
            debug!("debug message");
            info!("info message");
            warn!("warn message");
            error!("error message");
        });

        let levels: Vec<Level> = entries.iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR]
        );
        assert!(entries[1].message.contains("info message"));
    }

    #[test]
    fn captures_structured_fields() {
        let entries = capture(|| {
            info!(solve_id = "abc123", board = "Qs,Jh,2h", "solve started");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("solve_id"), Some("abc123"));
        assert_eq!(entries[0].field("board"), Some("Qs,Jh,2h"));
    }

    #[test]
    fn json_format_is_opt_in() {
        assert!(json_requested(Some("json")));
        assert!(json_requested(Some(" JSON ")));
        assert!(!json_requested(Some("pretty")));
        assert!(!json_requested(Some("")));
        assert!(!json_requested(None));
    }

    #[test]
    #[serial_test::serial]
    fn json_format_follows_the_environment() {
        let previous = std::env::var(ENV_LOG_FORMAT).ok();

        std::env::set_var(ENV_LOG_FORMAT, "json");
        assert!(json_requested(std::env::var(ENV_LOG_FORMAT).ok().as_deref()));
        std::env::remove_var(ENV_LOG_FORMAT);
        assert!(!json_requested(std::env::var(ENV_LOG_FORMAT).ok().as_deref()));

        if let Some(value) = previous {
            std::env::set_var(ENV_LOG_FORMAT, value);
        }
    }

    #[test]
    fn clear_drops_previous_entries() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        tracing::subscriber::with_default(registry, || info!("first message"));
        assert_eq!(subscriber.entries().len(), 1);

        subscriber.clear();
        assert!(subscriber.entries().is_empty());
        assert!(subscriber.find("first message").is_none());
    }
}
