use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("askstream.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("askstream.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("askstream.client.request_duration_seconds");

pub(crate) static STREAM_DELTAS: Counter = Counter::new("askstream.stream.deltas");
pub(crate) static STREAM_MALFORMED: Counter = Counter::new("askstream.stream.malformed_lines");
pub(crate) static STREAM_BYTES: Counter = Counter::new("askstream.stream.bytes");
pub(crate) static STREAM_DURATION: Moments = Moments::new("askstream.stream.duration_seconds");

pub(crate) static EXCHANGES_SETTLED: Counter = Counter::new("askstream.engine.exchanges_settled");
pub(crate) static EXCHANGES_FAILED: Counter = Counter::new("askstream.engine.exchanges_failed");
pub(crate) static STALE_DELTAS: Counter = Counter::new("askstream.engine.stale_deltas");

pub(crate) static HISTORY_REFRESHES: Counter = Counter::new("askstream.history.refreshes");
pub(crate) static HISTORY_REFRESH_FAILURES: Counter =
    Counter::new("askstream.history.refresh_failures");

pub(crate) static IDENTITY_SWITCHES: Counter = Counter::new("askstream.identity.switches");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_DELTAS);
    collector.register_counter(&STREAM_MALFORMED);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&EXCHANGES_SETTLED);
    collector.register_counter(&EXCHANGES_FAILED);
    collector.register_counter(&STALE_DELTAS);

    collector.register_counter(&HISTORY_REFRESHES);
    collector.register_counter(&HISTORY_REFRESH_FAILURES);

    collector.register_counter(&IDENTITY_SWITCHES);
}
