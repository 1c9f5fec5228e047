use metrics::atomics::AtomicU64;
use metrics::{
    Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder,
    SetRecorderError, SharedString, Unit, counter,
};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Error/Reliability Metrics - Success/Failure pairs, labelled by remote service
pub fn increment_api_success(service: &'static str) {
    counter!(api_counter(service), "result" => "success").increment(1);
}

pub fn increment_api_failure(service: &'static str) {
    counter!(api_counter(service), "result" => "failure").increment(1);
}

fn api_counter(service: &'static str) -> &'static str {
    match service {
        "garmin" => "garmin_api_total",
        "strava" => "strava_api_total",
        _ => "other_api_total",
    }
}

/// Business Logic Metrics
pub fn increment_activities_uploaded() {
    counter!("activities_uploaded_total").increment(1);
}

pub fn increment_activities_skipped() {
    counter!("activities_skipped_total").increment(1);
}

pub fn increment_activities_failed() {
    counter!("activities_failed_total").increment(1);
}

/// In-process recorder that keeps counter totals and timing sums for one run.
///
/// Series are named `name{label=value,...}`. Gauges are ignored.
#[derive(Clone, Default)]
pub struct RunTotals {
    counters: Arc<Mutex<BTreeMap<String, Arc<AtomicU64>>>>,
    timings: Arc<Mutex<BTreeMap<String, Arc<Timing>>>>,
}

#[derive(Default)]
struct Timing {
    samples: Mutex<(u64, f64)>,
}

impl HistogramFn for Timing {
    fn record(&self, value: f64) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.0 += 1;
            samples.1 += value;
        }
    }
}

impl RunTotals {
    /// Installs a handle as the global recorder and returns another for reading.
    pub fn install() -> Result<Self, SetRecorderError<Self>> {
        let totals = Self::default();
        metrics::set_global_recorder(totals.clone())?;
        Ok(totals)
    }

    /// Current total of a counter series, 0 when it was never touched.
    pub fn counter(&self, series: &str) -> u64 {
        self.counters
            .lock()
            .ok()
            .and_then(|counters| counters.get(series).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    pub fn log_summary(&self) {
        if let Ok(counters) = self.counters.lock() {
            for (series, value) in counters.iter() {
                debug!("{} = {}", series, value.load(Ordering::Relaxed));
            }
        }
        if let Ok(timings) = self.timings.lock() {
            for (series, timing) in timings.iter() {
                if let Ok(samples) = timing.samples.lock() {
                    debug!("{} = {} samples, {:.3} total", series, samples.0, samples.1);
                }
            }
        }
    }
}

fn series_name(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl Recorder for RunTotals {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        match self.counters.lock() {
            Ok(mut counters) => Counter::from_arc(
                counters
                    .entry(series_name(key))
                    .or_insert_with(|| Arc::new(AtomicU64::new(0)))
                    .clone(),
            ),
            Err(_) => Counter::noop(),
        }
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
        match self.timings.lock() {
            Ok(mut timings) => Histogram::from_arc(
                timings.entry(series_name(key)).or_default().clone(),
            ),
            Err(_) => Histogram::noop(),
        }
    }
}
