use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::CacheMapMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// This exporter writes in the Prometheus text exposition format so it can be
/// scraped by Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", suffix, value);
    }

    fn write_gauge(&self, suffix: &str, value: usize) {
        self.write_metric("gauge", suffix, value as u64);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<CacheMapMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &CacheMapMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_pinned_hits_total", snapshot.get_pinned_hits);
        self.write_counter("get_primary_hits_total", snapshot.get_primary_hits);
        self.write_counter("get_soft_hits_total", snapshot.get_soft_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("put_calls_total", snapshot.put_calls);
        self.write_counter("put_new_total", snapshot.put_new);
        self.write_counter("put_updates_total", snapshot.put_updates);
        self.write_counter("put_pinned_total", snapshot.put_pinned);
        self.write_counter("remove_calls_total", snapshot.remove_calls);
        self.write_counter("remove_found_total", snapshot.remove_found);
        self.write_counter("pin_calls_total", snapshot.pin_calls);
        self.write_counter("pin_found_total", snapshot.pin_found);
        self.write_counter("unpin_calls_total", snapshot.unpin_calls);
        self.write_counter("unpin_found_total", snapshot.unpin_found);
        self.write_counter("primary_overflows_total", snapshot.primary_overflows);
        self.write_counter("soft_demotions_total", snapshot.soft_demotions);
        self.write_counter("soft_overflows_total", snapshot.soft_overflows);
        self.write_counter("soft_promotions_total", snapshot.soft_promotions);
        self.write_counter("soft_reclaimed_total", snapshot.soft_reclaimed);
        self.write_counter("lock_timeouts_total", snapshot.lock_timeouts);
        self.write_counter("clears_total", snapshot.clears);
        self.write_gauge("pinned_len", snapshot.pinned_len);
        self.write_gauge("primary_len", snapshot.primary_len);
        self.write_gauge("soft_len", snapshot.soft_len);
        self.write_gauge("cache_size", snapshot.cache_size);
        self.write_gauge("soft_reference_size", snapshot.soft_reference_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_writes_prefixed_counters_and_gauges() {
        let exporter = PrometheusTextExporter::new("tiercache", Vec::new());
        let snapshot = CacheMapMetricsSnapshot {
            get_calls: 7,
            soft_promotions: 2,
            primary_len: 3,
            ..Default::default()
        };
        exporter.export(&snapshot);

        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("# TYPE tiercache_get_calls_total counter\ntiercache_get_calls_total 7\n"));
        assert!(text.contains("tiercache_soft_promotions_total 2\n"));
        assert!(text.contains("# TYPE tiercache_primary_len gauge\ntiercache_primary_len 3\n"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let exporter = PrometheusTextExporter::new("", Vec::new());
        exporter.export(&CacheMapMetricsSnapshot::default());
        let text = String::from_utf8(exporter.into_inner()).unwrap();
        assert!(text.contains("\nclears_total 0\n"));
    }
}
