use metrics_core::Metric;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

/// The 27 field names the original Go agent reads off `runtime.MemStats`. Kept as a
/// fixed allow-list so downstream consumers (dashboards, alerts keyed by name) see a
/// stable schema regardless of which runtime produced the numbers.
pub const FIELD_NAMES: [&str; 27] = [
    "Alloc",
    "BuckHashSys",
    "Frees",
    "GCCPUFraction",
    "GCSys",
    "HeapAlloc",
    "HeapIdle",
    "HeapInuse",
    "HeapObjects",
    "HeapReleased",
    "HeapSys",
    "LastGC",
    "Lookups",
    "MCacheInuse",
    "MCacheSys",
    "MSpanInuse",
    "MSpanSys",
    "Mallocs",
    "NextGC",
    "NumForcedGC",
    "NumGC",
    "OtherSys",
    "PauseTotalNs",
    "StackInuse",
    "StackSys",
    "Sys",
    "TotalAlloc",
];

/// Samples the subset of the allow-list that has a natural source in a native process
/// (resident and virtual memory, by way of the fields that played the analogous role in
/// the original Go runtime stats). Every other name is still emitted, as a constant zero
/// gauge, so the schema stays stable for any downstream consumer keyed by field name.
pub struct RuntimeSampler {
    system: System,
    pid: Pid,
}

impl RuntimeSampler {
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let system = System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing().with_memory()),
        );
        Self { system, pid }
    }

    pub fn sample(&mut self) -> Vec<Metric> {
        self.system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[self.pid]), true);
        let (resident, virtual_mem) = self
            .system
            .process(self.pid)
            .map(|p| (p.memory() as f64, p.virtual_memory() as f64))
            .unwrap_or((0.0, 0.0));

        FIELD_NAMES
            .iter()
            .map(|&name| {
                let value = match name {
                    "Alloc" | "HeapAlloc" | "TotalAlloc" => resident,
                    "Sys" | "HeapSys" | "HeapIdle" | "HeapInuse" => virtual_mem,
                    _ => 0.0,
                };
                Metric::Gauge { id: name.to_string(), value }
            })
            .collect()
    }
}

impl Default for RuntimeSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_every_allow_listed_field() {
        let mut sampler = RuntimeSampler::new();
        let sample = sampler.sample();
        assert_eq!(sample.len(), FIELD_NAMES.len());
        for name in FIELD_NAMES {
            assert!(sample.iter().any(|m| m.id() == name), "missing field {name}");
        }
    }
}
