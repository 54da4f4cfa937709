use metrics_core::Metric;
use sysinfo::System;

/// Samples host-wide memory and per-CPU utilisation. Two refreshes separated by
/// `sysinfo`'s minimum CPU sampling interval are needed for `cpu_usage()` to report a
/// meaningful delta; a ten-second wait would dominate the poll ticker this sampler shares
/// with the others, so the shorter interval is used instead.
pub struct HostSampler {
    system: System,
}

impl HostSampler {
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_cpu_usage();
        Self { system }
    }

    pub async fn sample(&mut self) -> Vec<Metric> {
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let mut metrics = vec![
            Metric::Gauge { id: "TotalMemory".into(), value: self.system.total_memory() as f64 },
            Metric::Gauge { id: "FreeMemory".into(), value: self.system.free_memory() as f64 },
        ];
        for (idx, cpu) in self.system.cpus().iter().enumerate() {
            metrics.push(Metric::Gauge {
                id: format!("CPUutilization{}", idx + 1),
                value: cpu.cpu_usage() as f64,
            });
        }
        metrics
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_memory_and_per_cpu_gauges() {
        let mut sampler = HostSampler::new();
        let sample = sampler.sample().await;
        assert!(sample.iter().any(|m| m.id() == "TotalMemory"));
        assert!(sample.iter().any(|m| m.id() == "FreeMemory"));
        assert!(sample.iter().any(|m| m.id().starts_with("CPUutilization")));
    }
}
