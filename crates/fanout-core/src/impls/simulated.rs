//! SimulatedWorkload - sleep するだけのタスク本体
//!
//! `uniform(1, 3) * complexity * time_unit` だけ待って
//! `"{name} result {NNN}"` を返す。

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::TaskSpec;
use crate::ports::{Workload, WorkloadError};

#[derive(Debug, Clone)]
pub struct SimulatedWorkload {
    time_unit: Duration,
    seed: Option<u64>,
    failure_rate: f64,
}

impl SimulatedWorkload {
    pub fn new(time_unit: Duration) -> Self {
        Self {
            time_unit,
            seed: None,
            failure_rate: 0.0,
        }
    }

    /// Same seed + same task name => same duration and result.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Probability (clamped to `[0, 1]`) that a task fails instead of
    /// producing a result.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    pub fn time_unit(&self) -> Duration {
        self.time_unit
    }

    fn rng_for(&self, name: &str) -> StdRng {
        match self.seed {
            Some(seed) => {
                let mut hasher = DefaultHasher::new();
                name.hash(&mut hasher);
                StdRng::seed_from_u64(seed ^ hasher.finish())
            }
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for SimulatedWorkload {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Workload for SimulatedWorkload {
    async fn run(&self, spec: &TaskSpec) -> Result<String, WorkloadError> {
        // 乱数は await の前に全部引いておく
        let (delay, fails, value) = {
            let mut rng = self.rng_for(spec.name());
            let factor: f64 = rng.gen_range(1.0..3.0);
            let secs = self.time_unit.as_secs_f64() * factor * f64::from(spec.complexity());
            let fails = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
            (Duration::try_from_secs_f64(secs), fails, rng.gen_range(100..=999))
        };
        let delay = delay.map_err(|_| {
            WorkloadError::new(format!(
                "{}: simulated duration overflows ({:?} x complexity {})",
                spec.name(),
                self.time_unit,
                spec.complexity()
            ))
        })?;

        tokio::time::sleep(delay).await;

        if fails {
            return Err(WorkloadError::new(format!(
                "{} failed after {}ms",
                spec.name(),
                delay.as_millis()
            )));
        }
        Ok(format!("{} result {}", spec.name(), value))
    }
}
