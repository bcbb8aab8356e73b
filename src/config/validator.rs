//! Configuration validation
//!
//! Everything here runs before the target is opened or any thread starts, so a
//! bad profile never produces partial IO.

use super::*;
use anyhow::{Context, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_workload(&config.workload)?;
    validate_target(&config.target)?;
    validate_runtime(&config.runtime)?;
    Ok(())
}

/// Validate workload configuration
pub fn validate_workload(workload: &WorkloadConfig) -> Result<()> {
    // Sum, enabled set and per-class sizes are the profile's own invariants
    WorkProfile::from_percentages(workload.percentages(), workload.sizes())
        .context("Invalid workload profile")?;

    if workload.duration_secs == 0 {
        anyhow::bail!("duration must be greater than 0");
    }

    if !workload.interval_secs.is_finite() || workload.interval_secs <= 0.0 {
        anyhow::bail!(
            "interval must be a positive number of seconds, got {}",
            workload.interval_secs
        );
    }

    Ok(())
}

/// Validate target configuration
pub fn validate_target(target: &TargetConfig) -> Result<()> {
    if target.path.as_os_str().is_empty() {
        anyhow::bail!("target path is empty");
    }

    if target.extent == Some(0) {
        anyhow::bail!("extent must be greater than 0");
    }

    if let Some(alignment) = target.alignment {
        if alignment == 0 || !alignment.is_power_of_two() {
            anyhow::bail!("alignment must be a power of two, got {}", alignment);
        }
    }

    Ok(())
}

/// Validate runtime configuration
pub fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if runtime.queue_capacity < 2 {
        anyhow::bail!(
            "queue_capacity must be at least 2 (one slot is always free), got {}",
            runtime.queue_capacity
        );
    }

    if runtime.poll_interval_ms == 0 {
        anyhow::bail!("poll_interval must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config::new(
            WorkloadConfig::new([10, 25, 50, 15], [512, 512, 4096, 4096], 60, 0.01),
            "/dev/sdb",
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&base()).is_ok());
    }

    #[test]
    fn test_validate_probabilities() {
        let mut config = base();
        config.workload.sequential_write.percent = 20;
        let err = validate_config(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("sum to 100"));

        let mut config = base();
        for class in TaskClass::ALL {
            config.workload.class_mut(class).percent = 0;
        }
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_enabled_size() {
        let mut config = base();
        config.workload.random_write.size = 0;
        assert!(validate_config(&config).is_err());

        // Disabled classes may have no size
        config.workload.random_read.percent = 35;
        config.workload.random_write.percent = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_timing() {
        let mut config = base();
        config.workload.duration_secs = 0;
        assert!(validate_config(&config).is_err());

        for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = base();
            config.workload.interval_secs = interval;
            assert!(validate_config(&config).is_err(), "interval {} accepted", interval);
        }
    }

    #[test]
    fn test_validate_target() {
        let mut config = base();
        config.target.alignment = Some(4096);
        assert!(validate_config(&config).is_ok());

        config.target.alignment = Some(3000);
        assert!(validate_config(&config).is_err());

        let mut config = base();
        config.target.extent = Some(0);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_queue_capacity() {
        let mut config = base();
        config.runtime.queue_capacity = 1;
        assert!(validate_config(&config).is_err());

        config.runtime.queue_capacity = 2;
        assert!(validate_config(&config).is_ok());
    }
}
