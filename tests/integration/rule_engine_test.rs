use boxwatch::core::rule::{MonitorType, Rule};
use boxwatch::core::size::Size;
use boxwatch::core::status::Status;
use boxwatch::core::threshold::{Comparator, Threshold, ThresholdKind};
use boxwatch::error::RuleError;
use std::time::Duration;

use super::fixtures::sample;

fn two_ticks() -> Status {
    let mut status = Status::new();
    status
        .apply_output(&sample(100, 200, 1_000, 1_000), Duration::from_secs(2))
        .unwrap();
    status
        .apply_output(
            &sample(150, 300, 1_000 + 4 * 1024 * 1024, 1_000),
            Duration::from_secs(2),
        )
        .unwrap();
    status
}

#[test]
fn test_threshold_grammar() {
    assert_eq!(
        Threshold::parse(">=80%").unwrap(),
        Threshold {
            kind: ThresholdKind::Percent,
            value: 80.0,
            comparator: Comparator::Ge,
        }
    );
    assert_eq!(
        Threshold::parse("<100m").unwrap(),
        Threshold {
            kind: ThresholdKind::Size,
            value: 104_857_600.0,
            comparator: Comparator::Lt,
        }
    );
    assert_eq!(
        Threshold::parse("=10m/s").unwrap(),
        Threshold {
            kind: ThresholdKind::Speed,
            value: 10_485_760.0,
            comparator: Comparator::Eq,
        }
    );
    assert_eq!(Size::parse("3k").unwrap(), Size(3 * 1024));
}

#[test]
fn test_first_tick_only_point_in_time_rules_fire() {
    let mut status = Status::new();
    status
        .apply_output(&sample(100, 200, 0, 0), Duration::from_secs(2))
        .unwrap();

    assert_eq!(
        Rule::new(MonitorType::Cpu, ">=1%", "cpu0").evaluate(&status),
        Err(RuleError::NotReady)
    );
    assert_eq!(
        Rule::new(MonitorType::Net, ">=1b/s", "eth0").evaluate(&status),
        Err(RuleError::NotReady)
    );
    assert!(Rule::new(MonitorType::Disk, ">=90%", "/")
        .evaluate(&status)
        .unwrap()
        .is_some());
}

#[test]
fn test_cpu_fires_after_two_ticks() {
    let status = two_ticks();
    let pair = Rule::new(MonitorType::Cpu, ">=50%", "cpu0")
        .evaluate(&status)
        .unwrap()
        .unwrap();
    assert_eq!(pair.key, "cpu0");
    assert_eq!(pair.value, "50.00%");
}

#[test]
fn test_network_speed_uses_elapsed() {
    let status = two_ticks();
    let pair = Rule::new(MonitorType::Net, ">=2m/s", "eth0-in")
        .evaluate(&status)
        .unwrap()
        .unwrap();
    assert_eq!(pair.value, "2.0 m/s");

    assert_eq!(
        Rule::new(MonitorType::Net, ">=1b/s", "eth0-out").evaluate(&status),
        Ok(None)
    );
}

#[test]
fn test_memory_swap_disk_temperature() {
    let status = two_ticks();

    let pair = Rule::new(MonitorType::Mem, ">=80%", "used")
        .evaluate(&status)
        .unwrap()
        .unwrap();
    assert_eq!(pair.key, "used of Memory");
    assert_eq!(pair.value, "80.00%");

    // No swap configured on this host
    assert_eq!(
        Rule::new(MonitorType::Swap, ">=1%", "used").evaluate(&status),
        Err(RuleError::NotReady)
    );

    let pair = Rule::new(MonitorType::Disk, ">=90%", "/dev/sda1")
        .evaluate(&status)
        .unwrap()
        .unwrap();
    assert_eq!(pair.key, "/dev/sda1");
    assert_eq!(pair.value, "95.00%");

    let pair = Rule::new(MonitorType::Temp, ">80c", "pkg")
        .evaluate(&status)
        .unwrap()
        .unwrap();
    assert_eq!(pair.value, "82.00°C");
}

#[test]
fn test_configuration_errors() {
    let status = two_ticks();

    for (rule, expected) in [
        (Rule::new(MonitorType::Disk, ">=90%", "/srv"), "invalid matcher"),
        (Rule::new(MonitorType::Cpu, ">=1%", "cpu9"), "invalid matcher"),
        (Rule::new(MonitorType::Temp, ">1m", "pkg"), "not supported"),
        (Rule::new(MonitorType::Mem, "90%", "used"), "invalid threshold"),
    ] {
        let err = rule.evaluate(&status).unwrap_err();
        assert!(!err.is_not_ready());
        assert!(
            err.to_string().contains(expected),
            "{} -> {}",
            rule.id(),
            err
        );
    }
}
