//! End-to-end tests for the full zoneclimated stack.
//!
//! Each test builds the daemon from a TOML document (virtual host, event
//! bus, zone registry), runs the dispatch loop on a task and drives it by
//! changing virtual entity states. Time is paused so debounce delays elapse
//! instantly and deterministically.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use zoneclimate_domain::entity::StateValue;
use zoneclimate_domain::id::ZoneId;
use zoneclimated::config::Config;
use zoneclimated::{Daemon, DaemonHost};

const HOUSE: &str = r#"
    outdoor_temperature_entity = "sensor.outdoor"
    outdoor_temperature_limit = 19.0

    [setpoints]
    off = 7.0

    [[zones]]
    name = "office"
    climate_entity = "climate.office"
    occupancy_entity = "binary_sensor.office_presence"
    opening_entity = "binary_sensor.office_window"
    to_occupied_delay = 10
    to_inoccupied_delay = 60
    opening_delay_open = 30
    opening_delay_close = 15
    occupied_heating_setpoint = 21.0
    away_heating_setpoint = 17.0

    [[zones]]
    name = "garage"
    climate_entity = "switch.garage_heater"

    [[zones]]
    name = "attic"
    climate_entity = "climate.attic"

    [[zones]]
    name = "orphan"

    [[virtual.entities]]
    entity = "climate.office"
    state = "heat"
    attributes = { temperature = 15.0 }

    [[virtual.entities]]
    entity = "binary_sensor.office_presence"
    state = "off"

    [[virtual.entities]]
    entity = "binary_sensor.office_window"
    state = "off"

    [[virtual.entities]]
    entity = "switch.garage_heater"
    state = "off"

    [[virtual.entities]]
    entity = "sensor.outdoor"
    state = 8.5
"#;

struct Running {
    host: std::sync::Arc<DaemonHost>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Running {
    async fn start(toml: &str) -> Self {
        let config = Config::parse(toml).expect("test configuration should be valid");
        let daemon = Daemon::assemble(&config).await;
        let host = std::sync::Arc::clone(&daemon.host);
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(daemon.run(async {
            let _ = stopped.await;
        }));
        Self { host, stop, task }
    }

    async fn set(&self, entity: &str, value: impl Into<StateValue>) {
        self.host.set_state(entity, value).await.unwrap();
        settle().await;
    }

    async fn stop(self) {
        self.stop.send(()).unwrap();
        self.task.await.unwrap();
    }

    fn office_setpoint(&self) -> Option<f64> {
        self.host
            .snapshot("climate.office")
            .and_then(|snapshot| snapshot.numeric_attribute("temperature"))
    }

    fn garage(&self) -> StateValue {
        self.host.snapshot("switch.garage_heater").unwrap().value
    }
}

/// Let the dispatch task drain what was published.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn should_converge_devices_on_start_up() {
    let config = Config::parse(HOUSE).unwrap();
    let daemon = Daemon::assemble(&config).await;

    assert_eq!(daemon.registry.active_zones(), 2);
    assert!(!daemon.registry.is_active(&ZoneId::new("attic")));
    assert!(daemon.registry.zone(&ZoneId::new("orphan")).is_none());
    assert_eq!(
        daemon
            .host
            .snapshot("climate.office")
            .unwrap()
            .numeric_attribute("temperature"),
        Some(17.0)
    );
    assert_eq!(
        daemon.host.snapshot("switch.garage_heater").unwrap().value,
        StateValue::from("on")
    );
}

#[tokio::test(start_paused = true)]
async fn should_follow_occupancy_after_debounce_delay() {
    let running = Running::start(HOUSE).await;

    running.set("binary_sensor.office_presence", "on").await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(running.office_setpoint(), Some(17.0));

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(running.office_setpoint(), Some(21.0));

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_ignore_occupancy_flapping_shorter_than_delay() {
    let running = Running::start(HOUSE).await;
    running.set("binary_sensor.office_presence", "on").await;
    tokio::time::sleep(Duration::from_secs(11)).await;
    running.host.take_calls();

    running.set("binary_sensor.office_presence", "off").await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    running.set("binary_sensor.office_presence", "on").await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(running.office_setpoint(), Some(21.0));
    assert!(running.host.calls().is_empty());

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_lower_setpoint_while_window_stays_open() {
    let running = Running::start(HOUSE).await;

    running.set("binary_sensor.office_window", "on").await;
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(running.office_setpoint(), Some(7.0));

    running.set("binary_sensor.office_window", "off").await;
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(running.office_setpoint(), Some(17.0));

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_switch_heater_with_outdoor_temperature() {
    let running = Running::start(HOUSE).await;
    assert_eq!(running.garage(), StateValue::from("on"));

    running.set("sensor.outdoor", 23.0).await;
    assert_eq!(running.garage(), StateValue::from("off"));

    running.set("sensor.outdoor", "unavailable").await;
    assert_eq!(running.garage(), StateValue::from("off"));

    running.set("sensor.outdoor", 12.0).await;
    assert_eq!(running.garage(), StateValue::from("on"));

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn should_keep_other_zones_working_when_device_fails() {
    let running = Running::start(HOUSE).await;
    running.host.set_failing("switch.garage_heater", true);

    running.set("sensor.outdoor", 23.0).await;
    running.set("binary_sensor.office_window", "on").await;
    tokio::time::sleep(Duration::from_secs(31)).await;

    assert_eq!(running.garage(), StateValue::from("on"));
    assert_eq!(running.office_setpoint(), Some(7.0));

    running.stop().await;
}
