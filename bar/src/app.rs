//! Application context: every sensor plus the last known value of each.

use rootstat_battery::{BatteryMonitor, BatteryReading, PowerSupply, StatusCell};
use rootstat_core::format::{self, Field, FieldSource, Template};
use rootstat_core::{GlobalConfig, Sensor, SensorError, WaybarOutput};
use rootstat_cpu::{CpuSensor, ProcStat};
use rootstat_memory::{MemoryInfo, MemorySensor};
use rootstat_thermal::ThermalSensor;
use rootstat_wireless::{find_wireless_interface, WirelessInfo, WirelessSensor};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NET_CLASS_DIR: &str = "/sys/class/net";
const THERMAL_CLASS_DIR: &str = "/sys/class/thermal";

/// The most recent successful reading of every value on the status line.
///
/// Fields are only overwritten by successful reads, so a transient failure
/// shows the previous value instead of a gap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Aggregate usage followed by one entry per core
    pub cpu: Vec<u8>,
    pub memory: Option<MemoryInfo>,
    pub temps: Vec<Option<i64>>,
    pub wireless: Option<WirelessInfo>,
    pub battery: BatteryReading,
    pub time: Option<String>,
}

impl FieldSource for Snapshot {
    fn value(&self, field: Field) -> Option<String> {
        match field {
            Field::Cpu(slot) => self.cpu.get(slot).map(u8::to_string),
            Field::MemUsed => self.memory.map(|m| m.used_mib().to_string()),
            Field::MemTotal => self.memory.map(|m| m.total_mib().to_string()),
            Field::MemAvail => self.memory.map(|m| m.available_mib().to_string()),
            Field::MemPct => self.memory.map(|m| m.used_percent().to_string()),
            Field::Temp(sensor) => self.temps.get(sensor).copied().flatten().map(|t| t.to_string()),
            Field::Essid => self.wireless.as_ref().map(|w| w.essid.clone()),
            Field::Bitrate => self
                .wireless
                .as_ref()
                .and_then(|w| w.bitrate)
                .map(format::bitrate_to_mbps),
            Field::BatStatus => Some(self.battery.status.to_string()),
            Field::BatCapacity => self.battery.capacity.clone(),
            Field::Time => self.time.clone(),
        }
    }
}

/// Owns the sensors and the battery monitor for the lifetime of the program.
#[derive(Debug)]
pub struct App {
    cpu: CpuSensor<ProcStat>,
    memory: MemorySensor,
    thermal: ThermalSensor,
    wireless: Option<WirelessSensor>,
    power: PowerSupply,
    battery: StatusCell,
    monitor: BatteryMonitor,
    template: Template,
    time_format: String,
    snapshot: Snapshot,
}

impl App {
    /// Build every sensor from `config` and start the battery monitor on
    /// kernel power-supply events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &GlobalConfig) -> Result<Self, SensorError> {
        Self::with_monitor(config, BatteryMonitor::start_uevent)
    }

    /// Like [`App::new`] with a caller-chosen way of starting the monitor.
    pub fn with_monitor<F>(config: &GlobalConfig, start_monitor: F) -> Result<Self, SensorError>
    where
        F: FnOnce(StatusCell, PowerSupply) -> BatteryMonitor,
    {
        let template = Template::parse(&config.format)?;

        let interface = config
            .wireless_interface
            .clone()
            .or_else(|| find_wireless_interface(Path::new(NET_CLASS_DIR)));
        let wireless = interface.map(|name| WirelessSensor::new(name)).transpose()?;
        if wireless.is_none() {
            info!("no wireless interface configured or found");
        }

        let power = PowerSupply::new(&config.battery, &config.ac_adapter);
        let battery = StatusCell::new();
        let monitor = start_monitor(battery.clone(), power.clone());

        Ok(Self {
            cpu: CpuSensor::new(ProcStat::new(&config.proc_stat), config.effective_cpu_count()),
            memory: MemorySensor::new(&config.meminfo),
            thermal: thermal_sensor(&config.temp_sensors, Path::new(THERMAL_CLASS_DIR)),
            wireless,
            power,
            battery,
            monitor,
            template,
            time_format: config.time_format.clone(),
            snapshot: Snapshot::default(),
        })
    }

    /// Read every sensor once, keeping previous values for failed reads.
    pub fn update(&mut self) {
        if let Some(cpu) = poll(&mut self.cpu) {
            self.snapshot.cpu = cpu;
        }
        if let Some(memory) = poll(&mut self.memory) {
            self.snapshot.memory = Some(memory);
        }
        if let Some(temps) = poll(&mut self.thermal) {
            self.snapshot.temps = temps;
        }
        if let Some(wireless) = self.wireless.as_mut().and_then(poll) {
            self.snapshot.wireless = Some(wireless);
        }

        match self.power.capacity() {
            Ok(capacity) => self.battery.set_capacity(Some(capacity)),
            Err(e) => debug!(sensor = "battery", "keeping previous capacity: {e}"),
        }
        self.snapshot.battery = self.monitor.read();

        if let Some(time) = format::local_time(&self.time_format) {
            self.snapshot.time = Some(time);
        }
    }

    /// The status line for the current snapshot.
    #[must_use]
    pub fn render(&self) -> String {
        self.template.render(&self.snapshot)
    }

    /// The current snapshot as a Waybar module update.
    #[must_use]
    pub fn waybar(&self) -> WaybarOutput {
        let mut tooltip = String::new();
        for (slot, pct) in self.snapshot.cpu.iter().enumerate() {
            if slot == 0 {
                let _ = write!(tooltip, "cpu: {pct}%");
            } else {
                let _ = write!(tooltip, "\ncore {slot}: {pct}%");
            }
        }

        let mut output = WaybarOutput::new(self.render())
            .with_class(self.snapshot.battery.status.as_str());
        if !tooltip.is_empty() {
            output = output.with_tooltip(tooltip);
        }
        if let Some(&aggregate) = self.snapshot.cpu.first() {
            output = output.with_percentage(aggregate);
        }
        output
    }

    /// Availability of every sensor, for `--check`.
    #[must_use]
    pub fn check(&self) -> Vec<(String, Result<(), SensorError>)> {
        let mut results = vec![
            (self.cpu.name().to_owned(), self.cpu.check_availability()),
            (self.memory.name().to_owned(), self.memory.check_availability()),
            (self.thermal.name().to_owned(), self.thermal.check_availability()),
            (self.power.name().to_owned(), self.power.check_availability()),
        ];
        if let Some(wireless) = &self.wireless {
            results.push((
                format!("wireless ({})", wireless.name()),
                wireless.check_availability(),
            ));
        }
        results
    }

    /// Stop the battery monitor and wait for it to release its subscription.
    pub async fn shutdown(self) {
        self.monitor.stop().await;
    }
}

/// The configured temperature files, or every thermal zone if none are.
fn thermal_sensor(configured: &[PathBuf], thermal_dir: &Path) -> ThermalSensor {
    if !configured.is_empty() {
        return ThermalSensor::new(configured.to_vec());
    }

    match ThermalSensor::discover_zones(thermal_dir) {
        Ok(zones) => {
            let sensor = ThermalSensor::new(zones);
            info!(zones = sensor.sensors().len(), "using discovered thermal zones");
            sensor
        }
        Err(e) => {
            info!("no thermal zones found: {e}");
            ThermalSensor::new(Vec::new())
        }
    }
}

fn poll<S: Sensor>(sensor: &mut S) -> Option<S::Reading> {
    match sensor.read() {
        Ok(reading) => Some(reading),
        Err(e) => {
            debug!(sensor = sensor.name(), "keeping previous reading: {e}");
            None
        }
    }
}
