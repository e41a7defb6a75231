//! One-shot DHT22 reader over a sysfs GPIO line.
//!
//! Usage: `dht22-read <pin>`. Exports the pin, performs a single exchange,
//! prints the measurement and floats the line. The pin stays exported so the
//! next run finds it ready.

use anyhow::{Context, Result};

use dht22_line::clock::StdClock;
use dht22_line::sensor::{Sensor, SensorData};
use dht22_line::sysfs::SysfsLine;

fn main() -> Result<()> {
    let pin: u32 = std::env::args()
        .nth(1)
        .context("usage: dht22-read <gpio pin number>")?
        .parse()
        .context("pin must be a number")?;

    let line = SysfsLine::export(pin).with_context(|| format!("acquiring gpio{pin}"))?;
    let mut sensor = Sensor::dht22(line, StdClock::new());

    sensor.open().context("preparing the line")?;
    let data = sensor.read().context("reading the sensor")?;
    sensor.close().context("releasing the line")?;

    match data {
        SensorData::Climate(reading) => {
            println!("Temperature: {:.1} C", reading.temperature);
            println!("Humidity: {:.1} %", reading.relative_humidity);
        }
        SensorData::Light(level) => println!("Light: {level:?}"),
    }

    Ok(())
}
