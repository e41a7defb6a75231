use crate::clock::Clock;
use crate::error::DhtError;
use crate::line::{Direction, Level, Line};

/// Bytes in one frame: humidity high, humidity low, temperature high,
/// temperature low, checksum.
pub const FRAME_BYTES: usize = 5;

/// Bits in one frame, sent most significant bit first.
pub const FRAME_BITS: usize = FRAME_BYTES * 8;

/// Budget for any single bounded wait, in microseconds.
///
/// A generous safety bound, not a timing requirement; a healthy exchange
/// never comes near it.
pub const WAIT_BUDGET_US: u64 = 100_000;

/// Shortest high pulse read as a logical 0, in microseconds.
pub const ZERO_PULSE_MIN_US: u64 = 26;

/// Longest high pulse read as a logical 0, in microseconds.
pub const ZERO_PULSE_MAX_US: u64 = 28;

/// Shortest high pulse read as a logical 1, in microseconds. The longest is
/// the wait budget itself.
pub const ONE_PULSE_MIN_US: u64 = 70;

/// How long the host drives the line low to wake the sensor, in
/// milliseconds.
pub const WAKE_LOW_MS: u32 = 18;

/// How long the host drives the line high before turning it around to
/// input, in microseconds. The sensor accepts 20 to 40.
pub const RELEASE_HIGH_US: u32 = 30;

/// Window for each of the sensor's two acknowledgment phases, in
/// microseconds.
pub const ACK_WINDOW_US: u64 = 80;

/// Hold after every received bit, in microseconds. Part of the sensor's
/// transmission timing, not an optional pause.
pub const INTER_BIT_HOLD_US: u32 = 50;

/// Minimum idle time between two exchanges, in milliseconds.
///
/// The sensor refreshes its measurement this slowly; polling faster yields
/// stale or garbled frames. Guidance for callers, not enforced here.
pub const MIN_READ_INTERVAL_MS: u32 = 2_000;

/// Reading returned by the DHT22 sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

/// One raw frame as it came off the line.
///
/// Transient: produced and consumed within a single decode attempt. The
/// only way to physical units is [`Frame::reading`], which refuses frames
/// whose checksum does not hold.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame(pub [u8; FRAME_BYTES]);

impl Frame {
    /// Checks the integrity relation: the low byte of the sum of the first
    /// four bytes must equal the fifth.
    pub fn checksum_ok(&self) -> bool {
        let Frame([b0, b1, b2, b3, checksum]) = *self;
        [b0, b1, b2, b3]
            .iter()
            .fold(0u8, |sum, v| sum.wrapping_add(*v))
            == checksum
    }

    /// Converts a checksum-valid frame into physical units, or `None` when
    /// the checksum fails.
    pub fn reading(&self) -> Option<Reading> {
        self.checksum_ok().then(|| self.convert())
    }

    /// Converts the field bytes into a `Reading`.
    ///
    /// The temperature field is sign-magnitude: bit 7 of the high byte
    /// flags a negative value and is not part of the magnitude. It is not a
    /// two's-complement sign.
    fn convert(&self) -> Reading {
        let Frame([hum_hi, hum_lo, temp_hi, temp_lo, _]) = *self;

        let joined_humidity = u16::from_be_bytes([hum_hi, hum_lo]);
        let relative_humidity = joined_humidity as f32 / 10.0;

        let is_temp_negative = (temp_hi >> 7) != 0;
        let temp_hi = temp_hi & 0b0111_1111;
        let joined_temp = u16::from_be_bytes([temp_hi, temp_lo]);
        let mut temperature = joined_temp as f32 / 10.0;
        if is_temp_negative {
            temperature = -temperature;
        }

        Reading {
            temperature,
            relative_humidity,
        }
    }
}

/// Classifies one measured high-pulse width as a bit value.
///
/// The gap between the zero band and the one band stays unclassified on
/// purpose: a width there is noise, not data, and decoding it either way
/// would manufacture a plausible wrong frame.
pub fn classify_pulse<E>(width_us: u64) -> Result<bool, DhtError<E>> {
    match width_us {
        ZERO_PULSE_MIN_US..=ZERO_PULSE_MAX_US => Ok(false),
        ONE_PULSE_MIN_US..=WAIT_BUDGET_US => Ok(true),
        w if w > WAIT_BUDGET_US => Err(DhtError::Timeout),
        _ => Err(DhtError::Measurement),
    }
}

/// Progress of one decode attempt. Terminal outcomes are the `Result` of
/// [`Dht22::read`]; every call starts a fresh progression.
#[derive(Debug)]
enum State {
    Handshaking,
    Sampling,
    Validating(Frame),
}

/// Driver for the DHT22 temperature and humidity sensor.
///
/// Generic over the digital line it runs on and the clock pulse widths are
/// measured against. The driver holds the line exclusively, so two drivers
/// on one line cannot exist; that is the whole concurrency story.
pub struct Dht22<L, C> {
    line: L,
    clock: C,
}

impl<L, C> Dht22<L, C>
where
    L: Line,
    C: Clock,
{
    /// Creates a new instance of the DHT22 driver.
    ///
    /// # Arguments
    ///
    /// * `line` - The digital line wired to the sensor's data pin.
    /// * `clock` - Time source for delays and pulse-width measurement.
    pub fn new(line: L, clock: C) -> Self {
        Dht22 { line, clock }
    }

    /// Parks the line in its idle state: driven high, as the pull-up would
    /// hold it.
    pub fn open(&mut self) -> Result<(), L::Error> {
        self.line.set_direction(Direction::Output)?;
        self.line.write_level(Level::High)
    }

    /// Releases the line electrically: sensed input, nothing driven.
    pub fn close(&mut self) -> Result<(), L::Error> {
        self.line.set_direction(Direction::Input)
    }

    /// Performs one complete exchange with the sensor.
    ///
    /// Wakes the sensor, confirms its acknowledgment, samples all 40
    /// pulse-width-encoded bits, validates the checksum and converts the
    /// frame to physical units. Allow [`MIN_READ_INTERVAL_MS`] between
    /// calls.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the exchange completed and the checksum holds.
    /// * `Err(DhtError)` naming the first failure; the attempt stops there
    ///   and the next call starts from scratch.
    pub fn read(&mut self) -> Result<Reading, DhtError<L::Error>> {
        let mut state = State::Handshaking;
        loop {
            state = match state {
                State::Handshaking => {
                    self.handshake()?;
                    State::Sampling
                }
                State::Sampling => State::Validating(self.sample_frame()?),
                State::Validating(frame) => {
                    return frame.reading().ok_or(DhtError::ChecksumError);
                }
            };
        }
    }

    /// Wakes the sensor and confirms it is ready to transmit.
    ///
    /// Drives the line low for 18 ms, releases it high for 30 us, turns the
    /// line around to input, then expects the sensor's two 80 us
    /// acknowledgment phases: low, then high.
    fn handshake(&mut self) -> Result<(), DhtError<L::Error>> {
        self.line.set_direction(Direction::Output)?;
        self.line.write_level(Level::Low)?;
        self.clock.delay_ms(WAKE_LOW_MS);
        self.line.write_level(Level::High)?;
        self.clock.delay_us(RELEASE_HIGH_US);

        self.line.set_direction(Direction::Input)?;

        // Phase 1: the sensor pulls the line low. Silence here means no
        // sensor, not a slow one.
        self.wait_for_level(Level::Low, ACK_WINDOW_US)
            .map_err(|e| match e {
                DhtError::Timeout => DhtError::NoResponse,
                other => other,
            })?;

        // Phase 2: the sensor raises the line before the first bit.
        self.wait_for_level(Level::High, ACK_WINDOW_US)
            .map_err(|e| match e {
                DhtError::Timeout => DhtError::ProtocolViolation,
                other => other,
            })?;

        Ok(())
    }

    /// Samples all five bytes of one frame.
    fn sample_frame(&mut self) -> Result<Frame, DhtError<L::Error>> {
        let mut bytes = [0u8; FRAME_BYTES];

        for b in bytes.iter_mut() {
            *b = self.read_byte()?;
        }

        Ok(Frame(bytes))
    }

    /// Reads one byte, most significant bit first, shifting left and OR-ing
    /// each new bit in.
    fn read_byte(&mut self) -> Result<u8, DhtError<L::Error>> {
        let mut byte: u8 = 0;

        for _ in 0..8 {
            byte <<= 1;
            if self.read_bit()? {
                byte |= 1;
            }
        }

        Ok(byte)
    }

    /// Measures the next bit's high pulse and classifies it.
    ///
    /// A bit is a ~50 us low phase followed by a high phase whose width
    /// carries the value. The width is elapsed clock time between the
    /// rising and falling edges, not a poll count.
    fn read_bit(&mut self) -> Result<bool, DhtError<L::Error>> {
        self.wait_for_level(Level::Low, WAIT_BUDGET_US)?;
        self.wait_for_level(Level::High, WAIT_BUDGET_US)?;
        let width_us = self.wait_for_level(Level::Low, WAIT_BUDGET_US)?;

        let bit = classify_pulse(width_us)?;

        // The sensor's timing expects this hold after every bit, the last
        // one included.
        self.clock.delay_us(INTER_BIT_HOLD_US);

        Ok(bit)
    }

    /// Busy-polls the line until it reads `target`, or the budget runs out.
    ///
    /// Returns the elapsed time at the observed transition. Polling
    /// granularity can land that observation just past the budget; the
    /// elapsed time is reported as measured and left to the caller to
    /// judge.
    fn wait_for_level(
        &mut self,
        target: Level,
        budget_us: u64,
    ) -> Result<u64, DhtError<L::Error>> {
        let start = self.clock.now_us();
        loop {
            if self.line.read_level()? == target {
                return Ok(self.clock.now_us() - start);
            }
            if self.clock.now_us() - start > budget_us {
                return Err(DhtError::Timeout);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{self, LineOp};

    #[test]
    fn pulse_bands_classify_exactly() {
        assert_eq!(classify_pulse::<()>(26), Ok(false));
        assert_eq!(classify_pulse::<()>(27), Ok(false));
        assert_eq!(classify_pulse::<()>(28), Ok(false));
        assert_eq!(classify_pulse::<()>(70), Ok(true));
        assert_eq!(classify_pulse::<()>(85), Ok(true));
        assert_eq!(classify_pulse::<()>(100_000), Ok(true));
    }

    #[test]
    fn widths_between_bands_are_refused() {
        assert_eq!(classify_pulse::<()>(0), Err(DhtError::Measurement));
        assert_eq!(classify_pulse::<()>(25), Err(DhtError::Measurement));
        assert_eq!(classify_pulse::<()>(29), Err(DhtError::Measurement));
        assert_eq!(classify_pulse::<()>(50), Err(DhtError::Measurement));
        assert_eq!(classify_pulse::<()>(69), Err(DhtError::Measurement));
        assert_eq!(classify_pulse::<()>(100_001), Err(DhtError::Timeout));
    }

    #[test]
    fn checksum_is_the_low_byte_of_the_sum() {
        assert!(Frame([0x02, 0x2B, 0x00, 0xF6, 0x23]).checksum_ok());
        // Sum wraps past 0xFF.
        assert!(Frame([0xFF, 0xFF, 0xFF, 0xFF, 0xFC]).checksum_ok());
        assert!(!Frame([0x02, 0x2B, 0x00, 0xF6, 0x24]).checksum_ok());
    }

    #[test]
    fn valid_frame_converts_to_tenths() {
        // Humidity: 55.5% -> [0x02, 0x2B] => 555
        // Temperature: 24.6C -> [0x00, 0xF6] => 246
        let reading = Frame([0x02, 0x2B, 0x00, 0xF6, 0x23]).reading().unwrap();

        assert_eq!(
            reading,
            Reading {
                relative_humidity: 55.5,
                temperature: 24.6,
            }
        );
    }

    #[test]
    fn invalid_frame_never_becomes_a_reading() {
        assert_eq!(Frame([0x02, 0x2B, 0x00, 0xF6, 0x00]).reading(), None);
    }

    #[test]
    fn negative_temperature_negates_the_magnitude() {
        // Humidity: 40.0% -> [0x01, 0x90] => 400
        // Temperature: -1.0C -> [0x80, 0x0A]
        // Bit 7 of temp_hi is 1 => negative
        // Clear sign bit: 0x80 & 0x7F = 0x00, so [0x00, 0x0A] = 10 => 1.0 then negated
        let reading = Frame([0x01, 0x90, 0x80, 0x0A, 0x1B]).reading().unwrap();

        assert_eq!(
            reading,
            Reading {
                relative_humidity: 40.0,
                temperature: -1.0,
            }
        );
    }

    #[test]
    fn converter_matches_the_integer_formula() {
        let cases = [
            (0u16, 0u16, false),
            (1, 1, false),
            (500, 123, true),
            (999, 400, false),
            (1000, 800, true),
            (653, 237, false),
        ];
        for (hum_raw, temp_raw, negative) in cases {
            let [hum_hi, hum_lo] = hum_raw.to_be_bytes();
            let [temp_hi, temp_lo] = temp_raw.to_be_bytes();
            let temp_hi = if negative { temp_hi | 0x80 } else { temp_hi };
            let checksum = hum_hi
                .wrapping_add(hum_lo)
                .wrapping_add(temp_hi)
                .wrapping_add(temp_lo);

            let reading = Frame([hum_hi, hum_lo, temp_hi, temp_lo, checksum])
                .reading()
                .unwrap();

            let sign = if negative { -1.0 } else { 1.0 };
            assert_eq!(reading.relative_humidity, hum_raw as f32 / 10.0);
            assert_eq!(reading.temperature, sign * (temp_raw as f32 / 10.0));
        }
    }

    #[test]
    fn temperature_sign_is_magnitude_not_twos_complement() {
        // 0x8005 read as sign-magnitude is -0.5; read as two's complement
        // it would be -3276.3.
        let reading = Frame([0x02, 0x00, 0x80, 0x05, 0x87]).reading().unwrap();

        assert_eq!(reading.temperature, -0.5);
        assert_eq!(reading.relative_humidity, 51.2);
    }

    #[test]
    fn wait_reports_elapsed_virtual_time() {
        let (line, clock) = sim::scripted(Level::High, vec![(10, Level::Low)]);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.wait_for_level(Level::Low, 80), Ok(10));
    }

    #[test]
    fn wait_gives_up_past_its_budget() {
        let (line, clock) = sim::scripted(Level::High, vec![]);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.wait_for_level(Level::Low, 80), Err(DhtError::Timeout));
    }

    #[test]
    fn handshake_walks_the_wake_release_ack_sequence() {
        let edges = vec![
            (script::HANDSHAKE_DONE_US + 30, Level::Low),
            (script::HANDSHAKE_DONE_US + 110, Level::High),
        ];
        let (mut line, mut clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(&mut line, &mut clock);

        dht.handshake().unwrap();

        assert_eq!(
            line.ops(),
            vec![
                LineOp::SetDirection(Direction::Output),
                LineOp::WriteLevel(Level::Low),
                LineOp::WriteLevel(Level::High),
                LineOp::SetDirection(Direction::Input),
            ]
        );
        // The ack high was seen exactly at its scripted edge.
        assert_eq!(clock.time_us(), script::HANDSHAKE_DONE_US + 110);
    }

    #[test]
    fn silent_sensor_is_no_response() {
        let (mut line, mut clock) = sim::scripted(Level::High, vec![]);
        let mut dht = Dht22::new(&mut line, &mut clock);

        assert_eq!(dht.read().unwrap_err(), DhtError::NoResponse);

        // The attempt died inside the acknowledgment window, long before
        // any bit sampling.
        assert!(clock.time_us() < 19_000);
        assert!(line.reads() < 100);
    }

    #[test]
    fn ack_stuck_low_is_a_protocol_violation() {
        let edges = vec![(script::HANDSHAKE_DONE_US + 30, Level::Low)];
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.read().unwrap_err(), DhtError::ProtocolViolation);
    }

    #[test]
    fn line_stuck_high_after_the_ack_times_out() {
        let edges = vec![
            (script::HANDSHAKE_DONE_US + 30, Level::Low),
            (script::HANDSHAKE_DONE_US + 110, Level::High),
        ];
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.read().unwrap_err(), DhtError::Timeout);
    }

    #[test]
    fn wide_pulse_reads_one() {
        let edges = vec![(2, Level::Low), (62, Level::High), (132, Level::Low)];
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert!(dht.read_bit().unwrap());
    }

    #[test]
    fn narrow_pulse_reads_zero() {
        let edges = vec![(2, Level::Low), (62, Level::High), (89, Level::Low)];
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert!(!dht.read_bit().unwrap());
    }

    #[test]
    fn pulse_between_bands_is_a_measurement_error() {
        // Handshake as scripted, then a single 50 us pulse where the first
        // bit should be.
        let rise = script::HANDSHAKE_DONE_US + 250;
        let edges = vec![
            (script::HANDSHAKE_DONE_US + 30, Level::Low),
            (script::HANDSHAKE_DONE_US + 110, Level::High),
            (script::HANDSHAKE_DONE_US + 190, Level::Low),
            (rise, Level::High),
            (rise + 50, Level::Low),
        ];
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.read().unwrap_err(), DhtError::Measurement);
    }

    #[test]
    fn byte_assembles_msb_first() {
        let mut edges = vec![(2, Level::Low)];
        script::encode_byte(&mut edges, 2, 0b1011_0010);
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.read_byte().unwrap(), 0b1011_0010);
    }

    #[test]
    fn full_exchange_yields_the_reading() {
        // Humidity 65.3% -> 653 -> [0x02, 0x8D]
        // Temperature 23.7C -> 237 -> [0x00, 0xED]
        // Checksum 0x02 + 0x8D + 0x00 + 0xED = 0x7C
        let edges = script::frame_script([0x02, 0x8D, 0x00, 0xED, 0x7C]);
        let (mut line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(&mut line, clock);

        let reading = dht.read().unwrap();

        assert_eq!(
            reading,
            Reading {
                temperature: 23.7,
                relative_humidity: 65.3,
            }
        );
        assert_eq!(
            line.ops(),
            vec![
                LineOp::SetDirection(Direction::Output),
                LineOp::WriteLevel(Level::Low),
                LineOp::WriteLevel(Level::High),
                LineOp::SetDirection(Direction::Input),
            ]
        );
    }

    #[test]
    fn corrupted_frame_is_a_checksum_error() {
        let edges = script::frame_script([0x02, 0x8D, 0x00, 0xED, 0x7D]);
        let (line, clock) = sim::scripted(Level::High, edges);
        let mut dht = Dht22::new(line, clock);

        assert_eq!(dht.read().unwrap_err(), DhtError::ChecksumError);
    }

    #[test]
    fn failed_attempts_leave_nothing_behind() {
        let (mut line, clock) = sim::scripted(Level::High, vec![]);
        let mut dht = Dht22::new(&mut line, clock);

        assert_eq!(dht.read().unwrap_err(), DhtError::NoResponse);
        assert_eq!(dht.read().unwrap_err(), DhtError::NoResponse);

        // Each attempt re-ran the whole handshake from scratch.
        assert_eq!(line.ops().len(), 8);
    }

    #[test]
    fn open_parks_the_line_and_close_floats_it() {
        let (mut line, clock) = sim::scripted(Level::High, vec![]);
        let mut dht = Dht22::new(&mut line, clock);

        dht.open().unwrap();
        dht.close().unwrap();

        assert_eq!(
            line.ops(),
            vec![
                LineOp::SetDirection(Direction::Output),
                LineOp::WriteLevel(Level::High),
                LineOp::SetDirection(Direction::Input),
            ]
        );
    }
}
