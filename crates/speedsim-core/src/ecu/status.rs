//! Real-time data record ('A' command payload)
//!
//! Fixed 79-byte layout (format 0.4, Speeduino 202310) consumed by TunerStudio,
//! SpeedyLoader and custom loggers. Multi-byte fields are little-endian and are
//! only reachable through accessors, so the in-memory representation never
//! depends on struct layout or alignment.

use byteorder::{ByteOrder, LittleEndian};

use crate::protocol::ProtocolError;

/// Encoded size of the record in bytes
pub const STATUS_SIZE: usize = 79;

/// Size of the auxiliary (CAN input) block
pub const AUX_SIZE: usize = 32;

/// Offset applied to temperature bytes so -40..=215 °C fits in a `u8`
pub const TEMP_OFFSET: i16 = 40;

/// Layout version implemented by [`EngineStatus::encode`]
pub const FORMAT_VERSION: &str = "0.4";

/// Byte offsets of each field within the encoded record
pub mod offset {
    #![allow(missing_docs)]

    pub const RESPONSE: usize = 0;
    pub const SECL: usize = 1;
    pub const STATUS1: usize = 2;
    pub const ENGINE: usize = 3;
    pub const DWELL: usize = 4;
    pub const MAP: usize = 5;
    pub const IAT: usize = 7;
    pub const CLT: usize = 8;
    pub const BAT_CORRECTION: usize = 9;
    pub const BATTERY_V: usize = 10;
    pub const O2: usize = 11;
    pub const EGO_CORRECTION: usize = 12;
    pub const IAT_CORRECTION: usize = 13;
    pub const WUE: usize = 14;
    pub const RPM: usize = 15;
    pub const TAE_AMOUNT: usize = 17;
    pub const GAMMA_E: usize = 18;
    pub const VE: usize = 19;
    pub const AFR_TARGET: usize = 20;
    pub const PW: usize = 21;
    pub const TPS_DOT: usize = 23;
    pub const ADVANCE: usize = 24;
    pub const TPS: usize = 25;
    pub const LOOPS: usize = 26;
    pub const FREE_RAM: usize = 28;
    pub const BOOST_TARGET: usize = 30;
    pub const BOOST_DUTY: usize = 31;
    pub const SPARK: usize = 32;
    pub const RPM_DOT: usize = 33;
    pub const ETHANOL_PCT: usize = 35;
    pub const FLEX_CORRECTION: usize = 36;
    pub const FLEX_IGN_CORRECTION: usize = 37;
    pub const IDLE_LOAD: usize = 38;
    pub const TEST_OUTPUTS: usize = 39;
    pub const O2_2: usize = 40;
    pub const BARO: usize = 41;
    pub const AUX: usize = 42;
    pub const TPS_ADC: usize = 74;
    pub const ERRORS: usize = 75;
    pub const RESERVED: usize = 76;
}

/// Snapshot of every externally observable engine parameter
///
/// Temperatures are stored as °C + 40. Pressures are kPa, pulse width is in
/// 0.1 ms units, battery voltage in 0.1 V units and AFR in 0.1 AFR units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    /// Command echo, always `'A'` once initialized
    pub response: u8,
    /// Seconds counter (wraps at 256)
    pub secl: u8,
    /// General status flags (bit0 running, bit1 warm)
    pub status1: u8,
    /// Engine status flags (bit0 cranking, bit1 running)
    pub engine: u8,
    /// Ignition dwell (0.1 ms)
    pub dwell: u8,
    map: [u8; 2],
    /// Intake air temperature, raw (°C + 40)
    pub iat: u8,
    /// Coolant temperature, raw (°C + 40)
    pub clt: u8,
    /// Battery voltage correction (%)
    pub bat_correction: u8,
    /// Battery voltage (0.1 V)
    pub battery_v: u8,
    /// Primary O2 sensor (0-255 over lambda 0.5-1.5)
    pub o2: u8,
    /// Closed-loop EGO correction (%)
    pub ego_correction: u8,
    /// Intake temperature correction (%)
    pub iat_correction: u8,
    /// Warm-up enrichment (%)
    pub wue: u8,
    rpm: [u8; 2],
    /// Acceleration enrichment (%)
    pub tae_amount: u8,
    /// Total fuel correction (%)
    pub gamma_e: u8,
    /// Volumetric efficiency (%)
    pub ve: u8,
    /// Target AFR (0.1 AFR)
    pub afr_target: u8,
    pw: [u8; 2],
    /// Throttle rate of change (%/s)
    pub tps_dot: u8,
    /// Ignition advance (degrees BTDC)
    pub advance: u8,
    /// Throttle position (%)
    pub tps: u8,
    loops: [u8; 2],
    free_ram: [u8; 2],
    /// Boost target (kPa)
    pub boost_target: u8,
    /// Boost duty (%)
    pub boost_duty: u8,
    /// Spark flags
    pub spark: u8,
    rpm_dot: [u8; 2],
    /// Ethanol content (%)
    pub ethanol_pct: u8,
    /// Flex fuel correction (%)
    pub flex_correction: u8,
    /// Flex ignition correction (degrees)
    pub flex_ign_correction: u8,
    /// Idle load (%)
    pub idle_load: u8,
    /// Test output flags
    pub test_outputs: u8,
    /// Secondary O2 sensor
    pub o2_2: u8,
    /// Barometric pressure (kPa)
    pub baro: u8,
    /// Auxiliary bus input block
    pub aux: [u8; AUX_SIZE],
    /// Raw throttle ADC reading
    pub tps_adc: u8,
    /// Error code
    pub errors: u8,
    /// Unused trailing bytes
    pub reserved: [u8; 3],
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl EngineStatus {
    /// A record with every byte zero
    pub fn zeroed() -> Self {
        Self {
            response: 0,
            secl: 0,
            status1: 0,
            engine: 0,
            dwell: 0,
            map: [0; 2],
            iat: 0,
            clt: 0,
            bat_correction: 0,
            battery_v: 0,
            o2: 0,
            ego_correction: 0,
            iat_correction: 0,
            wue: 0,
            rpm: [0; 2],
            tae_amount: 0,
            gamma_e: 0,
            ve: 0,
            afr_target: 0,
            pw: [0; 2],
            tps_dot: 0,
            advance: 0,
            tps: 0,
            loops: [0; 2],
            free_ram: [0; 2],
            boost_target: 0,
            boost_duty: 0,
            spark: 0,
            rpm_dot: [0; 2],
            ethanol_pct: 0,
            flex_correction: 0,
            flex_ign_correction: 0,
            idle_load: 0,
            test_outputs: 0,
            o2_2: 0,
            baro: 0,
            aux: [0; AUX_SIZE],
            tps_adc: 0,
            errors: 0,
            reserved: [0; 3],
        }
    }

    /// Set engine speed (RPM)
    pub fn set_rpm(&mut self, rpm: u16) {
        LittleEndian::write_u16(&mut self.rpm, rpm);
    }

    /// Engine speed (RPM)
    pub fn rpm(&self) -> u16 {
        LittleEndian::read_u16(&self.rpm)
    }

    /// Set manifold absolute pressure (kPa)
    pub fn set_map(&mut self, map: u16) {
        LittleEndian::write_u16(&mut self.map, map);
    }

    /// Manifold absolute pressure (kPa)
    pub fn map(&self) -> u16 {
        LittleEndian::read_u16(&self.map)
    }

    /// Set injector pulse width (0.1 ms)
    pub fn set_pulse_width(&mut self, pw: u16) {
        LittleEndian::write_u16(&mut self.pw, pw);
    }

    /// Injector pulse width (0.1 ms)
    pub fn pulse_width(&self) -> u16 {
        LittleEndian::read_u16(&self.pw)
    }

    /// Set RPM rate of change (RPM/s)
    pub fn set_rpm_dot(&mut self, rpm_dot: i16) {
        LittleEndian::write_i16(&mut self.rpm_dot, rpm_dot);
    }

    /// RPM rate of change (RPM/s)
    pub fn rpm_dot(&self) -> i16 {
        LittleEndian::read_i16(&self.rpm_dot)
    }

    /// Set the main loop counter
    pub fn set_loops(&mut self, loops: u16) {
        LittleEndian::write_u16(&mut self.loops, loops);
    }

    /// Main loop counter
    pub fn loops(&self) -> u16 {
        LittleEndian::read_u16(&self.loops)
    }

    /// Set reported free memory (bytes)
    pub fn set_free_ram(&mut self, free_ram: u16) {
        LittleEndian::write_u16(&mut self.free_ram, free_ram);
    }

    /// Reported free memory (bytes)
    pub fn free_ram(&self) -> u16 {
        LittleEndian::read_u16(&self.free_ram)
    }

    /// Set coolant temperature (°C). Values outside -40..=215 saturate.
    pub fn set_coolant_temp(&mut self, celsius: i16) {
        self.clt = encode_temp(celsius);
    }

    /// Coolant temperature (°C)
    pub fn coolant_temp(&self) -> i16 {
        i16::from(self.clt) - TEMP_OFFSET
    }

    /// Set intake air temperature (°C). Values outside -40..=215 saturate.
    pub fn set_intake_temp(&mut self, celsius: i16) {
        self.iat = encode_temp(celsius);
    }

    /// Intake air temperature (°C)
    pub fn intake_temp(&self) -> i16 {
        i16::from(self.iat) - TEMP_OFFSET
    }

    /// Serialize field by field into the wire layout
    pub fn encode(&self) -> [u8; STATUS_SIZE] {
        let mut buf = [0u8; STATUS_SIZE];

        buf[offset::RESPONSE] = self.response;
        buf[offset::SECL] = self.secl;
        buf[offset::STATUS1] = self.status1;
        buf[offset::ENGINE] = self.engine;
        buf[offset::DWELL] = self.dwell;
        buf[offset::MAP..offset::MAP + 2].copy_from_slice(&self.map);
        buf[offset::IAT] = self.iat;
        buf[offset::CLT] = self.clt;
        buf[offset::BAT_CORRECTION] = self.bat_correction;
        buf[offset::BATTERY_V] = self.battery_v;
        buf[offset::O2] = self.o2;
        buf[offset::EGO_CORRECTION] = self.ego_correction;
        buf[offset::IAT_CORRECTION] = self.iat_correction;
        buf[offset::WUE] = self.wue;
        buf[offset::RPM..offset::RPM + 2].copy_from_slice(&self.rpm);
        buf[offset::TAE_AMOUNT] = self.tae_amount;
        buf[offset::GAMMA_E] = self.gamma_e;
        buf[offset::VE] = self.ve;
        buf[offset::AFR_TARGET] = self.afr_target;
        buf[offset::PW..offset::PW + 2].copy_from_slice(&self.pw);
        buf[offset::TPS_DOT] = self.tps_dot;
        buf[offset::ADVANCE] = self.advance;
        buf[offset::TPS] = self.tps;
        buf[offset::LOOPS..offset::LOOPS + 2].copy_from_slice(&self.loops);
        buf[offset::FREE_RAM..offset::FREE_RAM + 2].copy_from_slice(&self.free_ram);
        buf[offset::BOOST_TARGET] = self.boost_target;
        buf[offset::BOOST_DUTY] = self.boost_duty;
        buf[offset::SPARK] = self.spark;
        buf[offset::RPM_DOT..offset::RPM_DOT + 2].copy_from_slice(&self.rpm_dot);
        buf[offset::ETHANOL_PCT] = self.ethanol_pct;
        buf[offset::FLEX_CORRECTION] = self.flex_correction;
        buf[offset::FLEX_IGN_CORRECTION] = self.flex_ign_correction;
        buf[offset::IDLE_LOAD] = self.idle_load;
        buf[offset::TEST_OUTPUTS] = self.test_outputs;
        buf[offset::O2_2] = self.o2_2;
        buf[offset::BARO] = self.baro;
        buf[offset::AUX..offset::AUX + AUX_SIZE].copy_from_slice(&self.aux);
        buf[offset::TPS_ADC] = self.tps_adc;
        buf[offset::ERRORS] = self.errors;
        buf[offset::RESERVED..offset::RESERVED + 3].copy_from_slice(&self.reserved);

        buf
    }

    /// Parse a record captured from the wire
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() != STATUS_SIZE {
            return Err(ProtocolError::InvalidLength {
                expected: STATUS_SIZE,
                actual: data.len(),
            });
        }

        let pair = |at: usize| [data[at], data[at + 1]];
        let mut aux = [0u8; AUX_SIZE];
        aux.copy_from_slice(&data[offset::AUX..offset::AUX + AUX_SIZE]);

        Ok(Self {
            response: data[offset::RESPONSE],
            secl: data[offset::SECL],
            status1: data[offset::STATUS1],
            engine: data[offset::ENGINE],
            dwell: data[offset::DWELL],
            map: pair(offset::MAP),
            iat: data[offset::IAT],
            clt: data[offset::CLT],
            bat_correction: data[offset::BAT_CORRECTION],
            battery_v: data[offset::BATTERY_V],
            o2: data[offset::O2],
            ego_correction: data[offset::EGO_CORRECTION],
            iat_correction: data[offset::IAT_CORRECTION],
            wue: data[offset::WUE],
            rpm: pair(offset::RPM),
            tae_amount: data[offset::TAE_AMOUNT],
            gamma_e: data[offset::GAMMA_E],
            ve: data[offset::VE],
            afr_target: data[offset::AFR_TARGET],
            pw: pair(offset::PW),
            tps_dot: data[offset::TPS_DOT],
            advance: data[offset::ADVANCE],
            tps: data[offset::TPS],
            loops: pair(offset::LOOPS),
            free_ram: pair(offset::FREE_RAM),
            boost_target: data[offset::BOOST_TARGET],
            boost_duty: data[offset::BOOST_DUTY],
            spark: data[offset::SPARK],
            rpm_dot: pair(offset::RPM_DOT),
            ethanol_pct: data[offset::ETHANOL_PCT],
            flex_correction: data[offset::FLEX_CORRECTION],
            flex_ign_correction: data[offset::FLEX_IGN_CORRECTION],
            idle_load: data[offset::IDLE_LOAD],
            test_outputs: data[offset::TEST_OUTPUTS],
            o2_2: data[offset::O2_2],
            baro: data[offset::BARO],
            aux,
            tps_adc: data[offset::TPS_ADC],
            errors: data[offset::ERRORS],
            reserved: [
                data[offset::RESERVED],
                data[offset::RESERVED + 1],
                data[offset::RESERVED + 2],
            ],
        })
    }
}

fn encode_temp(celsius: i16) -> u8 {
    (celsius.saturating_add(TEMP_OFFSET)).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encoded_size() {
        assert_eq!(EngineStatus::zeroed().encode().len(), STATUS_SIZE);
        assert_eq!(offset::RESERVED + 3, STATUS_SIZE);
    }

    #[test]
    fn test_rpm_is_little_endian() {
        let mut status = EngineStatus::zeroed();
        status.set_rpm(0x1234);
        let bytes = status.encode();
        assert_eq!(bytes[offset::RPM], 0x34);
        assert_eq!(bytes[offset::RPM + 1], 0x12);
    }

    #[test]
    fn test_rpm_dot_negative() {
        let mut status = EngineStatus::zeroed();
        status.set_rpm_dot(-800);
        let bytes = status.encode();
        assert_eq!(&bytes[offset::RPM_DOT..offset::RPM_DOT + 2], &(-800i16).to_le_bytes());
        assert_eq!(status.rpm_dot(), -800);
    }

    #[test]
    fn test_temperature_offset() {
        let mut status = EngineStatus::zeroed();
        status.set_coolant_temp(-40);
        assert_eq!(status.clt, 0);
        status.set_coolant_temp(215);
        assert_eq!(status.clt, 255);
        status.set_intake_temp(20);
        assert_eq!(status.iat, 60);
        assert_eq!(status.intake_temp(), 20);
    }

    #[test]
    fn test_temperature_saturates_outside_domain() {
        let mut status = EngineStatus::zeroed();
        status.set_coolant_temp(-100);
        assert_eq!(status.coolant_temp(), -40);
        status.set_coolant_temp(400);
        assert_eq!(status.coolant_temp(), 215);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = EngineStatus::decode(&[0u8; 75]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidLength {
                expected: 79,
                actual: 75
            }
        ));
    }

    #[test]
    fn test_decode_reads_every_field_back() {
        let mut status = EngineStatus::zeroed();
        status.response = b'A';
        status.set_map(98);
        status.set_pulse_width(300);
        status.set_loops(0xBEEF);
        status.set_free_ram(8192);
        status.aux[31] = 0x5A;
        status.errors = 3;
        status.reserved = [1, 2, 3];

        let decoded = EngineStatus::decode(&status.encode()).unwrap();
        assert_eq!(decoded, status);
    }

    #[test]
    fn test_u16_accessors_round_trip_every_value() {
        let mut status = EngineStatus::zeroed();
        for v in 0..=u16::MAX {
            status.set_rpm(v);
            status.set_map(v);
            status.set_pulse_width(v);
            assert_eq!(status.rpm(), v);
            assert_eq!(status.map(), v);
            assert_eq!(status.pulse_width(), v);

            let decoded = EngineStatus::decode(&status.encode()).unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn test_rpm_dot_round_trips_every_value() {
        let mut status = EngineStatus::zeroed();
        for v in i16::MIN..=i16::MAX {
            status.set_rpm_dot(v);
            assert_eq!(status.rpm_dot(), v);

            let decoded = EngineStatus::decode(&status.encode()).unwrap();
            assert_eq!(decoded.rpm_dot(), v);
        }
    }

    #[test]
    fn test_temperatures_round_trip_across_domain() {
        let mut status = EngineStatus::zeroed();
        for celsius in -40..=215 {
            status.set_coolant_temp(celsius);
            status.set_intake_temp(celsius);
            assert_eq!(status.coolant_temp(), celsius);
            assert_eq!(status.intake_temp(), celsius);

            let decoded = EngineStatus::decode(&status.encode()).unwrap();
            assert_eq!(decoded.coolant_temp(), celsius);
            assert_eq!(decoded.intake_temp(), celsius);
        }
    }
}
