use chirplink_core::error::ErrorKind;

/// Chirp-spread-spectrum spreading factor, trading data rate for range.
///
/// Variants are indices into the physical chips-per-symbol table; the wire
/// format and the serial command mini-protocol both use the index, never
/// the physical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadingFactor {
    /// SF7: fastest, shortest range.
    #[default]
    Sf7,
    /// SF8.
    Sf8,
    /// SF9.
    Sf9,
    /// SF10.
    Sf10,
    /// SF11.
    Sf11,
    /// SF12: slowest, longest range.
    Sf12,
}

impl SpreadingFactor {
    const TABLE: [u8; 6] = [7, 8, 9, 10, 11, 12];

    /// Returns the physical chips-per-symbol exponent pushed to the radio.
    pub fn chips(self) -> u8 {
        Self::TABLE[self.index() as usize]
    }

    /// Returns the table index carried on the wire.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Circularly advances to the next spreading factor, wrapping from
    /// SF12 back to SF7. Used for manual adaptation sweeps.
    pub fn next(self) -> Self {
        match self {
            SpreadingFactor::Sf7 => SpreadingFactor::Sf8,
            SpreadingFactor::Sf8 => SpreadingFactor::Sf9,
            SpreadingFactor::Sf9 => SpreadingFactor::Sf10,
            SpreadingFactor::Sf10 => SpreadingFactor::Sf11,
            SpreadingFactor::Sf11 => SpreadingFactor::Sf12,
            SpreadingFactor::Sf12 => SpreadingFactor::Sf7,
        }
    }
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = ErrorKind;

    fn try_from(index: u8) -> Result<Self, ErrorKind> {
        match index {
            0 => Ok(SpreadingFactor::Sf7),
            1 => Ok(SpreadingFactor::Sf8),
            2 => Ok(SpreadingFactor::Sf9),
            3 => Ok(SpreadingFactor::Sf10),
            4 => Ok(SpreadingFactor::Sf11),
            5 => Ok(SpreadingFactor::Sf12),
            other => Err(ErrorKind::InvalidSpreadingFactor(other)),
        }
    }
}

/// Radio channel width. Wider is faster but reaches less far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalBandwidth {
    /// 125 kHz.
    Bw125kHz,
    /// 250 kHz.
    Bw250kHz,
    /// 500 kHz.
    Bw500kHz,
    /// 625 kHz. Selectable, but left out of the sweep rotation.
    Bw625kHz,
}

impl Default for SignalBandwidth {
    fn default() -> Self {
        SignalBandwidth::Bw500kHz
    }
}

impl SignalBandwidth {
    /// Returns the channel width in Hz pushed to the radio.
    pub fn hz(self) -> u32 {
        match self {
            SignalBandwidth::Bw125kHz => 125_000,
            SignalBandwidth::Bw250kHz => 250_000,
            SignalBandwidth::Bw500kHz => 500_000,
            SignalBandwidth::Bw625kHz => 625_000,
        }
    }

    /// Returns the table index carried on the wire.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Circularly advances to the next bandwidth, wrapping from 500 kHz
    /// back to 125 kHz. The 625 kHz entry is not part of the rotation.
    pub fn next(self) -> Self {
        match self {
            SignalBandwidth::Bw125kHz => SignalBandwidth::Bw250kHz,
            SignalBandwidth::Bw250kHz => SignalBandwidth::Bw500kHz,
            SignalBandwidth::Bw500kHz | SignalBandwidth::Bw625kHz => SignalBandwidth::Bw125kHz,
        }
    }
}

impl TryFrom<u8> for SignalBandwidth {
    type Error = ErrorKind;

    fn try_from(index: u8) -> Result<Self, ErrorKind> {
        match index {
            0 => Ok(SignalBandwidth::Bw125kHz),
            1 => Ok(SignalBandwidth::Bw250kHz),
            2 => Ok(SignalBandwidth::Bw500kHz),
            3 => Ok(SignalBandwidth::Bw625kHz),
            other => Err(ErrorKind::InvalidBandwidth(other)),
        }
    }
}

/// One of the 16 US915-style 500 kHz sub-band channels.
///
/// The index selects a center frequency from a fixed deci-MHz table,
/// eight uplink channels followed by eight downlink channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrequencyChannel(u8);

impl FrequencyChannel {
    /// Center frequencies in deci-MHz (903.0 MHz .. 927.5 MHz).
    const TABLE: [u16; 16] = [
        9030, 9046, 9062, 9078, 9094, 9110, 9126, 9142, // uplink 0..7
        9233, 9239, 9245, 9251, 9257, 9263, 9269, 9275, // downlink 0..7
    ];

    /// Number of channels in the table.
    pub const COUNT: u8 = 16;

    /// Returns the center frequency in deci-MHz.
    pub fn deci_mhz(self) -> u16 {
        Self::TABLE[self.0 as usize]
    }

    /// Returns the center frequency in MHz, as the synthesizer expects it.
    pub fn mhz(self) -> f32 {
        f32::from(self.deci_mhz()) / 10.0
    }

    /// Returns the table index carried on the wire.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Circularly advances to the next channel, wrapping from the last
    /// downlink channel back to the first uplink channel.
    pub fn next(self) -> Self {
        FrequencyChannel((self.0 + 1) % Self::COUNT)
    }
}

impl TryFrom<u8> for FrequencyChannel {
    type Error = ErrorKind;

    fn try_from(index: u8) -> Result<Self, ErrorKind> {
        if index < Self::COUNT {
            Ok(FrequencyChannel(index))
        } else {
            Err(ErrorKind::InvalidFrequencyChannel(index))
        }
    }
}

/// Transmit power in dBm, bounded to what the PA can actually produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPower(i8);

impl TxPower {
    /// Lowest legal transmit power.
    pub const MIN_DBM: i8 = 2;
    /// Highest legal transmit power.
    pub const MAX_DBM: i8 = 20;

    /// Validates a dBm value against the [2, 20] range.
    pub fn new(dbm: i8) -> Result<Self, ErrorKind> {
        if (Self::MIN_DBM..=Self::MAX_DBM).contains(&dbm) {
            Ok(TxPower(dbm))
        } else {
            Err(ErrorKind::InvalidTxPower(dbm))
        }
    }

    /// Returns the power in dBm.
    pub fn dbm(self) -> i8 {
        self.0
    }
}

impl Default for TxPower {
    fn default() -> Self {
        TxPower(Self::MIN_DBM)
    }
}

/// The full radio parameter tuple one station operates on.
///
/// Every field is always a valid table entry; construction goes through
/// the validated types, so a `RadioSettings` can never be partially
/// applied. The default matches the power-on configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RadioSettings {
    /// Chirp spreading factor.
    pub spreading_factor: SpreadingFactor,
    /// Channel width.
    pub bandwidth: SignalBandwidth,
    /// Sub-band center frequency.
    pub channel: FrequencyChannel,
    /// Transmit power.
    pub tx_power: TxPower,
}

impl RadioSettings {
    /// Builds a settings tuple from raw wire indices, rejecting any field
    /// outside its table. Used when decoding link-change frames.
    pub fn from_indices(sf: u8, bw: u8, ch: u8, power: i8) -> Result<Self, ErrorKind> {
        Ok(RadioSettings {
            spreading_factor: SpreadingFactor::try_from(sf)?,
            bandwidth: SignalBandwidth::try_from(bw)?,
            channel: FrequencyChannel::try_from(ch)?,
            tx_power: TxPower::new(power)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreading_factor_table_round_trip() {
        for index in 0u8..6 {
            let sf = SpreadingFactor::try_from(index).unwrap();
            assert_eq!(sf.index(), index);
            assert_eq!(sf.chips(), index + 7);
        }
        assert_eq!(
            SpreadingFactor::try_from(6),
            Err(ErrorKind::InvalidSpreadingFactor(6))
        );
    }

    #[test]
    fn spreading_factor_next_wraps() {
        let mut sf = SpreadingFactor::Sf7;
        for _ in 0..6 {
            sf = sf.next();
        }
        assert_eq!(sf, SpreadingFactor::Sf7);
        assert_eq!(SpreadingFactor::Sf12.next(), SpreadingFactor::Sf7);
    }

    #[test]
    fn bandwidth_rotation_skips_625khz() {
        assert_eq!(SignalBandwidth::Bw125kHz.next(), SignalBandwidth::Bw250kHz);
        assert_eq!(SignalBandwidth::Bw250kHz.next(), SignalBandwidth::Bw500kHz);
        assert_eq!(SignalBandwidth::Bw500kHz.next(), SignalBandwidth::Bw125kHz);
        // 625 kHz can be set explicitly but rotates back into the sweep.
        assert_eq!(SignalBandwidth::Bw625kHz.next(), SignalBandwidth::Bw125kHz);
    }

    #[test]
    fn bandwidth_hz_values() {
        assert_eq!(SignalBandwidth::try_from(0).unwrap().hz(), 125_000);
        assert_eq!(SignalBandwidth::try_from(2).unwrap().hz(), 500_000);
        assert_eq!(SignalBandwidth::try_from(3).unwrap().hz(), 625_000);
        assert_eq!(
            SignalBandwidth::try_from(4),
            Err(ErrorKind::InvalidBandwidth(4))
        );
    }

    #[test]
    fn channel_table_covers_both_sub_bands() {
        let uplink0 = FrequencyChannel::try_from(0).unwrap();
        assert_eq!(uplink0.deci_mhz(), 9030);
        assert!((uplink0.mhz() - 903.0).abs() < f32::EPSILON);

        let downlink7 = FrequencyChannel::try_from(15).unwrap();
        assert_eq!(downlink7.deci_mhz(), 9275);

        assert_eq!(
            FrequencyChannel::try_from(16),
            Err(ErrorKind::InvalidFrequencyChannel(16))
        );
    }

    #[test]
    fn channel_next_wraps_to_first_uplink() {
        let last = FrequencyChannel::try_from(15).unwrap();
        assert_eq!(last.next().index(), 0);
    }

    #[test]
    fn tx_power_bounds() {
        assert_eq!(TxPower::new(2).unwrap().dbm(), 2);
        assert_eq!(TxPower::new(20).unwrap().dbm(), 20);
        assert_eq!(TxPower::new(1), Err(ErrorKind::InvalidTxPower(1)));
        assert_eq!(TxPower::new(21), Err(ErrorKind::InvalidTxPower(21)));
    }

    #[test]
    fn default_settings_match_power_on_configuration() {
        let settings = RadioSettings::default();
        assert_eq!(settings.spreading_factor, SpreadingFactor::Sf7);
        assert_eq!(settings.bandwidth, SignalBandwidth::Bw500kHz);
        assert_eq!(settings.channel.index(), 0);
        assert_eq!(settings.tx_power.dbm(), 2);
    }

    #[test]
    fn from_indices_rejects_any_bad_field() {
        assert!(RadioSettings::from_indices(2, 2, 3, 10).is_ok());
        assert_eq!(
            RadioSettings::from_indices(9, 2, 3, 10),
            Err(ErrorKind::InvalidSpreadingFactor(9))
        );
        assert_eq!(
            RadioSettings::from_indices(2, 2, 16, 10),
            Err(ErrorKind::InvalidFrequencyChannel(16))
        );
        assert_eq!(
            RadioSettings::from_indices(2, 2, 3, 0),
            Err(ErrorKind::InvalidTxPower(0))
        );
    }
}
