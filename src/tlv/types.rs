//! # TLV Type Tags
//!
//! The closed set of status/command field types and the two message-kind
//! byte values. `EOL` (0) as a TLV type and `Status` (0) as a message kind
//! do not collide: the first byte of a packet is always the message kind;
//! TLV parsing starts at byte 1, where a type byte of 0 means "end of
//! list".

/// The first byte of every status/command packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Status = 0,
    Cmd = 1,
}

impl MessageKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(MessageKind::Status),
            1 => Some(MessageKind::Cmd),
            _ => None,
        }
    }
}

/// A TLV field type tag. Unknown tags encountered while decoding are
/// skipped by length, never treated as an error (§6 forward-compatibility
/// mechanism) — see [`super::codec::decode_next`], which returns the raw
/// `u8` for tags outside this enum rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[non_exhaustive]
pub enum TlvType {
    Eol = 0,
    CommandTag = 1,
    CmdCnt = 2,
    GpsTime = 3,
    Description = 4,
    StatusDestSocket = 5,

    InputSamprate = 10,
    OutputSsrc = 11,
    OutputSamprate = 12,
    OutputChannels = 13,
    OutputEncoding = 14,
    OutputSeq = 15,
    OutputTimestamp = 16,
    OutputDestSocket = 17,
    OutputPackets = 18,
    InputPackets = 19,
    TtlField = 20,

    RadioFrequency = 30,
    FirstLoFrequency = 31,
    SecondLoFrequency = 32,
    ShiftFrequency = 33,
    DopplerFrequency = 34,
    DopplerFrequencyRate = 35,

    LowEdge = 40,
    HighEdge = 41,
    KaiserBeta = 42,
    FilterBinShift = 43,
    FilterRemainder = 44,

    DemodType = 50,

    PllEnable = 60,
    PllLock = 61,
    PllSquare = 62,
    PllBw = 63,
    PllPhase = 64,

    AgcEnable = 70,
    Headroom = 71,
    AgcHangtime = 72,
    AgcRecoveryRate = 73,
    AgcThreshold = 74,
    Envelope = 75,
    Conj = 76,

    Gain = 80,
    SquelchOpen = 81,
    SquelchClose = 82,
    DeemphTc = 83,
    DeemphGain = 84,
    Tone = 85,
    FmDeviation = 86,

    Preset = 90,

    BinCount = 100,
    BinData = 101,
    SpectrumFftN = 102,
    SpectrumAvg = 103,
    ResolutionBw = 104,
    WindowType = 105,
    SpectrumShape = 106,
    Crossover = 107,
    NoiseBw = 108,
    CompactBase = 109,
    CompactStep = 110,

    OpusBitRate = 120,
    OpusBandwidth = 121,
    OpusApplication = 122,
    OpusFec = 123,
    OpusDtx = 124,
    Minpacket = 125,
    Filter2 = 126,

    OutputInterval = 130,
}

impl TlvType {
    pub fn from_u8(b: u8) -> Option<Self> {
        use TlvType::*;
        Some(match b {
            0 => Eol,
            1 => CommandTag,
            2 => CmdCnt,
            3 => GpsTime,
            4 => Description,
            5 => StatusDestSocket,
            10 => InputSamprate,
            11 => OutputSsrc,
            12 => OutputSamprate,
            13 => OutputChannels,
            14 => OutputEncoding,
            15 => OutputSeq,
            16 => OutputTimestamp,
            17 => OutputDestSocket,
            18 => OutputPackets,
            19 => InputPackets,
            20 => TtlField,
            30 => RadioFrequency,
            31 => FirstLoFrequency,
            32 => SecondLoFrequency,
            33 => ShiftFrequency,
            34 => DopplerFrequency,
            35 => DopplerFrequencyRate,
            40 => LowEdge,
            41 => HighEdge,
            42 => KaiserBeta,
            43 => FilterBinShift,
            44 => FilterRemainder,
            50 => DemodType,
            60 => PllEnable,
            61 => PllLock,
            62 => PllSquare,
            63 => PllBw,
            64 => PllPhase,
            70 => AgcEnable,
            71 => Headroom,
            72 => AgcHangtime,
            73 => AgcRecoveryRate,
            74 => AgcThreshold,
            75 => Envelope,
            76 => Conj,
            80 => Gain,
            81 => SquelchOpen,
            82 => SquelchClose,
            83 => DeemphTc,
            84 => DeemphGain,
            85 => Tone,
            86 => FmDeviation,
            90 => Preset,
            100 => BinCount,
            101 => BinData,
            102 => SpectrumFftN,
            103 => SpectrumAvg,
            104 => ResolutionBw,
            105 => WindowType,
            106 => SpectrumShape,
            107 => Crossover,
            108 => NoiseBw,
            109 => CompactBase,
            110 => CompactStep,
            120 => OpusBitRate,
            121 => OpusBandwidth,
            122 => OpusApplication,
            123 => OpusFec,
            124 => OpusDtx,
            125 => Minpacket,
            126 => Filter2,
            130 => OutputInterval,
            _ => return None,
        })
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Demodulator kind, carried on the wire as [`TlvType::DemodType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DemodTypeTag {
    Linear = 0,
    Fm = 1,
    Wfm = 2,
    Spect = 3,
    Spect2 = 4,
}

impl DemodTypeTag {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(DemodTypeTag::Linear),
            1 => Some(DemodTypeTag::Fm),
            2 => Some(DemodTypeTag::Wfm),
            3 => Some(DemodTypeTag::Spect),
            4 => Some(DemodTypeTag::Spect2),
            _ => None,
        }
    }
}
