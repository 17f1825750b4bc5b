//! Component encodings and the arithmetic between encoded bytes and `f32`.
//!
//! This module provides:
//! - [`EncodingKind`] - On-disk component type (8/16/32-bit integer or float)
//! - [`Dimensionality`] - Element shape (scalar, vectors, matrices)
//! - [`ComponentCodec`] - A validated encoding + normalization pair that
//!   reads and writes single components
//!
//! All multi-byte components are little-endian, as required by glTF.

use crate::error::{PackError, PackResult};

/// Numeric encoding of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingKind {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// 32-bit IEEE float.
    #[default]
    Float32,
}

impl EncodingKind {
    /// Size of one component in bytes.
    pub fn byte_width(self) -> u32 {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::UInt32 | Self::Float32 => 4,
        }
    }

    /// The glTF `componentType` code.
    pub fn component_type(self) -> u32 {
        match self {
            Self::Int8 => 5120,
            Self::UInt8 => 5121,
            Self::Int16 => 5122,
            Self::UInt16 => 5123,
            Self::UInt32 => 5125,
            Self::Float32 => 5126,
        }
    }

    /// Map a glTF `componentType` code back to an encoding.
    pub fn from_component_type(code: u32) -> Option<Self> {
        match code {
            5120 => Some(Self::Int8),
            5121 => Some(Self::UInt8),
            5122 => Some(Self::Int16),
            5123 => Some(Self::UInt16),
            5125 => Some(Self::UInt32),
            5126 => Some(Self::Float32),
            _ => None,
        }
    }

    /// Whether fixed-point normalization is defined for this encoding.
    pub fn supports_normalization(self) -> bool {
        matches!(self, Self::Int8 | Self::UInt8 | Self::Int16 | Self::UInt16)
    }

    /// Whether this encoding may be used for an index buffer.
    pub fn is_index_encoding(self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32)
    }

    /// Smallest unsigned encoding able to store `max_index`.
    pub fn smallest_index_encoding(max_index: u32) -> Self {
        if max_index <= u8::MAX as u32 {
            Self::UInt8
        } else if max_index <= u16::MAX as u32 {
            Self::UInt16
        } else {
            Self::UInt32
        }
    }

    /// Smallest encoding glTF accepts for `JOINTS_n` that stores `max_joint`.
    ///
    /// Joint indices are limited to 8 or 16 bits.
    pub fn smallest_joint_encoding(max_joint: u32) -> PackResult<Self> {
        if max_joint <= u8::MAX as u32 {
            Ok(Self::UInt8)
        } else if max_joint <= u16::MAX as u32 {
            Ok(Self::UInt16)
        } else {
            Err(PackError::Configuration(format!(
                "joint index {max_joint} does not fit in a 16-bit JOINTS attribute"
            )))
        }
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimensionality {
    /// One component.
    #[default]
    Scalar,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
    /// Four components.
    Vec4,
    /// 2x2 matrix.
    Mat2,
    /// 3x3 matrix.
    Mat3,
    /// 4x4 matrix.
    Mat4,
}

impl Dimensionality {
    /// Number of components per element.
    pub fn component_count(self) -> u32 {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// The glTF accessor `type` string.
    pub fn as_gltf_str(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }
}

/// A validated pair of component encoding and normalization flag.
///
/// Raw integers read as `value as f32` and write as `round(value)`.
/// Normalized integers map onto `[0, 1]` (unsigned) or `[-1, 1]` (signed).
/// Signed decode clamps at -1 while encode does not clamp before rounding;
/// consumers of the binary format rely on exactly this rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentCodec {
    encoding: EncodingKind,
    normalized: bool,
}

impl ComponentCodec {
    /// Create a codec, rejecting normalization of `UInt32` and `Float32`.
    pub fn new(encoding: EncodingKind, normalized: bool) -> PackResult<Self> {
        if normalized && !encoding.supports_normalization() {
            return Err(PackError::Configuration(format!(
                "{encoding:?} components cannot be normalized"
            )));
        }
        Ok(Self {
            encoding,
            normalized,
        })
    }

    /// A codec that reads and writes components without normalization.
    pub const fn raw(encoding: EncodingKind) -> Self {
        Self {
            encoding,
            normalized: false,
        }
    }

    /// The component encoding.
    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    /// Whether components are normalized fixed-point.
    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Size of one component in bytes.
    pub fn byte_width(&self) -> usize {
        self.encoding.byte_width() as usize
    }

    /// Decode the component stored at the start of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`byte_width`](Self::byte_width).
    /// Accessor views check their byte range up front.
    pub fn decode(&self, bytes: &[u8]) -> f32 {
        match (self.encoding, self.normalized) {
            (EncodingKind::Float32, _) => {
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            }
            (EncodingKind::UInt8, false) => bytes[0] as f32,
            (EncodingKind::UInt8, true) => bytes[0] as f32 / 255.0,
            (EncodingKind::Int8, false) => bytes[0] as i8 as f32,
            (EncodingKind::Int8, true) => (bytes[0] as i8 as f32 / 127.0).max(-1.0),
            (EncodingKind::UInt16, false) => u16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            (EncodingKind::UInt16, true) => {
                u16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 65535.0
            }
            (EncodingKind::Int16, false) => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            (EncodingKind::Int16, true) => {
                (i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32767.0).max(-1.0)
            }
            (EncodingKind::UInt32, _) => {
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32
            }
        }
    }

    /// Encode `value` into the start of `out`.
    ///
    /// Out-of-range values saturate at the encoding's limits.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`byte_width`](Self::byte_width).
    pub fn encode(&self, value: f32, out: &mut [u8]) {
        match (self.encoding, self.normalized) {
            (EncodingKind::Float32, _) => out[..4].copy_from_slice(&value.to_le_bytes()),
            (EncodingKind::UInt8, false) => out[0] = value.round() as u8,
            (EncodingKind::UInt8, true) => out[0] = (value * 255.0).round() as u8,
            (EncodingKind::Int8, false) => out[0] = value.round() as i8 as u8,
            (EncodingKind::Int8, true) => out[0] = (value * 127.0).round() as i8 as u8,
            (EncodingKind::UInt16, false) => {
                out[..2].copy_from_slice(&(value.round() as u16).to_le_bytes())
            }
            (EncodingKind::UInt16, true) => {
                out[..2].copy_from_slice(&((value * 65535.0) as u16).to_le_bytes())
            }
            (EncodingKind::Int16, false) => {
                out[..2].copy_from_slice(&(value.round() as i16).to_le_bytes())
            }
            (EncodingKind::Int16, true) => {
                out[..2].copy_from_slice(&((value * 32767.0).round() as i16).to_le_bytes())
            }
            (EncodingKind::UInt32, _) => {
                out[..4].copy_from_slice(&(value.round() as u32).to_le_bytes())
            }
        }
    }

    /// The value `value` becomes after an encode/decode round trip.
    pub fn quantize(&self, value: f32) -> f32 {
        let mut scratch = [0u8; 4];
        self.encode(value, &mut scratch);
        self.decode(&scratch)
    }

    /// Largest round-trip error for in-range values.
    pub fn quantization_step(&self) -> f32 {
        match (self.encoding, self.normalized) {
            (EncodingKind::Float32, _) => 0.0,
            (_, false) => 0.5,
            (EncodingKind::UInt8, true) => 1.0 / 255.0,
            (EncodingKind::Int8, true) => 1.0 / 127.0,
            (EncodingKind::UInt16, true) => 1.0 / 65535.0,
            (EncodingKind::Int16, true) => 1.0 / 32767.0,
            (EncodingKind::UInt32, true) => 0.5,
        }
    }
}

/// Read an unsigned integer component without going through `f32`.
///
/// Used for index and key arrays, which may exceed `f32`'s exact range.
pub(crate) fn read_unsigned(encoding: EncodingKind, bytes: &[u8]) -> u32 {
    match encoding {
        EncodingKind::UInt8 | EncodingKind::Int8 => bytes[0] as u32,
        EncodingKind::UInt16 | EncodingKind::Int16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
        EncodingKind::UInt32 | EncodingKind::Float32 => {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        }
    }
}

/// Write an unsigned integer component, truncating to the encoding's width.
pub(crate) fn write_unsigned(encoding: EncodingKind, value: u32, out: &mut [u8]) {
    match encoding {
        EncodingKind::UInt8 | EncodingKind::Int8 => out[0] = value as u8,
        EncodingKind::UInt16 | EncodingKind::Int16 => {
            out[..2].copy_from_slice(&(value as u16).to_le_bytes())
        }
        EncodingKind::UInt32 | EncodingKind::Float32 => {
            out[..4].copy_from_slice(&value.to_le_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EncodingKind::Float32, false)]
    #[case(EncodingKind::UInt8, false)]
    #[case(EncodingKind::UInt8, true)]
    #[case(EncodingKind::Int8, false)]
    #[case(EncodingKind::Int8, true)]
    #[case(EncodingKind::UInt16, false)]
    #[case(EncodingKind::UInt16, true)]
    #[case(EncodingKind::Int16, false)]
    #[case(EncodingKind::Int16, true)]
    #[case(EncodingKind::UInt32, false)]
    fn test_round_trip_within_quantization_step(
        #[case] encoding: EncodingKind,
        #[case] normalized: bool,
    ) {
        let codec = ComponentCodec::new(encoding, normalized).unwrap();
        let samples: &[f32] = match (encoding, normalized) {
            (EncodingKind::Float32, _) => &[-1234.5, -1.0, 0.0, 0.333, 98765.25],
            (EncodingKind::UInt8 | EncodingKind::UInt16, true) => &[0.0, 0.1, 0.5, 0.77, 1.0],
            (_, true) => &[-1.0, -0.42, 0.0, 0.5, 1.0],
            (EncodingKind::Int8 | EncodingKind::Int16, false) => &[-100.0, -3.0, 0.0, 7.0, 120.0],
            (_, false) => &[0.0, 1.0, 7.0, 42.0, 250.0],
        };
        for &value in samples {
            let decoded = codec.quantize(value);
            assert!(
                (decoded - value).abs() <= codec.quantization_step() + 1e-6,
                "{encoding:?} normalized={normalized}: {value} -> {decoded}"
            );
        }
    }

    #[rstest]
    #[case(EncodingKind::UInt32)]
    #[case(EncodingKind::Float32)]
    fn test_normalization_rejected(#[case] encoding: EncodingKind) {
        let err = ComponentCodec::new(encoding, true).unwrap_err();
        assert!(matches!(err, PackError::Configuration(_)));
    }

    #[test]
    fn test_signed_normalized_decode_clamps_at_minus_one() {
        let codec = ComponentCodec::new(EncodingKind::Int8, true).unwrap();
        // -128 / 127 is below -1 and clamps on decode.
        assert_eq!(codec.decode(&[(-128i8) as u8]), -1.0);

        let codec = ComponentCodec::new(EncodingKind::Int16, true).unwrap();
        assert_eq!(codec.decode(&i16::MIN.to_le_bytes()), -1.0);
    }

    #[test]
    fn test_normalized_encode_exact_values() {
        let mut out = [0u8; 2];

        let codec = ComponentCodec::new(EncodingKind::UInt8, true).unwrap();
        codec.encode(0.5, &mut out);
        assert_eq!(out[0], 128);

        let codec = ComponentCodec::new(EncodingKind::Int8, true).unwrap();
        codec.encode(-0.5, &mut out);
        assert_eq!(out[0] as i8, -64);

        // UInt16 truncates instead of rounding.
        let codec = ComponentCodec::new(EncodingKind::UInt16, true).unwrap();
        codec.encode(0.99999, &mut out);
        assert_eq!(u16::from_le_bytes(out), 65534);
    }

    #[rstest]
    #[case(0, EncodingKind::UInt8)]
    #[case(255, EncodingKind::UInt8)]
    #[case(256, EncodingKind::UInt16)]
    #[case(65535, EncodingKind::UInt16)]
    #[case(65536, EncodingKind::UInt32)]
    #[case(69_999, EncodingKind::UInt32)]
    fn test_smallest_index_encoding(#[case] max_index: u32, #[case] expected: EncodingKind) {
        assert_eq!(EncodingKind::smallest_index_encoding(max_index), expected);
    }

    #[test]
    fn test_smallest_joint_encoding() {
        assert_eq!(
            EncodingKind::smallest_joint_encoding(30).unwrap(),
            EncodingKind::UInt8
        );
        assert_eq!(
            EncodingKind::smallest_joint_encoding(300).unwrap(),
            EncodingKind::UInt16
        );
        assert!(EncodingKind::smallest_joint_encoding(70_000).is_err());
    }

    #[test]
    fn test_component_type_codes() {
        for kind in [
            EncodingKind::Int8,
            EncodingKind::UInt8,
            EncodingKind::Int16,
            EncodingKind::UInt16,
            EncodingKind::UInt32,
            EncodingKind::Float32,
        ] {
            assert_eq!(
                EncodingKind::from_component_type(kind.component_type()),
                Some(kind)
            );
        }
        assert_eq!(EncodingKind::from_component_type(5124), None);
    }

    #[test]
    fn test_dimensionality_component_count() {
        assert_eq!(Dimensionality::Scalar.component_count(), 1);
        assert_eq!(Dimensionality::Vec3.component_count(), 3);
        assert_eq!(Dimensionality::Mat3.component_count(), 9);
        assert_eq!(Dimensionality::Mat4.component_count(), 16);
    }
}
