//! Accessor layout descriptors.

use crate::encoding::{ComponentCodec, Dimensionality, EncodingKind};
use crate::error::{PackError, PackResult};

/// Largest byte stride a glTF buffer view may declare.
pub const MAX_BYTE_STRIDE: u32 = 252;

/// Name used for index accessors.
pub const INDEX_ATTRIBUTE: &str = "INDEX";

/// Layout of an array of elements inside a byte range.
///
/// A plain value type: reslicing or relocating an accessor replaces its
/// `MemoryAccessInfo` rather than mutating a shared one. Validity is checked
/// at the point of use (see [`validate_vertex_attribute`] and
/// [`validate_indexer`]), not at construction.
///
/// [`validate_vertex_attribute`]: Self::validate_vertex_attribute
/// [`validate_indexer`]: Self::validate_indexer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryAccessInfo {
    /// Attribute name (`POSITION`, `TEXCOORD_0`, `INDEX`, ...).
    pub name: String,
    /// Offset of the first element within the byte range.
    pub byte_offset: u32,
    /// Number of elements.
    pub item_count: u32,
    /// Distance between consecutive elements; 0 means tightly packed.
    pub byte_stride: u32,
    /// Element shape.
    pub dimensions: Dimensionality,
    /// Component encoding.
    pub encoding: EncodingKind,
    /// Whether integer components are normalized fixed-point.
    pub normalized: bool,
}

impl MemoryAccessInfo {
    /// Create a layout with zero offset, count and stride.
    pub fn new(
        name: impl Into<String>,
        dimensions: Dimensionality,
        encoding: EncodingKind,
        normalized: bool,
    ) -> Self {
        Self {
            name: name.into(),
            byte_offset: 0,
            item_count: 0,
            byte_stride: 0,
            dimensions,
            encoding,
            normalized,
        }
    }

    /// Create the default layout for a well-known attribute name.
    ///
    /// | name         | shape  | encoding            |
    /// |--------------|--------|---------------------|
    /// | `POSITION`   | Vec3   | Float32             |
    /// | `NORMAL`     | Vec3   | Float32             |
    /// | `TANGENT`    | Vec4   | Float32             |
    /// | `COLOR_n`    | Vec4   | UInt8, normalized   |
    /// | `TEXCOORD_n` | Vec2   | Float32             |
    /// | `JOINTS_n`   | Vec4   | UInt8               |
    /// | `WEIGHTS_n`  | Vec4   | UInt8, normalized   |
    /// | `INDEX`      | Scalar | UInt32              |
    pub fn create(name: &str) -> PackResult<Self> {
        use Dimensionality as D;
        use EncodingKind as E;

        let (dimensions, encoding, normalized) = match name {
            "POSITION" | "NORMAL" => (D::Vec3, E::Float32, false),
            "TANGENT" => (D::Vec4, E::Float32, false),
            INDEX_ATTRIBUTE => (D::Scalar, E::UInt32, false),
            _ => match attribute_set(name) {
                Some(("COLOR", _)) => (D::Vec4, E::UInt8, true),
                Some(("TEXCOORD", _)) => (D::Vec2, E::Float32, false),
                Some(("JOINTS", _)) => (D::Vec4, E::UInt8, false),
                Some(("WEIGHTS", _)) => (D::Vec4, E::UInt8, true),
                _ => {
                    return Err(PackError::Configuration(format!(
                        "no default layout for attribute '{name}'"
                    )));
                }
            },
        };
        Ok(Self::new(name, dimensions, encoding, normalized))
    }

    /// Create an index layout with the given encoding.
    pub fn index(encoding: EncodingKind) -> Self {
        Self::new(INDEX_ATTRIBUTE, Dimensionality::Scalar, encoding, false)
    }

    /// Builder-style rename.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style encoding override.
    pub fn with_encoding(mut self, encoding: EncodingKind, normalized: bool) -> Self {
        self.encoding = encoding;
        self.normalized = normalized;
        self
    }

    /// Byte length of one element.
    pub fn byte_length(&self) -> u32 {
        self.dimensions.component_count() * self.encoding.byte_width()
    }

    /// Distance between consecutive elements, resolving a zero stride.
    pub fn step_byte_length(&self) -> u32 {
        self.byte_stride.max(self.byte_length())
    }

    /// Bytes spanned from the first element's start to the last element's end.
    ///
    /// Computed in 64 bits: counts read from a file may describe a layout
    /// far larger than any buffer.
    pub fn padded_byte_length(&self) -> u64 {
        if self.item_count == 0 {
            return 0;
        }
        u64::from(self.step_byte_length()) * u64::from(self.item_count - 1)
            + u64::from(self.byte_length())
    }

    /// Offset one past the last byte of the last element.
    pub fn byte_end(&self) -> u64 {
        u64::from(self.byte_offset) + self.padded_byte_length()
    }

    /// The codec for this layout's components.
    pub fn codec(&self) -> PackResult<ComponentCodec> {
        ComponentCodec::new(self.encoding, self.normalized)
    }

    /// Whether this layout is usable as a vertex attribute.
    pub fn is_valid_vertex_attribute(&self) -> bool {
        self.validate_vertex_attribute().is_ok()
    }

    /// Whether this layout is usable as an index array.
    pub fn is_valid_indexer(&self) -> bool {
        self.validate_indexer().is_ok()
    }

    /// Check the vertex attribute alignment rules.
    pub fn validate_vertex_attribute(&self) -> PackResult<()> {
        let len = self.byte_length();
        if len == 0 || len % 4 != 0 {
            return Err(self.layout_error(format!(
                "element size {len} is not a non-zero multiple of 4"
            )));
        }
        if self.byte_stride > 0 {
            if self.byte_stride < len {
                return Err(self.layout_error(format!(
                    "stride {} is smaller than element size {len}",
                    self.byte_stride
                )));
            }
            if self.byte_stride % 4 != 0 {
                return Err(self.layout_error(format!(
                    "stride {} is not a multiple of 4",
                    self.byte_stride
                )));
            }
            if self.byte_stride > MAX_BYTE_STRIDE {
                return Err(self.layout_error(format!(
                    "stride {} exceeds {MAX_BYTE_STRIDE}",
                    self.byte_stride
                )));
            }
        }
        if self.normalized && !self.encoding.supports_normalization() {
            return Err(self.layout_error(format!(
                "{:?} components cannot be normalized",
                self.encoding
            )));
        }
        Ok(())
    }

    /// Check the index array rules.
    pub fn validate_indexer(&self) -> PackResult<()> {
        if self.dimensions != Dimensionality::Scalar {
            return Err(self.layout_error(format!(
                "index arrays must be scalar, found {:?}",
                self.dimensions
            )));
        }
        if self.normalized {
            return Err(self.layout_error("index arrays cannot be normalized".into()));
        }
        if !self.encoding.is_index_encoding() {
            return Err(self.layout_error(format!(
                "{:?} is not an index encoding",
                self.encoding
            )));
        }
        if !matches!(self.byte_stride, 0 | 1 | 2 | 4) {
            return Err(self.layout_error(format!(
                "index stride {} is not one of 0, 1, 2, 4",
                self.byte_stride
            )));
        }
        Ok(())
    }

    /// Derive the layout of `count` elements starting at element `start`.
    ///
    /// The count is clamped to the elements remaining after `start`. Fails
    /// with `Bounds` when the new offset does not fit in 32 bits.
    pub fn slice(&self, start: u32, count: u32) -> PackResult<Self> {
        let start = start.min(self.item_count);
        let offset = u64::from(self.byte_offset)
            + u64::from(start) * u64::from(self.step_byte_length());
        let mut sliced = self.clone();
        sliced.byte_offset = u32::try_from(offset).map_err(|_| {
            PackError::Bounds(format!(
                "{}: element {start} starts at byte {offset}, past the 32-bit range",
                self.name
            ))
        })?;
        sliced.item_count = count.min(self.item_count - start);
        Ok(sliced)
    }

    fn layout_error(&self, msg: String) -> PackError {
        PackError::InvalidLayout(format!("{}: {msg}", self.name))
    }
}

/// Lay out `attrs` back to back inside one interleaved record.
///
/// The first pass assigns offsets while accumulating the record size; the
/// second pass patches every attribute's stride to that total, which is not
/// known until all attributes have been visited. Returns the stride.
pub fn set_interleaved_info(
    attrs: &mut [MemoryAccessInfo],
    base_offset: u32,
    item_count: u32,
) -> u32 {
    let mut stride = 0;

    for attr in attrs.iter_mut() {
        attr.byte_offset = base_offset + stride;
        attr.item_count = item_count;
        stride += attr.byte_length();
    }

    for attr in attrs.iter_mut() {
        attr.byte_stride = stride;
    }

    stride
}

/// Lay out `attrs` one after another, each tightly packed.
///
/// Every block starts 4-byte aligned. Returns the total byte size.
pub fn set_planar_info(attrs: &mut [MemoryAccessInfo], base_offset: u32, item_count: u32) -> u32 {
    let mut offset = base_offset;

    for attr in attrs.iter_mut() {
        attr.byte_offset = offset;
        attr.item_count = item_count;
        attr.byte_stride = 0;
        offset += attr.byte_length() * item_count;
        offset = offset.next_multiple_of(4);
    }

    offset - base_offset
}

/// Split `COLOR_0` style names into `("COLOR", 0)`.
pub(crate) fn attribute_set(name: &str) -> Option<(&str, u32)> {
    let (kind, set) = name.rsplit_once('_')?;
    let set = set.parse().ok()?;
    Some((kind, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_interleaved_stride_position_color() {
        let mut attrs = vec![
            MemoryAccessInfo::create("POSITION").unwrap(),
            MemoryAccessInfo::create("COLOR_0").unwrap(),
        ];
        let stride = set_interleaved_info(&mut attrs, 0, 10);

        assert_eq!(stride, 16);
        assert_eq!(attrs[0].byte_offset, 0);
        assert_eq!(attrs[1].byte_offset, 12);
        assert!(attrs.iter().all(|a| a.byte_stride == 16 && a.item_count == 10));
        assert!(attrs.iter().all(|a| a.is_valid_vertex_attribute()));
    }

    #[test]
    fn test_planar_info_packs_tightly() {
        let mut attrs = vec![
            MemoryAccessInfo::create("POSITION").unwrap(),
            MemoryAccessInfo::create("TEXCOORD_0").unwrap(),
        ];
        let total = set_planar_info(&mut attrs, 8, 3);

        assert_eq!(attrs[0].byte_offset, 8);
        assert_eq!(attrs[1].byte_offset, 8 + 36);
        assert_eq!(total, 36 + 24);
        assert!(attrs.iter().all(|a| a.byte_stride == 0));
    }

    #[rstest]
    #[case("POSITION", Dimensionality::Vec3, EncodingKind::Float32, false)]
    #[case("NORMAL", Dimensionality::Vec3, EncodingKind::Float32, false)]
    #[case("TANGENT", Dimensionality::Vec4, EncodingKind::Float32, false)]
    #[case("COLOR_0", Dimensionality::Vec4, EncodingKind::UInt8, true)]
    #[case("TEXCOORD_1", Dimensionality::Vec2, EncodingKind::Float32, false)]
    #[case("JOINTS_0", Dimensionality::Vec4, EncodingKind::UInt8, false)]
    #[case("WEIGHTS_0", Dimensionality::Vec4, EncodingKind::UInt8, true)]
    #[case("INDEX", Dimensionality::Scalar, EncodingKind::UInt32, false)]
    fn test_create_defaults(
        #[case] name: &str,
        #[case] dims: Dimensionality,
        #[case] encoding: EncodingKind,
        #[case] normalized: bool,
    ) {
        let info = MemoryAccessInfo::create(name).unwrap();
        assert_eq!(info.dimensions, dims);
        assert_eq!(info.encoding, encoding);
        assert_eq!(info.normalized, normalized);
    }

    #[test]
    fn test_create_unknown_name() {
        assert!(matches!(
            MemoryAccessInfo::create("VELOCITY"),
            Err(PackError::Configuration(_))
        ));
    }

    #[rstest]
    #[case(0, true)]
    #[case(12, true)]
    #[case(16, true)]
    #[case(8, false)] // smaller than the element
    #[case(14, false)] // not a multiple of 4
    #[case(256, false)] // above the buffer view limit
    fn test_vertex_attribute_stride_rules(#[case] stride: u32, #[case] valid: bool) {
        let mut info = MemoryAccessInfo::create("POSITION").unwrap();
        info.byte_stride = stride;
        assert_eq!(info.is_valid_vertex_attribute(), valid);
    }

    #[test]
    fn test_vertex_attribute_size_rule() {
        let info = MemoryAccessInfo::new("_X", Dimensionality::Vec3, EncodingKind::UInt8, false);
        assert!(matches!(
            info.validate_vertex_attribute(),
            Err(PackError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_indexer_rules() {
        assert!(MemoryAccessInfo::index(EncodingKind::UInt16).is_valid_indexer());
        assert!(!MemoryAccessInfo::index(EncodingKind::Float32).is_valid_indexer());

        let mut info = MemoryAccessInfo::index(EncodingKind::UInt8);
        info.byte_stride = 3;
        assert!(!info.is_valid_indexer());

        let vec = MemoryAccessInfo::create("POSITION").unwrap();
        assert!(!vec.is_valid_indexer());
    }

    #[test]
    fn test_slice_advances_and_clamps() {
        let mut attrs = vec![
            MemoryAccessInfo::create("POSITION").unwrap(),
            MemoryAccessInfo::create("NORMAL").unwrap(),
        ];
        set_interleaved_info(&mut attrs, 0, 10);

        let sliced = attrs[1].slice(4, 100).unwrap();
        assert_eq!(sliced.byte_offset, 12 + 4 * 24);
        assert_eq!(sliced.item_count, 6);

        let packed = MemoryAccessInfo::index(EncodingKind::UInt16);
        let packed = MemoryAccessInfo {
            item_count: 5,
            ..packed
        };
        let sliced = packed.slice(2, 2).unwrap();
        assert_eq!(sliced.byte_offset, 4);
        assert_eq!(sliced.item_count, 2);
    }

    #[test]
    fn test_huge_count_does_not_overflow() {
        let mut info = MemoryAccessInfo::create("POSITION").unwrap();
        info.item_count = 400_000_000;
        assert_eq!(info.padded_byte_length(), 4_800_000_000);
        assert_eq!(info.byte_end(), 4_800_000_000);

        info.byte_offset = 8;
        let err = info.slice(u32::MAX, 1).unwrap_err();
        assert!(matches!(err, PackError::Bounds(_)));
    }

    #[test]
    fn test_attribute_set() {
        assert_eq!(attribute_set("COLOR_0"), Some(("COLOR", 0)));
        assert_eq!(attribute_set("TEXCOORD_12"), Some(("TEXCOORD", 12)));
        assert_eq!(attribute_set("POSITION"), None);
    }
}
