//! Packing configuration.
//!
//! [`PackSettings`] is chosen once by the caller and passed through the
//! whole pipeline. [`EncodingPolicy`] is what the mesh packer resolves from
//! those settings for one mesh (joint and index widths, forced color
//! encoding, layout), so every primitive of the mesh is encoded the same way
//! and can later share merged buffers.

use crate::accessor::{MemoryAccessInfo, attribute_set};
use crate::encoding::EncodingKind;
use crate::error::{PackError, PackResult};

/// Caller-facing packing options.
#[derive(Debug, Clone, PartialEq)]
pub struct PackSettings {
    /// Allow interleaved vertex records for meshes without morph targets.
    pub allow_interleaved: bool,
    /// Coalesce accessors with the same identity into shared buffers.
    pub merge_buffers: bool,
    /// Encoding for `COLOR_n`. Integer encodings are normalized.
    pub color_encoding: EncodingKind,
    /// Encoding for `WEIGHTS_n`. Integer encodings are normalized.
    pub weights_encoding: EncodingKind,
    /// Morph attributes that are kept even when their delta is all zero.
    pub required_morph_attributes: Vec<String>,
    /// Generator label written into the asset header.
    pub generator: Option<String>,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            allow_interleaved: true,
            merge_buffers: true,
            color_encoding: EncodingKind::UInt8,
            weights_encoding: EncodingKind::UInt8,
            required_morph_attributes: Vec::new(),
            generator: None,
        }
    }
}

impl PackSettings {
    /// Create the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or forbid interleaved vertex records.
    pub fn with_interleaved(mut self, allow: bool) -> Self {
        self.allow_interleaved = allow;
        self
    }

    /// Enable or disable the buffer merge pass.
    pub fn with_merge_buffers(mut self, merge: bool) -> Self {
        self.merge_buffers = merge;
        self
    }

    /// Set the color encoding.
    pub fn with_color_encoding(mut self, encoding: EncodingKind) -> Self {
        self.color_encoding = encoding;
        self
    }

    /// Set the skin weight encoding.
    pub fn with_weights_encoding(mut self, encoding: EncodingKind) -> Self {
        self.weights_encoding = encoding;
        self
    }

    /// Keep `name` in morph targets even when its delta is all zero.
    pub fn with_required_morph_attribute(mut self, name: impl Into<String>) -> Self {
        self.required_morph_attributes.push(name.into());
        self
    }

    /// Set the generator label.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// Reject encodings glTF cannot express for colors or weights.
    pub fn validate(&self) -> PackResult<()> {
        for (what, encoding) in [
            ("color", self.color_encoding),
            ("weights", self.weights_encoding),
        ] {
            if !matches!(
                encoding,
                EncodingKind::UInt8 | EncodingKind::UInt16 | EncodingKind::Float32
            ) {
                return Err(PackError::Configuration(format!(
                    "{what} encoding must be UInt8, UInt16 or Float32, found {encoding:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Mesh-wide encoding decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingPolicy {
    /// Encoding for `COLOR_n`.
    pub colors: EncodingKind,
    /// Encoding for `WEIGHTS_n`.
    pub weights: EncodingKind,
    /// Encoding for `JOINTS_n`.
    pub joints: EncodingKind,
    /// Encoding for the index accessor.
    pub indices: EncodingKind,
    /// Whether vertices are packed into one interleaved record.
    pub interleaved: bool,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            colors: EncodingKind::UInt8,
            weights: EncodingKind::UInt8,
            joints: EncodingKind::UInt8,
            indices: EncodingKind::UInt32,
            interleaved: true,
        }
    }
}

impl EncodingPolicy {
    /// Start from the caller's settings.
    pub fn from_settings(settings: &PackSettings) -> Self {
        Self {
            colors: settings.color_encoding,
            weights: settings.weights_encoding,
            interleaved: settings.allow_interleaved,
            ..Self::default()
        }
    }

    /// Layout for a vertex attribute under this policy.
    pub fn attribute_info(&self, name: &str) -> PackResult<MemoryAccessInfo> {
        let info = MemoryAccessInfo::create(name)?;
        let info = match attribute_set(name) {
            Some(("COLOR", _)) => info.with_encoding(self.colors, self.colors.supports_normalization()),
            Some(("WEIGHTS", _)) => {
                info.with_encoding(self.weights, self.weights.supports_normalization())
            }
            Some(("JOINTS", _)) => info.with_encoding(self.joints, false),
            _ => info,
        };
        Ok(info)
    }

    /// Layout for the index accessor under this policy.
    pub fn index_info(&self) -> MemoryAccessInfo {
        MemoryAccessInfo::index(self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Dimensionality;

    #[test]
    fn test_defaults() {
        let settings = PackSettings::default();
        assert!(settings.allow_interleaved);
        assert!(settings.merge_buffers);
        assert_eq!(settings.color_encoding, EncodingKind::UInt8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let settings = PackSettings::new()
            .with_interleaved(false)
            .with_color_encoding(EncodingKind::UInt16)
            .with_required_morph_attribute("NORMAL")
            .with_generator("meshpack test");

        assert!(!settings.allow_interleaved);
        assert_eq!(settings.color_encoding, EncodingKind::UInt16);
        assert_eq!(settings.required_morph_attributes, vec!["NORMAL".to_string()]);
        assert_eq!(settings.generator.as_deref(), Some("meshpack test"));
    }

    #[test]
    fn test_rejects_signed_color() {
        let settings = PackSettings::new().with_color_encoding(EncodingKind::Int8);
        assert!(matches!(settings.validate(), Err(PackError::Configuration(_))));
    }

    #[test]
    fn test_policy_attribute_info() {
        let policy = EncodingPolicy {
            colors: EncodingKind::Float32,
            joints: EncodingKind::UInt16,
            ..EncodingPolicy::default()
        };

        let color = policy.attribute_info("COLOR_0").unwrap();
        assert_eq!(color.encoding, EncodingKind::Float32);
        assert!(!color.normalized);

        let joints = policy.attribute_info("JOINTS_0").unwrap();
        assert_eq!(joints.encoding, EncodingKind::UInt16);
        assert!(!joints.normalized);

        let weights = policy.attribute_info("WEIGHTS_0").unwrap();
        assert_eq!(weights.encoding, EncodingKind::UInt8);
        assert!(weights.normalized);

        let position = policy.attribute_info("POSITION").unwrap();
        assert_eq!(position.dimensions, Dimensionality::Vec3);
    }
}
