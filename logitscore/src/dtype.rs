//! Element types a logits buffer may hold

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Supported logit element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point
    F32,
    /// 16-bit floating point (IEEE 754)
    F16,
    /// Brain floating point (16-bit)
    BF16,
}

impl DType {
    /// Size of the dtype in bytes
    #[must_use]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F16 | Self::BF16 => 2,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F16 => write!(f, "f16"),
            Self::BF16 => write!(f, "bf16"),
        }
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "f32" => Ok(Self::F32),
            "f16" => Ok(Self::F16),
            "bf16" => Ok(Self::BF16),
            _ => Err(Error::UnsupportedDtype(s.to_string())),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for half::f16 {}
    impl Sealed for half::bf16 {}
}

/// Trait for types that can be stored in a logits buffer.
///
/// Elements are widened on read; log-softmax is accumulated in `f64`.
pub trait LogitElement: sealed::Sealed + Copy + Send + Sync + 'static {
    /// The corresponding `DType` enum value
    const DTYPE: DType;

    /// Widen to `f32`.
    fn to_f32(self) -> f32;

    /// Widen to `f64`, the precision log-softmax is accumulated in.
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }
}

impl LogitElement for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }
}

impl LogitElement for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn to_f32(self) -> f32 {
        half::f16::to_f32(self)
    }
}

impl LogitElement for half::bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn to_f32(self) -> f32 {
        half::bf16::to_f32(self)
    }
}
