use serde::{Deserialize, Serialize};

use crate::config::MAX_REGISTER_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scalar {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

impl Scalar {
    pub fn from_name(name: &str) -> Option<Scalar> {
        let s = match name {
            "bool" => Scalar::Bool,
            "int8" => Scalar::Int8,
            "int16" => Scalar::Int16,
            "int32" => Scalar::Int32,
            "int64" | "int" => Scalar::Int64,
            "uint8" | "byte" => Scalar::Uint8,
            "uint16" => Scalar::Uint16,
            "uint32" => Scalar::Uint32,
            "uint64" | "uint" => Scalar::Uint64,
            "float32" => Scalar::Float32,
            "float64" | "float" => Scalar::Float64,
            _ => return None,
        };
        Some(s)
    }

    /// Logical per-lane width. Booleans are bit-packed.
    pub fn bits(self) -> u32 {
        match self {
            Scalar::Bool => 1,
            Scalar::Int8 | Scalar::Uint8 => 8,
            Scalar::Int16 | Scalar::Uint16 => 16,
            Scalar::Int32 | Scalar::Uint32 | Scalar::Float32 => 32,
            Scalar::Int64 | Scalar::Uint64 | Scalar::Float64 => 64,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Scalar::Bool | Scalar::Float32 | Scalar::Float64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::Float32 | Scalar::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self != Scalar::Bool
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Scalar::Bool => "bool",
            Scalar::Int8 => "int8",
            Scalar::Int16 => "int16",
            Scalar::Int32 => "int32",
            Scalar::Int64 => "int64",
            Scalar::Uint8 => "uint8",
            Scalar::Uint16 => "uint16",
            Scalar::Uint32 => "uint32",
            Scalar::Uint64 => "uint64",
            Scalar::Float32 => "float32",
            Scalar::Float64 => "float64",
        };
        f.write_str(s)
    }
}

/// Lane count of a varying type. The discriminant is visible at runtime, so
/// dispatch on a concrete count is an ordinary match, not a type assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Width {
    /// Plain `varying T`: the target's native lane count.
    Native,
    /// `varying[N] T` with N > 0.
    Fixed(u32),
    /// `varying[] T` (N = 0): accepts any concrete count, no direct operations.
    Universal,
}

/// Why two lane widths failed to combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthClash {
    Mismatch(u32, u32),
    Universal,
}

impl Width {
    /// Width of a binary operation's result. A fixed count wins over native.
    pub fn combine(self, other: Width) -> Result<Width, WidthClash> {
        match (self, other) {
            (Width::Universal, _) | (_, Width::Universal) => Err(WidthClash::Universal),
            (Width::Native, Width::Native) => Ok(Width::Native),
            (Width::Fixed(n), Width::Native) | (Width::Native, Width::Fixed(n)) => Ok(Width::Fixed(n)),
            (Width::Fixed(a), Width::Fixed(b)) if a == b => Ok(Width::Fixed(a)),
            (Width::Fixed(a), Width::Fixed(b)) => Err(WidthClash::Mismatch(a, b)),
        }
    }

    /// Well-formedness of `varying[N] T`: N = 0 or N·bits(T) ≤ MAX_REGISTER_BITS.
    pub fn fits(self, scalar: Scalar) -> bool {
        match self {
            Width::Fixed(n) => u64::from(n) * u64::from(scalar.bits()) <= u64::from(MAX_REGISTER_BITS),
            Width::Native | Width::Universal => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneType {
    Void,
    Uniform(Scalar),
    Varying(Scalar, Width),
    /// Uniform ordered sequence, e.g. a range or `reduce.From`.
    Seq(Scalar),
    /// Native-width groups produced by `lanes.FromConstrained`.
    Groups(Scalar),
    Chan(Box<LaneType>),
}

impl LaneType {
    pub fn is_varying(&self) -> bool {
        matches!(self, LaneType::Varying(..))
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, LaneType::Varying(_, Width::Universal))
    }

    /// Element scalar of a uniform or varying value.
    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            LaneType::Uniform(s) | LaneType::Varying(s, _) => Some(*s),
            _ => None,
        }
    }

    pub fn width(&self) -> Option<Width> {
        match self {
            LaneType::Varying(_, w) => Some(*w),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        self.scalar() == Some(Scalar::Bool)
    }
}

impl std::fmt::Display for LaneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneType::Void => write!(f, "void"),
            LaneType::Uniform(s) => write!(f, "{s}"),
            LaneType::Varying(s, Width::Native) => write!(f, "varying {s}"),
            LaneType::Varying(s, Width::Fixed(n)) => write!(f, "varying[{n}] {s}"),
            LaneType::Varying(s, Width::Universal) => write!(f, "varying[] {s}"),
            LaneType::Seq(s) => write!(f, "[]{s}"),
            LaneType::Groups(s) => write!(f, "groups {s}"),
            LaneType::Chan(inner) => write!(f, "chan {inner}"),
        }
    }
}
