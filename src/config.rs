use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::CompileError;
use crate::typeck::types::Scalar;

/// Widest logical register any varying value may occupy, in bits. Fixed and
/// target-independent so the same program is accepted on every target.
pub const MAX_REGISTER_BITS: u32 = 512;

/// Environment variable naming a preset or a TOML file to load.
pub const TARGET_ENV: &str = "LANEC_TARGET";

/// Native SIMD shape of the compilation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub register_bits: u32,
}

const PRESETS: &[(&str, u32)] = &[
    ("sse4", 128),
    ("neon", 128),
    ("wasm-simd128", 128),
    ("avx2", 256),
    ("avx512", 512),
];

impl Default for TargetConfig {
    fn default() -> Self {
        Self { name: "avx2".to_string(), register_bits: 256 }
    }
}

impl TargetConfig {
    pub fn new(name: impl Into<String>, register_bits: u32) -> Result<Self, CompileError> {
        let cfg = Self { name: name.into(), register_bits };
        cfg.validate(None)?;
        Ok(cfg)
    }

    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(n, bits)| Self { name: n.to_string(), register_bits: *bits })
    }

    pub fn preset_names() -> impl Iterator<Item = &'static str> {
        PRESETS.iter().map(|(n, _)| *n)
    }

    /// Native lane count for one register of `scalar` elements. Bools use a
    /// byte-wide lane indicator internally.
    pub fn lane_width(&self, scalar: Scalar) -> u32 {
        self.register_bits / scalar.bits().max(8)
    }

    pub fn from_toml_str(content: &str, path: Option<&Path>) -> Result<Self, CompileError> {
        let owned_path = || path.map(Path::to_path_buf);
        let raw: TomlConfig = toml::from_str(content)
            .map_err(|e| CompileError::config(format!("invalid target config: {e}"), owned_path()))?;
        let t = raw.target;

        let mut cfg = match &t.preset {
            Some(p) => Self::preset(p).ok_or_else(|| {
                CompileError::config(format!("unknown target preset '{p}'"), owned_path())
            })?,
            None => {
                let bits = t.register_bits.ok_or_else(|| {
                    CompileError::config(
                        "target needs either 'preset' or 'register_bits'",
                        owned_path(),
                    )
                })?;
                Self { name: "custom".to_string(), register_bits: bits }
            }
        };
        if t.preset.is_some() && let Some(bits) = t.register_bits {
            cfg.register_bits = bits;
        }
        if let Some(name) = t.name {
            cfg.name = name;
        }
        cfg.validate(path)?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("failed to read target config: {e}"), Some(path.to_path_buf()))
        })?;
        Self::from_toml_str(&content, Some(path))
    }

    /// Resolve from `LANEC_TARGET`: a preset name, or a path to a TOML file.
    /// Falls back to the default target when unset.
    pub fn from_env() -> Result<Self, CompileError> {
        match std::env::var(TARGET_ENV) {
            Ok(value) => Self::resolve(&value),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn resolve(value: &str) -> Result<Self, CompileError> {
        if let Some(cfg) = Self::preset(value) {
            return Ok(cfg);
        }
        let path = Path::new(value);
        if path.exists() {
            return Self::load(path);
        }
        Err(CompileError::config(
            format!("'{value}' is neither a target preset nor a config file"),
            None,
        ))
    }

    fn validate(&self, path: Option<&Path>) -> Result<(), CompileError> {
        let bits = self.register_bits;
        if !bits.is_power_of_two() || !(64..=MAX_REGISTER_BITS).contains(&bits) {
            return Err(CompileError::config(
                format!(
                    "register_bits must be a power of two between 64 and {MAX_REGISTER_BITS}, got {bits}"
                ),
                path.map(Path::to_path_buf),
            ));
        }
        Ok(())
    }
}

// ---- TOML deserialization types ----

#[derive(Deserialize)]
struct TomlConfig {
    target: TomlTarget,
}

#[derive(Deserialize)]
struct TomlTarget {
    preset: Option<String>,
    name: Option<String>,
    register_bits: Option<u32>,
}
