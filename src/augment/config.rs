//! Augmentation tuning.
//!
//! Every field has a default, so a YAML file only needs the keys it wants
//! to change:
//!
//! ```yaml
//! rotate:
//!   p: 0.8
//!   limit_deg: 15
//! dropout:
//!   p: 0.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CurateError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlipConfig {
    pub p: f64,
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self { p: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotateConfig {
    pub p: f64,
    /// Maximum absolute rotation angle in degrees.
    pub limit_deg: f64,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            p: 0.5,
            limit_deg: 30.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrightnessContrastConfig {
    pub p: f64,
    /// Brightness offset range as a fraction of full scale.
    pub brightness_limit: f64,
    /// Contrast gain range around 1.0.
    pub contrast_limit: f64,
}

impl Default for BrightnessContrastConfig {
    fn default() -> Self {
        Self {
            p: 0.5,
            brightness_limit: 0.2,
            contrast_limit: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HsvConfig {
    pub p: f64,
    /// Hue shift limit in degrees.
    pub hue_shift_deg: f64,
    /// Saturation shift limit on a 0-255 scale.
    pub sat_shift: f64,
    /// Value shift limit on a 0-255 scale.
    pub val_shift: f64,
}

impl Default for HsvConfig {
    fn default() -> Self {
        Self {
            p: 0.5,
            hue_shift_deg: 20.0,
            sat_shift: 15.0,
            val_shift: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseConfig {
    pub p: f64,
    pub var_min: f64,
    pub var_max: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            p: 0.3,
            var_min: 10.0,
            var_max: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionBlurConfig {
    pub p: f64,
    /// Largest kernel length in pixels. Kernels are odd and at least 3.
    pub max_kernel: u32,
}

impl Default for MotionBlurConfig {
    fn default() -> Self {
        Self {
            p: 0.3,
            max_kernel: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropoutConfig {
    pub p: f64,
    pub min_holes: u32,
    pub max_holes: u32,
    /// Minimum hole side in pixels.
    pub min_size: u32,
    /// Maximum hole side in pixels.
    pub max_size: u32,
    /// Fill intensity for every channel.
    pub fill: u8,
}

impl Default for DropoutConfig {
    fn default() -> Self {
        Self {
            p: 0.3,
            min_holes: 2,
            max_holes: 8,
            min_size: 10,
            max_size: 20,
            fill: 0,
        }
    }
}

/// Probabilities and magnitudes for each augmentation step, in pipeline
/// order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentConfig {
    pub flip: FlipConfig,
    pub rotate: RotateConfig,
    pub brightness_contrast: BrightnessContrastConfig,
    pub hsv: HsvConfig,
    pub noise: NoiseConfig,
    pub motion_blur: MotionBlurConfig,
    pub dropout: DropoutConfig,
}

impl AugmentConfig {
    /// A config with every step disabled.
    pub fn disabled() -> Self {
        let mut config = Self::default();
        config.flip.p = 0.0;
        config.rotate.p = 0.0;
        config.brightness_contrast.p = 0.0;
        config.hsv.p = 0.0;
        config.noise.p = 0.0;
        config.motion_blur.p = 0.0;
        config.dropout.p = 0.0;
        config
    }

    /// Load and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, CurateError> {
        if !path.is_file() {
            return Err(CurateError::ConfigMissing {
                path: path.to_path_buf(),
                message: "augmentation config file not found".to_string(),
            });
        }

        let data = fs::read_to_string(path).map_err(|err| CurateError::ConfigMissing {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let config: Self =
            serde_yaml::from_str(&data).map_err(|source| CurateError::AugmentConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), CurateError> {
        let invalid = |message: String| CurateError::InvalidAugmentConfig {
            path: path.to_path_buf(),
            message,
        };

        let probabilities = [
            ("flip", self.flip.p),
            ("rotate", self.rotate.p),
            ("brightness_contrast", self.brightness_contrast.p),
            ("hsv", self.hsv.p),
            ("noise", self.noise.p),
            ("motion_blur", self.motion_blur.p),
            ("dropout", self.dropout.p),
        ];
        for (step, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("{step}.p = {p} is outside [0, 1]")));
            }
        }

        if !(0.0..=180.0).contains(&self.rotate.limit_deg) {
            return Err(invalid(format!(
                "rotate.limit_deg = {} is outside [0, 180]",
                self.rotate.limit_deg
            )));
        }
        let magnitudes = [
            ("brightness_contrast.brightness_limit", self.brightness_contrast.brightness_limit),
            ("brightness_contrast.contrast_limit", self.brightness_contrast.contrast_limit),
            ("hsv.hue_shift_deg", self.hsv.hue_shift_deg),
            ("hsv.sat_shift", self.hsv.sat_shift),
            ("hsv.val_shift", self.hsv.val_shift),
            ("noise.var_min", self.noise.var_min),
            ("noise.var_max", self.noise.var_max),
        ];
        for (field, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{field} = {value} must be a non-negative number"
                )));
            }
        }

        if self.noise.var_min > self.noise.var_max {
            return Err(invalid(format!(
                "noise variance range {}..{} is invalid",
                self.noise.var_min, self.noise.var_max
            )));
        }
        if self.motion_blur.max_kernel < 3 {
            return Err(invalid("motion_blur.max_kernel must be at least 3".to_string()));
        }
        if self.dropout.min_holes > self.dropout.max_holes {
            return Err(invalid("dropout.min_holes exceeds max_holes".to_string()));
        }
        if self.dropout.min_size == 0 || self.dropout.min_size > self.dropout.max_size {
            return Err(invalid(format!(
                "dropout hole size range {}..{} is invalid",
                self.dropout.min_size, self.dropout.max_size
            )));
        }

        Ok(())
    }
}
