//! Maps a requested preset token onto a [`Preset`].

use std::fmt;

use crate::presets::Preset;

/// A preset token that matched nothing; the selection fell back to soft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

impl fmt::Display for UnknownPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown preset \"{}\", falling back to {}",
            self.0,
            Preset::Soft
        )
    }
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetRequest {
    pub token: String,
    /// Forces bone-only regardless of `token`.
    pub bone_only: bool,
}

impl Default for PresetRequest {
    fn default() -> Self {
        Self {
            token: Preset::Soft.name().to_string(),
            bone_only: false,
        }
    }
}

impl PresetRequest {
    pub fn new(token: impl Into<String>, bone_only: bool) -> Self {
        Self {
            token: token.into(),
            bone_only,
        }
    }
}

/// The outcome of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub preset: Preset,
    pub fallback: Option<UnknownPreset>,
}

fn normalize(token: &str) -> String {
    token.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

/// Select a preset. Bone-only wins over everything, cinematic over the
/// windowed presets, and anything unrecognized becomes soft with a warning.
pub fn select(request: &PresetRequest) -> Selection {
    let token = normalize(&request.token);
    let preset = if request.bone_only || token == "bone-only" || token == "boneonly" {
        Some(Preset::BoneOnly)
    } else {
        match token.as_str() {
            "cinematic" => Some(Preset::Cinematic),
            "soft" => Some(Preset::Soft),
            "bone" => Some(Preset::Bone),
            "lung" => Some(Preset::Lung),
            _ => None,
        }
    };

    match preset {
        Some(preset) => {
            tracing::debug!("Selected preset {preset}");
            Selection {
                preset,
                fallback: None,
            }
        }
        None => {
            let unknown = UnknownPreset(request.token.clone());
            tracing::warn!("{unknown}");
            Selection {
                preset: Preset::Soft,
                fallback: Some(unknown),
            }
        }
    }
}
