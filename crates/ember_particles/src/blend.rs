//! # Blend State
//!
//! How particle quads are composited, as seen by the renderer.
//!
//! | Mode | Factors (src, dst) | Use |
//! |------|--------------------|-----|
//! | [`BlendMode::Alpha`] | `SrcAlpha`, `OneMinusSrcAlpha` | smoke, dust, anything that blocks light |
//! | [`BlendMode::Additive`] | `SrcAlpha`, `One` | fire, sparks, explosions |
//! | [`BlendMode::Premultiplied`] | `One`, `OneMinusSrcAlpha` | textures with premultiplied alpha |
//!
//! The engine derives the mode from the additive flag and the texture,
//! unless the caller pins one explicitly.

use serde::{Deserialize, Serialize};

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendFactor {
    /// 0
    Zero,
    /// 1
    One,
    /// src.a
    SrcAlpha,
    /// 1 - src.a
    OneMinusSrcAlpha,
}

/// Source/destination factor pair handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendFunc {
    /// Source factor
    pub src: BlendFactor,
    /// Destination factor
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// Straight alpha blending
    pub const ALPHA_NON_PREMULTIPLIED: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Premultiplied alpha blending
    pub const ALPHA_PREMULTIPLIED: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Additive (glow) blending
    pub const ADDITIVE: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::One,
    };
}

/// Particle blend modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Classic alpha blending
    #[default]
    Alpha,
    /// Additive blending - overdraw safe, no sorting needed
    Additive,
    /// Premultiplied alpha blending
    Premultiplied,
}

impl BlendMode {
    /// Returns the factor pair for this mode
    #[must_use]
    pub const fn blend_func(self) -> BlendFunc {
        match self {
            Self::Alpha => BlendFunc::ALPHA_NON_PREMULTIPLIED,
            Self::Additive => BlendFunc::ADDITIVE,
            Self::Premultiplied => BlendFunc::ALPHA_PREMULTIPLIED,
        }
    }

    /// Picks the mode implied by the additive flag and the bound texture.
    ///
    /// Returns the mode and whether published colours must carry RGB
    /// pre-multiplied by alpha.
    #[must_use]
    pub fn derive(additive: bool, texture: Option<TextureHandle>) -> (Self, bool) {
        if additive {
            return (Self::Additive, false);
        }
        match texture {
            Some(t) if t.premultiplied_alpha => (Self::Premultiplied, true),
            _ => (Self::Alpha, false),
        }
    }
}

/// Opaque texture reference. The engine never loads or inspects textures;
/// it forwards the handle to the renderer and reads the alpha flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle {
    /// Renderer-side texture id
    pub id: u32,
    /// Whether texel RGB is already multiplied by alpha
    #[serde(default)]
    pub premultiplied_alpha: bool,
}

impl TextureHandle {
    /// Creates a straight-alpha texture handle
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            premultiplied_alpha: false,
        }
    }

    /// Creates a premultiplied-alpha texture handle
    #[must_use]
    pub const fn premultiplied(id: u32) -> Self {
        Self {
            id,
            premultiplied_alpha: true,
        }
    }
}
