//! Scene JSON contract (v0.1), decoded as-is from the package. See §6.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SceneDocument {
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    #[serde(rename = "sceneId")]
    pub scene_id: String,
    pub canvas: CanvasDoc,
    #[serde(default)]
    pub background: Option<serde_json::Value>,
    #[serde(rename = "mediaBlocks")]
    #[serde(default)]
    pub media_blocks: Vec<BlockDoc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanvasDoc {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    #[serde(rename = "durationFrames")]
    pub duration_frames: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockDoc {
    #[serde(rename = "blockId")]
    pub block_id: String,
    #[serde(rename = "zIndex")]
    pub z_index: i32,
    pub rect: RectDoc,
    #[serde(rename = "containerClip")]
    #[serde(default)]
    pub container_clip: Option<String>,
    #[serde(default)]
    pub timing: Option<TimingDoc>,
    pub input: InputDoc,
    pub variants: Vec<VariantDoc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RectDoc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimingDoc {
    #[serde(rename = "startFrame")]
    pub start_frame: u32,
    #[serde(rename = "endFrame")]
    pub end_frame: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputDoc {
    pub rect: RectDoc,
    #[serde(rename = "bindingKey")]
    #[serde(default = "default_binding_key")]
    pub binding_key: String,
    #[serde(rename = "maskRef")]
    #[serde(default)]
    pub mask_ref: Option<String>,
    #[serde(rename = "hitTest")]
    #[serde(default = "default_hit_test")]
    pub hit_test: String,
    #[serde(rename = "allowedMedia")]
    pub allowed_media: Vec<String>,
    #[serde(rename = "emptyPolicy")]
    #[serde(default)]
    pub empty_policy: Option<String>,
    #[serde(rename = "fitModesAllowed")]
    #[serde(default)]
    pub fit_modes_allowed: Vec<String>,
    #[serde(rename = "defaultFit")]
    #[serde(default)]
    pub default_fit: Option<String>,
    #[serde(rename = "userTransformsAllowed")]
    #[serde(default)]
    pub user_transforms_allowed: Option<UserTransformsAllowedDoc>,
}

fn default_binding_key() -> String {
    "media".to_string()
}

fn default_hit_test() -> String {
    "rect".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UserTransformsAllowedDoc {
    #[serde(default)]
    pub pan: bool,
    #[serde(default)]
    pub zoom: bool,
    #[serde(default)]
    pub rotate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantDoc {
    #[serde(rename = "variantId")]
    pub variant_id: String,
    #[serde(rename = "animRef")]
    pub anim_ref: String,
    #[serde(rename = "defaultDurationFrames")]
    #[serde(default)]
    pub default_duration_frames: Option<u32>,
    #[serde(rename = "loopRange")]
    #[serde(default)]
    pub loop_range: Option<LoopRangeDoc>,
    #[serde(rename = "ifAnimationShorter")]
    #[serde(default)]
    pub if_animation_shorter: Option<String>,
    #[serde(rename = "ifAnimationLonger")]
    #[serde(default)]
    pub if_animation_longer: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LoopRangeDoc {
    #[serde(rename = "startFrame")]
    pub start_frame: u32,
    #[serde(rename = "endFrame")]
    pub end_frame: u32,
}
