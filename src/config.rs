use crate::course::CourseDefinition;
use crate::models::Resolution;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level settings shared by every minigame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub camera: Resolution,
    pub display: Resolution,
    /// Fixed game-time step, in ticks per second
    pub tick_rate_hz: u32,
    /// Sleep between ticks to hold the tick rate in wall-clock time
    pub pace_ticks: bool,
    /// Read frames on a background thread through a latest-frame slot
    pub threaded_capture: bool,
    pub segmentation: SegmentationConfig,
    pub blobs: BlobConfig,
    pub tracker: TrackerConfig,
    pub gesture: GestureConfig,
    pub solder_trace: SolderTraceConfig,
    pub wire_connect: WireConnectConfig,
    pub robo_factory: RoboFactoryConfig,
    pub it_defender: ItDefenderConfig,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            camera: Resolution::new(640, 480),
            display: Resolution::new(800, 480),
            tick_rate_hz: 30,
            pace_ticks: false,
            threaded_capture: false,
            segmentation: SegmentationConfig::default(),
            blobs: BlobConfig::default(),
            tracker: TrackerConfig::default(),
            gesture: GestureConfig::default(),
            solder_trace: SolderTraceConfig::default(),
            wire_connect: WireConnectConfig::default(),
            robo_factory: RoboFactoryConfig::default(),
            it_defender: ItDefenderConfig::default(),
        }
    }
}

impl ArcadeConfig {
    pub fn tick_step(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ArcadeConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Minimum HSV value (brightness) for a pixel to count as in-band
    pub sensitivity: u8,
    /// Maximum HSV saturation; bright spots are close to white
    pub saturation_ceiling: u8,
    /// Radius of the erode and dilate passes
    pub morphology_passes: u8,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            sensitivity: 240,
            saturation_ceiling: 100,
            morphology_passes: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub min_area: u32,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self { min_area: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Maximum centroid displacement (camera pixels) accepted as the same target
    pub search_radius: f32,
    /// When set, a locked tracker never falls back to searching on its own
    pub sticky_lock: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            search_radius: 150.0,
            sticky_lock: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Fingertip to thumb-tip distance (game pixels) below which a pinch is reported
    pub pinch_threshold: f32,
    /// Optional exponential smoothing factor applied to the gesture cursor
    pub smoothing: Option<f32>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 40.0,
            smoothing: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolderTraceConfig {
    pub course: CourseDefinition,
    /// Smoothing of freshly mapped detections
    pub target_alpha: f32,
    /// Smoothing of the solder tip following the target
    pub follow_alpha: f32,
    pub base_score: i64,
    pub min_score: i64,
    pub penalty_per_second: i64,
    /// Ticks the failure is shown before the repair task starts
    pub fail_hold_ticks: u32,
}

impl Default for SolderTraceConfig {
    fn default() -> Self {
        Self {
            course: CourseDefinition::default(),
            target_alpha: 0.5,
            follow_alpha: 0.2,
            base_score: 10_000,
            min_score: 100,
            penalty_per_second: 100,
            fail_hold_ticks: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConnectConfig {
    /// Colour names of the left connectors, top to bottom
    pub left_order: Vec<String>,
    /// Colour names of the right connectors, top to bottom
    pub right_order: Vec<String>,
    pub first_row_y: f32,
    pub row_spacing: f32,
}

impl Default for WireConnectConfig {
    fn default() -> Self {
        let colors: Vec<String> = ["red", "blue", "yellow", "pink"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        Self {
            left_order: colors.clone(),
            right_order: colors.into_iter().rev().collect(),
            first_row_y: 150.0,
            row_spacing: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoboFactoryConfig {
    pub pinch_threshold: f32,
    pub duration_secs: f32,
    /// Pixels the belt moves per tick
    pub belt_speed: f32,
    /// Ticks between spawn bursts
    pub spawn_interval: u32,
    pub robot_bonus: i64,
    /// Distance within which a dropped part snaps into its slot
    pub snap_distance: f32,
}

impl Default for RoboFactoryConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 60.0,
            duration_secs: 30.0,
            belt_speed: 10.0,
            spawn_interval: 40,
            robot_bonus: 100,
            snap_distance: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItDefenderConfig {
    /// Smoothing factor applied to the nose and both wrists
    pub smoothing: f32,
    pub starting_health: i32,
    /// Fall speed in pixels per tick at difficulty 1
    pub fall_speed: f32,
    /// Ticks between spawns at score 0
    pub spawn_interval: u32,
    /// Spawns never come closer together than this
    pub min_spawn_interval: u32,
    pub patch_points: i64,
    pub boss_points: i64,
    pub error_damage: i32,
    pub boss_damage: i32,
}

impl Default for ItDefenderConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            starting_health: 100,
            fall_speed: 5.5,
            spawn_interval: 45,
            min_spawn_interval: 20,
            patch_points: 10,
            boss_points: 100,
            error_damage: 15,
            boss_damage: 30,
        }
    }
}
