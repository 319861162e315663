use serde::{Deserialize, Serialize};

use super::view::SortMode;

/// Configuration from gtd.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ordering: OrderingConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Gap left between consecutive position keys when (re)numbering
    #[serde(default = "default_position_stride")]
    pub position_stride: i64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        OrderingConfig {
            position_stride: default_position_stride(),
        }
    }
}

pub const DEFAULT_POSITION_STRIDE: i64 = 1024;

fn default_position_stride() -> i64 {
    DEFAULT_POSITION_STRIDE
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default)]
    pub show_deferred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// How many days ahead the `upcoming` quick filter looks
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            upcoming_days: default_upcoming_days(),
        }
    }
}

fn default_upcoming_days() -> u32 {
    7
}

/// Which date a completed recurring action's next due date is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPolicy {
    /// The completed action's due date (falls back to the completion date)
    #[default]
    DueDate,
    /// The moment the action was completed
    Completion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    #[serde(default)]
    pub anchor: AnchorPolicy,
}
