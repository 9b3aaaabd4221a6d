// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Which image the present pass shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugView {
    #[default]
    Denoised,
    Raw,
    Normals,
    Depth,
    Motion,
}

impl DebugView {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Denoised => 0,
            Self::Raw => 1,
            Self::Normals => 2,
            Self::Depth => 3,
            Self::Motion => 4,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Denoised => Self::Raw,
            Self::Raw => Self::Normals,
            Self::Normals => Self::Depth,
            Self::Depth => Self::Motion,
            Self::Motion => Self::Denoised,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Denoised => "denoised",
            Self::Raw => "raw",
            Self::Normals => "normals",
            Self::Depth => "depth",
            Self::Motion => "motion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    Performance,
    Ultra,
}

impl QualityPreset {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Performance => 0,
            Self::Ultra => 1,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Performance => Self::Ultra,
            Self::Ultra => Self::Performance,
        }
    }
}

/// Runtime feature toggles, each mapped 1:1 to a flag in the uniform blocks.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub temporal_filter: bool,
    pub spatial_filter: bool,
    pub debug_view: DebugView,
    pub preset: QualityPreset,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            temporal_filter: true,
            spatial_filter: true,
            debug_view: DebugView::Denoised,
            preset: QualityPreset::Ultra,
        }
    }
}

/// The closed set of operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleTemporal,
    ToggleSpatial,
    CycleDebugView,
    TogglePreset,
    ResetHistory,
}

impl Command {
    /// Apply the command to the settings. Returns true if accumulated
    /// history must be discarded (the command changed what is accumulated).
    pub fn apply(self, settings: &mut RenderSettings) -> bool {
        match self {
            Self::ToggleTemporal => {
                settings.temporal_filter = !settings.temporal_filter;
                log::info!("temporal accumulation: {}", settings.temporal_filter);
                true
            }
            Self::ToggleSpatial => {
                settings.spatial_filter = !settings.spatial_filter;
                log::info!("spatial filter: {}", settings.spatial_filter);
                false
            }
            Self::CycleDebugView => {
                settings.debug_view = settings.debug_view.next();
                log::info!("debug view: {}", settings.debug_view.label());
                false
            }
            Self::TogglePreset => {
                settings.preset = settings.preset.toggle();
                log::info!("quality preset: {:?}", settings.preset);
                true
            }
            Self::ResetHistory => {
                log::info!("history reset requested");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_view_cycle_wraps() {
        let mut view = DebugView::Denoised;
        for _ in 0..5 {
            view = view.next();
        }
        assert_eq!(view, DebugView::Denoised);
    }

    #[test]
    fn test_toggle_temporal_requests_reset() {
        let mut settings = RenderSettings::default();
        assert!(Command::ToggleTemporal.apply(&mut settings));
        assert!(!settings.temporal_filter);
        assert!(Command::ToggleTemporal.apply(&mut settings));
        assert!(settings.temporal_filter);
    }

    #[test]
    fn test_spatial_and_debug_keep_history() {
        let mut settings = RenderSettings::default();
        assert!(!Command::ToggleSpatial.apply(&mut settings));
        assert!(!Command::CycleDebugView.apply(&mut settings));
        assert_eq!(settings.debug_view, DebugView::Raw);
    }

    #[test]
    fn test_reset_history_is_pure_reset() {
        let mut settings = RenderSettings::default();
        let before = settings;
        assert!(Command::ResetHistory.apply(&mut settings));
        assert_eq!(settings.temporal_filter, before.temporal_filter);
        assert_eq!(settings.debug_view, before.debug_view);
    }
}
