//! Global GL toggle state with change tracking.
//!
//! Application code mutates a [`RenderSetting`] whenever it likes; every
//! setter records the group it touched in [`ChangeFlags`]. The renderer
//! consumes the accumulated flags at most once per frame and pushes a single
//! consolidated update to the backend.
//!
//! The flags are plain data: if a host shares the setting between threads it
//! must serialize access itself, and concurrent writers resolve as
//! last-writer-wins.

use bitflags::bitflags;

use crate::backend::{CullFace, DepthFunc};

bitflags! {
    /// Setting groups changed since the last consumption.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeFlags: u8 {
        /// Clear color.
        const CLEAR_COLOR = 1 << 0;
        /// Depth function, range and clear depth.
        const DEPTH = 1 << 1;
        /// Face culling.
        const CULL_FACE = 1 << 2;
        /// Multisampling.
        const MULTISAMPLE = 1 << 3;
    }
}

bitflags! {
    /// Buffers cleared at the start of a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClearFlags: u8 {
        /// Color buffer.
        const COLOR = 1 << 0;
        /// Depth buffer.
        const DEPTH = 1 << 1;
        /// Stencil buffer.
        const STENCIL = 1 << 2;
    }
}

/// Global render state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSetting {
    clear_flags: ClearFlags,
    cull_face: Option<CullFace>,
    depth_func: Option<DepthFunc>,
    depth_range: [f32; 2],
    multisampling: bool,
    clear_color: [f32; 4],
    clear_depth: f32,
    changes: ChangeFlags,
}

impl Default for RenderSetting {
    /// Clears color and depth to opaque black, no culling, no depth test.
    /// Every group starts flagged so the first frame pushes full state.
    fn default() -> Self {
        Self {
            clear_flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            cull_face: None,
            depth_func: None,
            depth_range: [0.0, 1.0],
            multisampling: false,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
            changes: ChangeFlags::all(),
        }
    }
}

impl RenderSetting {
    /// Buffers cleared by `begin_frame`.
    #[must_use]
    pub fn clear_flags(&self) -> ClearFlags {
        self.clear_flags
    }

    /// Select which buffers `begin_frame` clears. Not a tracked group: the
    /// flags are read every frame.
    pub fn set_clear_flags(&mut self, flags: ClearFlags) {
        self.clear_flags = flags;
    }

    /// Culled faces, `None` when culling is off.
    #[must_use]
    pub fn cull_face(&self) -> Option<CullFace> {
        self.cull_face
    }

    /// Set culled faces, `None` disables culling.
    pub fn set_cull_face(&mut self, cull_face: Option<CullFace>) {
        self.cull_face = cull_face;
        self.changes |= ChangeFlags::CULL_FACE;
    }

    /// Depth function, `None` when depth testing is off.
    #[must_use]
    pub fn depth_func(&self) -> Option<DepthFunc> {
        self.depth_func
    }

    /// Set the depth function, `None` disables depth testing.
    pub fn set_depth_func(&mut self, depth_func: Option<DepthFunc>) {
        self.depth_func = depth_func;
        self.changes |= ChangeFlags::DEPTH;
    }

    /// Depth range as `[near, far]`.
    #[must_use]
    pub fn depth_range(&self) -> [f32; 2] {
        self.depth_range
    }

    /// Set the depth range.
    pub fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_range = [near, far];
        self.changes |= ChangeFlags::DEPTH;
    }

    /// Value the depth buffer is cleared to.
    #[must_use]
    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    /// Set the depth clear value.
    pub fn set_clear_depth(&mut self, depth: f32) {
        self.clear_depth = depth;
        self.changes |= ChangeFlags::DEPTH;
    }

    /// Whether multisampling is enabled.
    #[must_use]
    pub fn multisampling(&self) -> bool {
        self.multisampling
    }

    /// Toggle multisampling.
    pub fn set_multisampling(&mut self, enabled: bool) {
        self.multisampling = enabled;
        self.changes |= ChangeFlags::MULTISAMPLE;
    }

    /// RGBA clear color.
    #[must_use]
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Set the RGBA clear color.
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.changes |= ChangeFlags::CLEAR_COLOR;
    }

    /// Groups changed since the last [`take_changes`](Self::take_changes).
    #[must_use]
    pub fn changes(&self) -> ChangeFlags {
        self.changes
    }

    /// Return the pending change flags and clear them.
    pub fn take_changes(&mut self) -> ChangeFlags {
        std::mem::take(&mut self.changes)
    }

    /// Flag every group, forcing a full push on the next frame.
    pub fn mark_all_changed(&mut self) {
        self.changes = ChangeFlags::all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_setting_is_fully_dirty() {
        let setting = RenderSetting::default();
        assert_eq!(setting.changes(), ChangeFlags::all());
    }

    #[test]
    fn setters_flag_their_group() {
        let mut setting = RenderSetting::default();
        setting.take_changes();

        setting.set_clear_color([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(setting.changes(), ChangeFlags::CLEAR_COLOR);

        setting.set_depth_range(0.1, 0.9);
        setting.set_clear_depth(0.5);
        setting.set_depth_func(Some(DepthFunc::Less));
        assert_eq!(setting.changes(), ChangeFlags::CLEAR_COLOR | ChangeFlags::DEPTH);

        setting.set_cull_face(Some(CullFace::Back));
        setting.set_multisampling(true);
        assert_eq!(setting.changes(), ChangeFlags::all());
    }

    #[test]
    fn take_changes_clears_flags() {
        let mut setting = RenderSetting::default();
        setting.set_multisampling(true);
        assert_eq!(setting.take_changes(), ChangeFlags::all());
        assert!(setting.changes().is_empty());
        assert!(setting.take_changes().is_empty());
    }

    #[test]
    fn clear_flags_are_not_tracked() {
        let mut setting = RenderSetting::default();
        setting.take_changes();
        setting.set_clear_flags(ClearFlags::COLOR);
        assert!(setting.changes().is_empty());
        assert_eq!(setting.clear_flags(), ClearFlags::COLOR);
    }
}
