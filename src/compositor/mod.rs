// Compositor seam: the handle-based contract scrim needs from the display
// driver, kept narrow so the session logic never touches vendor types.

#[cfg(feature = "dispmanx")]
pub mod dispmanx;
#[cfg(test)]
pub mod mock;

use crate::surface::FrameBuffer;

/// Pixel dimensions of an open display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub width: u32,
    pub height: u32,
}

/// A GPU-resident image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub u32);

/// An on-screen element instancing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementId(pub u32);

/// An open update transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateId(pub u32);

/// Integer pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Full-screen rectangle for a display.
    pub fn full(info: &DisplayInfo) -> Self {
        Self {
            x: 0,
            y: 0,
            width: info.width as i32,
            height: info.height as i32,
        }
    }
}

/// Everything the driver needs to place and blend one element.
///
/// Opacity changes must resend the whole descriptor, so the session keeps
/// one of these per element and only rewrites `opacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpec {
    /// Z-order layer; higher composites above.
    pub layer: i32,
    /// On-screen destination rectangle.
    pub dest: PixelRect,
    /// Source rectangle within the resource.
    pub src: PixelRect,
    /// Blend opacity, 0 (invisible) to 255 (opaque).
    pub opacity: u8,
}

/// Errors from the display driver. Every variant is a non-success status
/// from exactly one external call.
#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("failed to open display {0}")]
    DisplayOpen(u32),
    #[error("failed to read display info")]
    DisplayInfo,
    #[error("failed to close display")]
    DisplayClose,
    #[error("failed to create {width}x{height} pixel resource")]
    ResourceCreate { width: u32, height: u32 },
    #[error("failed to upload pixel data")]
    ResourceWrite,
    #[error("failed to delete pixel resource")]
    ResourceDelete,
    #[error("failed to start an update")]
    UpdateStart,
    #[error("update submit was rejected")]
    UpdateSubmit,
    #[error("failed to add overlay element")]
    ElementAdd,
    #[error("failed to change element opacity")]
    ElementChange,
    #[error("failed to remove overlay element")]
    ElementRemove,
}

/// Handle-based access to the display compositor.
///
/// Element state may only be touched between [`begin_update`] and
/// [`submit_sync`]; nothing becomes visible until the submit returns.
///
/// [`begin_update`]: Compositor::begin_update
/// [`submit_sync`]: Compositor::submit_sync
pub trait Compositor {
    /// Open a display and report its geometry.
    fn open_display(&mut self, device: u32) -> Result<DisplayInfo, CompositorError>;

    /// Close the display opened by [`open_display`](Compositor::open_display).
    fn close_display(&mut self) -> Result<(), CompositorError>;

    /// Create an empty RGB565 image resource.
    fn create_resource(&mut self, width: u32, height: u32) -> Result<ResourceId, CompositorError>;

    /// Upload a frame's pixels into a resource.
    fn write_pixels(
        &mut self,
        resource: ResourceId,
        frame: &FrameBuffer,
    ) -> Result<(), CompositorError>;

    /// Free a resource.
    fn delete_resource(&mut self, resource: ResourceId) -> Result<(), CompositorError>;

    /// Open an update transaction.
    fn begin_update(&mut self) -> Result<UpdateId, CompositorError>;

    /// Apply an update. Blocks until the compositor has the frame live.
    fn submit_sync(&mut self, update: UpdateId) -> Result<(), CompositorError>;

    /// Add an element showing `resource` per `spec`.
    fn add_element(
        &mut self,
        update: UpdateId,
        resource: ResourceId,
        spec: &ElementSpec,
    ) -> Result<ElementId, CompositorError>;

    /// Re-send an element's descriptor with a new opacity.
    fn change_element_opacity(
        &mut self,
        update: UpdateId,
        element: ElementId,
        spec: &ElementSpec,
    ) -> Result<(), CompositorError>;

    /// Remove an element from the screen.
    fn remove_element(
        &mut self,
        update: UpdateId,
        element: ElementId,
    ) -> Result<(), CompositorError>;
}
