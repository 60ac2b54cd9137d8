// DispmanX backend: maps the Compositor trait onto the Broadcom VideoCore
// bindings. Only builds on a Raspberry Pi (cargo feature `dispmanx`).

use videocore::bcm_host;
use videocore::dispmanx;
use videocore::image::{ImageType, Rect};

use super::{
    Compositor, CompositorError, DisplayInfo, ElementId, ElementSpec, PixelRect, ResourceId,
    UpdateId,
};
use crate::surface::FrameBuffer;

/// Update priority handed to `update_start`.
const UPDATE_PRIORITY: i32 = 10;

/// Attribute-change flag for opacity; the vendor headers do not export it.
const ELEMENT_CHANGE_OPACITY: u32 = 1 << 1;

/// Map a vendor status (`true` = non-success) onto a compositor error.
fn status(failed: bool, err: CompositorError) -> Result<(), CompositorError> {
    if failed {
        Err(err)
    } else {
        Ok(())
    }
}

fn pixel_rect(rect: &PixelRect) -> Rect {
    Rect {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

/// Source rectangles are given to the driver in 16.16 fixed point.
fn source_rect(rect: &PixelRect) -> Rect {
    Rect {
        x: rect.x << 16,
        y: rect.y << 16,
        width: rect.width << 16,
        height: rect.height << 16,
    }
}

fn alpha_descriptor(opacity: u8) -> dispmanx::VCAlpha {
    dispmanx::VCAlpha {
        // FROM_SOURCE is 0 in the vendor enum, so source|fixed collapses
        // to the fixed-all-pixels variant.
        flags: dispmanx::FlagsAlpha::FIXED_ALL_PIXELS,
        opacity: u32::from(opacity),
        mask: 0,
    }
}

/// Compositor backed by the VideoCore DispmanX API.
pub struct DispmanxCompositor {
    display: Option<dispmanx::DisplayHandle>,
}

impl DispmanxCompositor {
    pub fn new() -> Self {
        bcm_host::init();
        Self { display: None }
    }

    fn display(&self) -> Result<dispmanx::DisplayHandle, CompositorError> {
        self.display.ok_or(CompositorError::DisplayInfo)
    }
}

impl Default for DispmanxCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DispmanxCompositor {
    fn drop(&mut self) {
        bcm_host::deinit();
    }
}

impl Compositor for DispmanxCompositor {
    fn open_display(&mut self, device: u32) -> Result<DisplayInfo, CompositorError> {
        let display = dispmanx::display_open(device);
        if display == 0 {
            return Err(CompositorError::DisplayOpen(device));
        }

        // Modeinfo is filled in by the driver.
        let mut info: dispmanx::Modeinfo = unsafe { std::mem::zeroed() };
        if dispmanx::display_get_info(display, &mut info) {
            dispmanx::display_close(display);
            return Err(CompositorError::DisplayInfo);
        }

        self.display = Some(display);
        Ok(DisplayInfo {
            width: info.width as u32,
            height: info.height as u32,
        })
    }

    fn close_display(&mut self) -> Result<(), CompositorError> {
        let display = self.display.take().ok_or(CompositorError::DisplayClose)?;
        status(dispmanx::display_close(display), CompositorError::DisplayClose)
    }

    fn create_resource(&mut self, width: u32, height: u32) -> Result<ResourceId, CompositorError> {
        let mut native_image_handle = 0;
        let resource =
            dispmanx::resource_create(ImageType::RGB565, width, height, &mut native_image_handle);
        if resource == 0 {
            return Err(CompositorError::ResourceCreate { width, height });
        }
        Ok(ResourceId(resource))
    }

    fn write_pixels(
        &mut self,
        resource: ResourceId,
        frame: &FrameBuffer,
    ) -> Result<(), CompositorError> {
        let rect = Rect {
            x: 0,
            y: 0,
            width: frame.width() as i32,
            height: frame.height() as i32,
        };
        status(
            dispmanx::resource_write_data(
                resource.0,
                ImageType::RGB565,
                frame.pitch() as i32,
                frame.data().as_ptr() as *mut _,
                &rect,
            ),
            CompositorError::ResourceWrite,
        )
    }

    fn delete_resource(&mut self, resource: ResourceId) -> Result<(), CompositorError> {
        status(
            dispmanx::resource_delete(resource.0),
            CompositorError::ResourceDelete,
        )
    }

    fn begin_update(&mut self) -> Result<UpdateId, CompositorError> {
        let update = dispmanx::update_start(UPDATE_PRIORITY);
        if update == 0 {
            return Err(CompositorError::UpdateStart);
        }
        Ok(UpdateId(update))
    }

    fn submit_sync(&mut self, update: UpdateId) -> Result<(), CompositorError> {
        status(
            dispmanx::update_submit_sync(update.0),
            CompositorError::UpdateSubmit,
        )
    }

    fn add_element(
        &mut self,
        update: UpdateId,
        resource: ResourceId,
        spec: &ElementSpec,
    ) -> Result<ElementId, CompositorError> {
        let display = self.display()?;
        let mut dest = pixel_rect(&spec.dest);
        let mut src = source_rect(&spec.src);
        let mut alpha = alpha_descriptor(spec.opacity);

        let element = dispmanx::element_add(
            update.0,
            display,
            spec.layer,
            &mut dest,
            resource.0,
            &mut src,
            dispmanx::Protection::NONE,
            &mut alpha,
            std::ptr::null_mut(),
            videocore::image::Transform::ROT0,
        );
        if element == 0 {
            return Err(CompositorError::ElementAdd);
        }
        Ok(ElementId(element))
    }

    fn change_element_opacity(
        &mut self,
        update: UpdateId,
        element: ElementId,
        spec: &ElementSpec,
    ) -> Result<(), CompositorError> {
        let dest = pixel_rect(&spec.dest);
        let src = source_rect(&spec.src);
        status(
            dispmanx::element_change_attributes(
                update.0,
                element.0,
                ELEMENT_CHANGE_OPACITY,
                spec.layer,
                spec.opacity,
                &dest,
                &src,
                0,
                videocore::image::Transform::ROT0,
            ),
            CompositorError::ElementChange,
        )
    }

    fn remove_element(
        &mut self,
        update: UpdateId,
        element: ElementId,
    ) -> Result<(), CompositorError> {
        status(
            dispmanx::element_remove(update.0, element.0),
            CompositorError::ElementRemove,
        )
    }
}
