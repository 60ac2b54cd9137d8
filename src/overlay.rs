// Overlay scene: owns the uploaded pixel resource and the composited
// element, and brackets every on-screen change in an update transaction.

use crate::compositor::{
    Compositor, CompositorError, DisplayInfo, ElementId, ElementSpec, PixelRect, ResourceId,
};
use crate::config::types::Config;
use crate::surface::FrameBuffer;

/// The on-screen overlay: one full-screen element over one solid-color
/// resource. Created visible at the configured initial opacity.
#[derive(Debug)]
pub struct OverlayScene {
    resource: ResourceId,
    element: ElementId,
    spec: ElementSpec,
}

impl OverlayScene {
    /// Upload a solid fill and composite it above the desktop.
    ///
    /// If a step after resource creation fails, the resource is released
    /// best-effort before the error propagates.
    pub fn create<C: Compositor>(
        comp: &mut C,
        info: &DisplayInfo,
        config: &Config,
    ) -> Result<Self, CompositorError> {
        let resource = comp.create_resource(info.width, info.height)?;
        match Self::show(comp, info, config, resource) {
            Ok(scene) => Ok(scene),
            Err(e) => {
                if let Err(del) = comp.delete_resource(resource) {
                    log::warn!("cleanup after failed overlay setup: {del}");
                }
                Err(e)
            }
        }
    }

    fn show<C: Compositor>(
        comp: &mut C,
        info: &DisplayInfo,
        config: &Config,
        resource: ResourceId,
    ) -> Result<Self, CompositorError> {
        // The CPU-side buffer only lives until the upload returns.
        let frame = FrameBuffer::solid(info.width, info.height, config.fill.rgb565());
        comp.write_pixels(resource, &frame)?;
        drop(frame);

        let spec = ElementSpec {
            layer: config.display.layer,
            dest: PixelRect::full(info),
            src: PixelRect::full(info),
            opacity: config.opacity.initial,
        };

        let update = comp.begin_update()?;
        let element = match comp.add_element(update, resource, &spec) {
            Ok(element) => element,
            Err(e) => {
                // Close the bracket before bailing out.
                if let Err(sub) = comp.submit_sync(update) {
                    log::warn!("submit after failed element add: {sub}");
                }
                return Err(e);
            }
        };
        comp.submit_sync(update)?;

        Ok(Self {
            resource,
            element,
            spec,
        })
    }

    /// The last opacity the compositor was given.
    pub fn opacity(&self) -> u8 {
        self.spec.opacity
    }

    /// Apply a new opacity in one transaction. The driver wants the whole
    /// descriptor again, so the stored spec is resent with only the
    /// opacity rewritten.
    pub fn set_opacity<C: Compositor>(
        &mut self,
        comp: &mut C,
        value: u8,
    ) -> Result<(), CompositorError> {
        let mut spec = self.spec;
        spec.opacity = value;

        let update = comp.begin_update()?;
        if let Err(e) = comp.change_element_opacity(update, self.element, &spec) {
            // Close the bracket before bailing out.
            if let Err(sub) = comp.submit_sync(update) {
                log::warn!("submit after failed opacity change: {sub}");
            }
            return Err(e);
        }
        comp.submit_sync(update)?;

        self.spec = spec;
        Ok(())
    }

    /// Remove the element and delete the resource, best effort: a failing
    /// step is logged and later steps still run; the first error wins.
    pub fn teardown<C: Compositor>(self, comp: &mut C) -> Result<(), CompositorError> {
        let mut result = Ok(());

        match comp.begin_update() {
            Ok(update) => {
                if let Err(e) = comp.remove_element(update, self.element) {
                    log::warn!("overlay element remove failed: {e}");
                    result = Err(e);
                }
                if let Err(e) = comp.submit_sync(update) {
                    log::warn!("overlay teardown submit failed: {e}");
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
            Err(e) => {
                log::warn!("overlay teardown could not start an update: {e}");
                result = Err(e);
            }
        }

        if let Err(e) = comp.delete_resource(self.resource) {
            log::warn!("overlay resource delete failed: {e}");
            if result.is_ok() {
                result = Err(e);
            }
        }

        result
    }
}
