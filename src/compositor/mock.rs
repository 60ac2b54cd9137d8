// In-memory compositor for tests: records every driver call in order,
// enforces the begin/submit bracket, and can fail a named call on demand.

use std::cell::RefCell;
use std::rc::Rc;

use super::{
    Compositor, CompositorError, DisplayInfo, ElementId, ElementSpec, PixelRect, ResourceId,
    UpdateId,
};
use crate::surface::FrameBuffer;

/// One recorded driver call (or a marker pushed by a test).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    DisplayOpen(u32),
    DisplayClose,
    ResourceCreate { id: u32, width: u32, height: u32 },
    ResourceWrite { id: u32, pitch: usize, bytes: usize },
    ResourceDelete(u32),
    UpdateStart(u32),
    UpdateSubmit(u32),
    ElementAdd { update: u32, resource: u32, id: u32, layer: i32, opacity: u8 },
    ElementChange { update: u32, element: u32, layer: i32, opacity: u8, dest: PixelRect },
    ElementRemove { update: u32, element: u32 },
    Marker(&'static str),
}

/// Shared op log, so test helpers (key sources, drop probes) can interleave
/// markers with the recorded driver calls.
pub type OpLog = Rc<RefCell<Vec<MockOp>>>;

/// Append a marker to an op log.
pub fn push_marker(ops: &OpLog, name: &'static str) {
    ops.borrow_mut().push(MockOp::Marker(name));
}

pub struct MockCompositor {
    ops: OpLog,
    width: u32,
    height: u32,
    display_open: bool,
    open_update: Option<u32>,
    resources: Vec<u32>,
    elements: Vec<u32>,
    next_handle: u32,
    fail_call: Option<&'static str>,
}

impl MockCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            ops: Rc::new(RefCell::new(Vec::new())),
            width,
            height,
            display_open: false,
            open_update: None,
            resources: Vec::new(),
            elements: Vec::new(),
            next_handle: 1,
            fail_call: None,
        }
    }

    /// Shared handle to the op log.
    pub fn ops(&self) -> OpLog {
        Rc::clone(&self.ops)
    }

    /// Snapshot of the recorded calls.
    pub fn log(&self) -> Vec<MockOp> {
        self.ops.borrow().clone()
    }

    /// Make every subsequent call with this name return its error.
    pub fn fail_on(&mut self, call: &'static str) {
        self.fail_call = Some(call);
    }

    /// Number of submitted update transactions.
    pub fn submitted_updates(&self) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, MockOp::UpdateSubmit(_)))
            .count()
    }

    /// Opacity values sent through `change_element_opacity`, in order.
    pub fn opacity_changes(&self) -> Vec<u8> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                MockOp::ElementChange { opacity, .. } => Some(*opacity),
                _ => None,
            })
            .collect()
    }

    /// True once every acquired handle has been released again.
    pub fn fully_released(&self) -> bool {
        !self.display_open && self.resources.is_empty() && self.elements.is_empty()
    }

    fn injected(&self, call: &'static str) -> bool {
        self.fail_call == Some(call)
    }

    fn handle(&mut self) -> u32 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn record(&self, op: MockOp) {
        self.ops.borrow_mut().push(op);
    }
}

impl Compositor for MockCompositor {
    fn open_display(&mut self, device: u32) -> Result<DisplayInfo, CompositorError> {
        if self.injected("open_display") {
            return Err(CompositorError::DisplayOpen(device));
        }
        assert!(!self.display_open, "display opened twice");
        self.display_open = true;
        self.record(MockOp::DisplayOpen(device));
        Ok(DisplayInfo {
            width: self.width,
            height: self.height,
        })
    }

    fn close_display(&mut self) -> Result<(), CompositorError> {
        if self.injected("close_display") {
            return Err(CompositorError::DisplayClose);
        }
        assert!(self.display_open, "close without open");
        self.display_open = false;
        self.record(MockOp::DisplayClose);
        Ok(())
    }

    fn create_resource(&mut self, width: u32, height: u32) -> Result<ResourceId, CompositorError> {
        if self.injected("create_resource") {
            return Err(CompositorError::ResourceCreate { width, height });
        }
        let id = self.handle();
        self.resources.push(id);
        self.record(MockOp::ResourceCreate { id, width, height });
        Ok(ResourceId(id))
    }

    fn write_pixels(
        &mut self,
        resource: ResourceId,
        frame: &FrameBuffer,
    ) -> Result<(), CompositorError> {
        if self.injected("write_pixels") {
            return Err(CompositorError::ResourceWrite);
        }
        assert!(self.resources.contains(&resource.0), "write to unknown resource");
        self.record(MockOp::ResourceWrite {
            id: resource.0,
            pitch: frame.pitch(),
            bytes: frame.data().len(),
        });
        Ok(())
    }

    fn delete_resource(&mut self, resource: ResourceId) -> Result<(), CompositorError> {
        if self.injected("delete_resource") {
            return Err(CompositorError::ResourceDelete);
        }
        let at = self
            .resources
            .iter()
            .position(|&id| id == resource.0)
            .expect("delete of unknown resource");
        self.resources.remove(at);
        self.record(MockOp::ResourceDelete(resource.0));
        Ok(())
    }

    fn begin_update(&mut self) -> Result<UpdateId, CompositorError> {
        if self.injected("begin_update") {
            return Err(CompositorError::UpdateStart);
        }
        assert!(self.open_update.is_none(), "nested update transaction");
        let id = self.handle();
        self.open_update = Some(id);
        self.record(MockOp::UpdateStart(id));
        Ok(UpdateId(id))
    }

    fn submit_sync(&mut self, update: UpdateId) -> Result<(), CompositorError> {
        if self.injected("submit_sync") {
            self.open_update = None;
            return Err(CompositorError::UpdateSubmit);
        }
        assert_eq!(self.open_update, Some(update.0), "submit of a stale update");
        self.open_update = None;
        self.record(MockOp::UpdateSubmit(update.0));
        Ok(())
    }

    fn add_element(
        &mut self,
        update: UpdateId,
        resource: ResourceId,
        spec: &ElementSpec,
    ) -> Result<ElementId, CompositorError> {
        if self.injected("add_element") {
            return Err(CompositorError::ElementAdd);
        }
        assert_eq!(self.open_update, Some(update.0), "element add outside update");
        assert!(self.resources.contains(&resource.0), "element refers to unknown resource");
        let id = self.handle();
        self.elements.push(id);
        self.record(MockOp::ElementAdd {
            update: update.0,
            resource: resource.0,
            id,
            layer: spec.layer,
            opacity: spec.opacity,
        });
        Ok(ElementId(id))
    }

    fn change_element_opacity(
        &mut self,
        update: UpdateId,
        element: ElementId,
        spec: &ElementSpec,
    ) -> Result<(), CompositorError> {
        if self.injected("change_element_opacity") {
            return Err(CompositorError::ElementChange);
        }
        assert_eq!(self.open_update, Some(update.0), "opacity change outside update");
        assert!(self.elements.contains(&element.0), "change of unknown element");
        self.record(MockOp::ElementChange {
            update: update.0,
            element: element.0,
            layer: spec.layer,
            opacity: spec.opacity,
            dest: spec.dest,
        });
        Ok(())
    }

    fn remove_element(
        &mut self,
        update: UpdateId,
        element: ElementId,
    ) -> Result<(), CompositorError> {
        if self.injected("remove_element") {
            return Err(CompositorError::ElementRemove);
        }
        assert_eq!(self.open_update, Some(update.0), "element remove outside update");
        let at = self
            .elements
            .iter()
            .position(|&id| id == element.0)
            .expect("remove of unknown element");
        self.elements.remove(at);
        self.record(MockOp::ElementRemove {
            update: update.0,
            element: element.0,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_a_full_transaction() {
        let mut comp = MockCompositor::new(640, 480);
        let info = comp.open_display(0).unwrap();
        assert_eq!(info.width, 640);

        let res = comp.create_resource(640, 480).unwrap();
        let update = comp.begin_update().unwrap();
        let spec = ElementSpec {
            layer: 2000,
            dest: PixelRect::full(&info),
            src: PixelRect::full(&info),
            opacity: 255,
        };
        let element = comp.add_element(update, res, &spec).unwrap();
        comp.submit_sync(update).unwrap();

        let update = comp.begin_update().unwrap();
        comp.remove_element(update, element).unwrap();
        comp.submit_sync(update).unwrap();
        comp.delete_resource(res).unwrap();
        comp.close_display().unwrap();

        assert!(comp.fully_released());
        assert_eq!(comp.submitted_updates(), 2);
    }

    #[test]
    #[should_panic(expected = "outside update")]
    fn element_change_outside_update_panics() {
        let mut comp = MockCompositor::new(64, 64);
        let info = comp.open_display(0).unwrap();
        let res = comp.create_resource(64, 64).unwrap();
        let spec = ElementSpec {
            layer: 2000,
            dest: PixelRect::full(&info),
            src: PixelRect::full(&info),
            opacity: 255,
        };
        let update = comp.begin_update().unwrap();
        let element = comp.add_element(update, res, &spec).unwrap();
        comp.submit_sync(update).unwrap();

        // No begin_update — the bracket invariant must trip.
        let _ = comp.change_element_opacity(UpdateId(999), element, &spec);
    }

    #[test]
    fn injected_failure_surfaces_as_error() {
        let mut comp = MockCompositor::new(64, 64);
        comp.open_display(0).unwrap();
        comp.fail_on("create_resource");
        let err = comp.create_resource(64, 64).unwrap_err();
        assert!(matches!(err, CompositorError::ResourceCreate { .. }));
    }
}
