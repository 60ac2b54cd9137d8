// Interactive session: steps the overlay's opacity from keystrokes and
// guarantees the display is torn down in reverse acquisition order on
// every exit path.

use std::io;

use crate::compositor::{Compositor, CompositorError, DisplayInfo};
use crate::config::types::Config;
use crate::input::{match_key, KeyCommand, KeySource};
use crate::overlay::OverlayScene;

/// Errors that can end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Compositor(#[from] CompositorError),
    #[error("key input error: {0}")]
    Input(#[from] io::Error),
}

/// The mutable opacity value and its stepping policy.
///
/// `wrap` reproduces the plain modulo-256 arithmetic some setups expect;
/// the default saturates at the 0 and 255 bounds.
#[derive(Debug, Clone, Copy)]
pub struct OpacityControl {
    value: u8,
    step: u8,
    wrap: bool,
}

impl OpacityControl {
    pub fn new(value: u8, step: u8, wrap: bool) -> Self {
        Self { value, step, wrap }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.opacity.initial,
            config.opacity.step,
            config.opacity.wrap,
        )
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Step down one notch and return the new value.
    pub fn step_down(&mut self) -> u8 {
        self.value = if self.wrap {
            self.value.wrapping_sub(self.step)
        } else {
            self.value.saturating_sub(self.step)
        };
        self.value
    }

    /// Step up one notch and return the new value.
    pub fn step_up(&mut self) -> u8 {
        self.value = if self.wrap {
            self.value.wrapping_add(self.step)
        } else {
            self.value.saturating_add(self.step)
        };
        self.value
    }
}

/// Read keys until `q` or end of input. Each accepted keystroke submits
/// exactly one opacity transaction; unbound keys do nothing.
fn control_loop<C: Compositor, K: KeySource>(
    comp: &mut C,
    scene: &mut OverlayScene,
    control: &mut OpacityControl,
    keys: &mut K,
) -> Result<(), SessionError> {
    while let Some(byte) = keys.next_key()? {
        let Some(command) = match_key(byte) else {
            continue;
        };
        let value = match command {
            KeyCommand::Quit => {
                log::debug!("quit requested");
                return Ok(());
            }
            KeyCommand::OpacityDown => control.step_down(),
            KeyCommand::OpacityUp => control.step_up(),
        };
        log::debug!("opacity -> {value}");
        scene.set_opacity(comp, value)?;
    }

    log::debug!("input stream ended");
    Ok(())
}

/// Run one full overlay session against an open-able compositor.
///
/// `keys` is constructed only once the overlay is visible (for the stdin
/// source that is the moment the terminal goes raw) and dropped before any
/// teardown transaction, so the terminal is back to normal before the
/// screen changes underneath it.
pub fn run_session<C, K, F>(comp: &mut C, config: &Config, keys: F) -> Result<(), SessionError>
where
    C: Compositor,
    K: KeySource,
    F: FnOnce() -> io::Result<K>,
{
    let info = comp.open_display(config.display.device)?;
    log::info!(
        "display {} is {}x{}",
        config.display.device,
        info.width,
        info.height
    );

    let result = run_overlay(comp, &info, config, keys);

    if let Err(e) = comp.close_display() {
        log::warn!("display close failed: {e}");
        return result.and(Err(e.into()));
    }
    result
}

fn run_overlay<C, K, F>(
    comp: &mut C,
    info: &DisplayInfo,
    config: &Config,
    keys: F,
) -> Result<(), SessionError>
where
    C: Compositor,
    K: KeySource,
    F: FnOnce() -> io::Result<K>,
{
    let mut scene = OverlayScene::create(comp, info, config)?;
    let mut control = OpacityControl::from_config(config);

    let loop_result = match keys() {
        Ok(mut source) => control_loop(comp, &mut scene, &mut control, &mut source),
        Err(e) => Err(SessionError::Input(e)),
    };

    let teardown = scene.teardown(comp).map_err(SessionError::from);
    loop_result.and(teardown)
}
