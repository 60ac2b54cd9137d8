// Application wiring: ties the loaded config to the concrete compositor
// backend and the stdin key source.

use crate::config::types::Config;

pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run one overlay session on the real display.
    #[cfg(feature = "dispmanx")]
    pub fn run(self) -> anyhow::Result<()> {
        use anyhow::Context as _;

        use crate::compositor::dispmanx::DispmanxCompositor;
        use crate::input::StdinKeys;
        use crate::session::run_session;

        let mut comp = DispmanxCompositor::new();
        run_session(&mut comp, &self.config, StdinKeys::new).context("overlay session failed")?;
        Ok(())
    }

    /// Without the `dispmanx` feature there is no display to drive.
    #[cfg(not(feature = "dispmanx"))]
    pub fn run(self) -> anyhow::Result<()> {
        let _ = self.config;
        anyhow::bail!(
            "this build has no compositor backend; rebuild with `--features dispmanx` on a Raspberry Pi"
        )
    }
}
