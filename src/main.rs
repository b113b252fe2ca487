mod audio;
mod dsp;
mod ui;
mod util;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ui::settings::SettingsHandle;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ribbonmeter=info")),
        )
        .init();

    let settings = SettingsHandle::load_or_default();
    info!("[settings] using {:?}", settings.borrow().path());

    let signal = {
        let manager = settings.borrow();
        let data = manager.settings();
        audio::signal::spawn(
            data.signal.transform_config(),
            data.ribbon.bands,
            data.signal.frame_interval(),
        )?
    };

    ui::run(ui::UiConfig::new(
        settings.clone(),
        signal.receiver(),
        signal.frame_len(),
    ))
    .context("ui event loop failed")?;

    match settings.persist() {
        Ok(true) => info!("[settings] saved"),
        Ok(false) => {}
        Err(err) => warn!("[settings] failed to save: {err:#}"),
    }
    Ok(())
}
