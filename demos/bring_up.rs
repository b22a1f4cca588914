use hikari::gpu::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let window = WinitWindow::new(&WindowInfo::default())?;
    tracing::info!("opened window of size {:?}", window.window().inner_size());
    let driver = unsafe { AshDriver::load() }?;
    let mut app = Application::new(window, driver, &ContextInfo::from_env())?;

    tracing::info!("running on {}", app.context().device());
    app.run();
    app.into_window();
    Ok(())
}
