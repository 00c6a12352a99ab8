use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

const LOG_ENV: &str = "TRACESCOPE_LOG";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Our own crates log at the level named by `TRACESCOPE_LOG`, everything
/// else (wgpu, winit, ...) only from `Warn` up.
pub fn setup(is_debug: bool) -> Result<(), fern::InitError> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(if is_debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    let stdout = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {:<5} {}: {}",
                chrono::Local::now().format(TIME_FORMAT),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new()
        .level(LevelFilter::Warn)
        .level_for("tracescope", level)
        .level_for("tracescope_data", level)
        .level_for("tracescope_source", level)
        .chain(stdout);

    if let Some(path) = data::log_path() {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let file = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} {:<5} {}: {}",
                    chrono::Local::now().format(TIME_FORMAT),
                    record.level(),
                    record.target(),
                    message
                ));
            })
            .chain(fern::log_file(path)?);

        dispatch = dispatch.chain(file);
    }

    dispatch.apply()?;
    Ok(())
}
