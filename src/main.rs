use customize_toolbar::layout::{self, FileStorage, LayoutError, LayoutFormat, LayoutRecord};
use customize_toolbar::logging;
use customize_toolbar::settings::{Settings, SETTINGS_FILE};

fn print_record(record: &LayoutRecord) {
    println!("custom buttons: {}", on_off(record.custom_buttons_enabled));
    println!("wrap toolbar:   {}", on_off(record.wrap_enabled));
    println!("on toolbar ({}):", record.on_toolbar.len());
    for identity in &record.on_toolbar {
        println!("  {identity}");
    }
    println!("available ({}):", record.available.len());
    for identity in &record.available {
        println!("  {identity}");
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn main() -> anyhow::Result<()> {
    let mut settings_path = SETTINGS_FILE.to_string();
    let mut format = LayoutFormat::Current;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--legacy" => format = LayoutFormat::Legacy,
            _ => settings_path = arg,
        }
    }

    let settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());

    let storage = FileStorage::new(settings.layout_path());
    tracing::debug!(path = %storage.path().display(), ?format, "reading toolbar layout");

    match layout::store::load(&storage, format) {
        Ok(record) => print_record(&record),
        Err(LayoutError::NotFound) => {
            println!("no saved layout at {}", storage.path().display());
        }
        Err(err) if err.is_corruption() => {
            println!("layout at {} is corrupt: {err}", storage.path().display());
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
