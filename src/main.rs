#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use epoch123::app;

fn parse_startup_config() -> app::StartupConfig {
    let mut cfg = app::StartupConfig::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--open-folder" => {
                if let Some(p) = args.next() {
                    cfg.open_folder = Some(std::path::PathBuf::from(p));
                }
            }
            "--open-file" => {
                if let Some(p) = args.next() {
                    cfg.open_file = Some(std::path::PathBuf::from(p));
                }
            }
            "--volume" => {
                if let Some(v) = args.next() {
                    if let Ok(n) = v.parse::<u8>() {
                        cfg.volume = Some(n.min(100));
                    }
                }
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage:\n  epoch123 [options] [path]\n\nOptions:\n  --open-folder <dir>\n  --open-file <audio>\n  --volume <0-100>\n  --help"
                );
                std::process::exit(0);
            }
            _ => {
                if arg.starts_with('-') {
                    continue;
                }
                let path = std::path::PathBuf::from(&arg);
                if path.is_dir() {
                    cfg.open_folder = Some(path);
                } else {
                    cfg.open_file = Some(path);
                }
            }
        }
    }
    cfg
}

fn init_logging() {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}

fn main() -> eframe::Result<()> {
    init_logging();
    let startup = parse_startup_config();
    let viewport = egui::ViewportBuilder::default()
        .with_min_inner_size([900.0, 560.0])
        .with_inner_size([1200.0, 700.0]);
    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Epoch123 Sound Manager",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(
                app::SoundManager::new(cc, startup.clone()).expect("failed to init app"),
            ))
        }),
    )
}
