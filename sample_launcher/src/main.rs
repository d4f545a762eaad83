//! Desktop launcher for the samples

mod samples;

use std::path::PathBuf;

use clap::Parser;
use sample_platform::foundation::logging;
use sample_platform::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "sample_launcher", about = "Runs a Vulkan sample in a desktop or headless window")]
struct Args {
    /// Sample to run
    #[arg(short, long)]
    sample: Option<String>,

    /// List the available samples and exit
    #[arg(long)]
    list: bool,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Window width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Window height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Advance the sample by 1 / FPS seconds every frame
    #[arg(long, value_name = "FPS")]
    fixed_fps: Option<f32>,

    /// Close after this many frames
    #[arg(long, value_name = "FRAMES")]
    stop_after: Option<u64>,

    /// Platform configuration file (.toml or .ron)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn print_samples(registry: &AppRegistry) {
    println!("Available samples:");
    for info in registry.iter() {
        println!("  {:<16} {}", info.id, info.description);
    }
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let registry = samples::registry();

    if args.list {
        print_samples(&registry);
        return ExitCode::Help.into();
    }

    let context = PlatformContext::desktop();
    let mut config = match &args.config {
        Some(path) => PlatformConfig::load_or_default_from(path),
        None => PlatformConfig::load_or_default(&context),
    };
    logging::init_with_level(&config.log_level);

    if args.headless {
        config.window.mode = WindowMode::Headless;
    }
    if let Some(width) = args.width {
        config.window.extent.width = width;
    }
    if let Some(height) = args.height {
        config.window.extent.height = height;
    }
    if let Some(fps) = args.fixed_fps {
        config.simulation.fixed_fps = Some(fps);
    }
    if let Some(id) = &args.sample {
        config.window.title = format!("Vulkan Samples: {id}");
    }

    let mut plugins: Vec<Box<dyn Plugin>> = vec![Box::new(FpsLogger::default())];
    if let Some(frames) = args.stop_after {
        plugins.push(Box::new(StopAfter::new(frames)));
    }

    let mut platform = Platform::with_config(DesktopBackend, context, config);
    let code = platform.initialize(plugins);
    if code != ExitCode::Success {
        platform.terminate(code);
        return code.into();
    }

    match args.sample.as_deref().map(|id| (id, registry.get(id))) {
        Some((_, Some(info))) => platform.request_application(Some(info.clone())),
        Some((id, None)) => {
            log::error!("Unknown sample '{id}'");
            print_samples(&registry);
        }
        None => log::error!("No sample selected, use --sample <id> (see --list)"),
    }

    let code = platform.main_loop();
    platform.terminate(code);
    code.into()
}
