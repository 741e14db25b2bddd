//! hand_sculpt — interactive entry point.

use hand_sculpt::app::{run, AppConfig};
use std::io::{self, Write};

fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Hand Sculpt — Gesture-Controlled Voxel Builder        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Mouse/keyboard simulation  (use --features leap for hardware)");
    println!();

    let cfg = if std::env::args().any(|a| a == "--quick") {
        println!("  Quick-start: defaults\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };

    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    let defaults = AppConfig::default();

    let cell_size: f32 = {
        let s = read_line(&format!("  Cell size (default {}): ", defaults.cell_size))
            .trim().parse().unwrap_or(defaults.cell_size);
        s.clamp(0.1, 2.0)
    };
    let max_cells: usize = {
        let n = read_line(&format!("  Max cells (default {}): ", defaults.max_cells))
            .trim().parse().unwrap_or(defaults.max_cells);
        n.clamp(16, 100_000)
    };
    println!("  Palette: 1=Aurora  2=Magma  3=Moss  4=Chrome");
    let palette = match read_line("  Choice (default 1): ").trim() {
        "2" => 1,
        "3" => 2,
        "4" => 3,
        _   => 0,
    };

    AppConfig { cell_size, max_cells, palette, ..defaults }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
