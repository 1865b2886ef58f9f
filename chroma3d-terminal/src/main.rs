/// Chroma3D Terminal Preview
///
/// Loads a .glb/.gltf/.stl/.obj file and shows it in the terminal.
/// Controls:
///   - Mouse drag / Arrow Keys: Orbit
///   - Tab / 1-9: Switch color preset
///   - G: Toggle the grid and axis gizmo
///   - R: Reload the file
///   - Q/ESC: Quit
use chroma3d_core::material::PRESETS;
use chroma3d_core::{Guides, InMemoryReferences, PreviewSession, ViewerConfig};
use chroma3d_terminal::{read_asset, snapshot, TerminalApp};
use clap::Parser;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chroma3d-preview", version, about = "Preview 3D print models in the terminal")]
struct Args {
    /// Model file (.glb, .gltf, .stl or .obj)
    file: Option<PathBuf>,

    /// Color preset key, e.g. bronze or chroma-orange
    #[arg(short, long)]
    preset: Option<String>,

    /// JSON viewer configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the turntable showcase setup instead of the upload preview
    #[arg(long, conflicts_with = "config")]
    showcase: bool,

    /// Hide the ground grid and axis gizmo
    #[arg(long)]
    no_guides: bool,

    /// Print the preset catalog and exit
    #[arg(long)]
    list_presets: bool,

    /// Print a single frame instead of starting the interactive view
    #[arg(long, requires = "file")]
    snapshot: bool,

    /// Snapshot width in columns
    #[arg(long, default_value_t = 60)]
    width: usize,

    /// Snapshot height in rows
    #[arg(long, default_value_t = 30)]
    height: usize,
}

fn invalid(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_presets {
        for preset in PRESETS {
            println!(
                "{:<14} {:<14} {}  metalness {:.2}  roughness {:.2}",
                preset.key,
                preset.name,
                preset.color.to_hex(),
                preset.metalness,
                preset.roughness
            );
        }
        return Ok(());
    }

    let mut config = match (&args.config, args.showcase) {
        (Some(path), _) => ViewerConfig::load(path).map_err(invalid)?,
        (None, true) => ViewerConfig::showcase(),
        (None, false) => ViewerConfig::default(),
    };
    if args.no_guides {
        config.guides = Guides::hidden();
    }
    let mut session = PreviewSession::new(config, InMemoryReferences::new()).map_err(invalid)?;
    if let Some(key) = &args.preset {
        session.set_preset(key).map_err(invalid)?;
    }

    if args.snapshot {
        if let Some(path) = &args.file {
            session
                .select_and_load(read_asset(path)?)
                .map_err(invalid)?;
        }
        print!("{}", snapshot(&mut session, args.width, args.height));
        println!("{}", session.status_line());
        return Ok(());
    }

    let mut app = TerminalApp::new(session)?;
    if let Some(path) = &args.file {
        app.open(path)?;
    }
    app.run()?;

    println!("Thank you for using Chroma3D!");
    Ok(())
}
