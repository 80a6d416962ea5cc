use std::path::PathBuf;
use anyhow::{ bail, Context, Result };
use clap::{ Parser, Subcommand };
use slm_phase::{
    mkdir,
    write_npz,
    compose::quantize,
    config::SessionConfig,
    grid::Grid,
    quadrature::{ gram_matrix, identity_deviation, DiskQuadrature },
    zernike::{ Zernike, ZernikeCache, ZernikeMode },
};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "slm-pattern")]
#[command(about = "Compose SLM phase patterns from vortices and Zernike corrections")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Render a session file to <out>/pattern.npz
    Render {
        /// TOML session file
        config: PathBuf,
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
    /// Evaluate a single Zernike mode to <out>/zernike.npz
    Zernike {
        #[arg(long, allow_hyphen_values = true, requires = "n")]
        m: Option<i32>,
        #[arg(long, requires = "m")]
        n: Option<i32>,
        /// Noll index, instead of --m/--n
        #[arg(long, conflicts_with_all = ["m", "n"])]
        noll: Option<u64>,
        /// Samples along each axis
        #[arg(long, default_value_t = 512)]
        size: usize,
        /// Zero the mode outside the unit disk
        #[arg(long)]
        clip: bool,
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
    /// Check orthonormality of all modes up to a radial order
    Orthogonality {
        #[arg(long, default_value_t = 10)]
        n_max: u32,
    },
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Render { config, out } => render(config, out),
        Action::Zernike { m, n, noll, size, clip, out }
            => zernike(m, n, noll, size, clip, out),
        Action::Orthogonality { n_max } => orthogonality(n_max),
    }
}

fn render(config: PathBuf, out: PathBuf) -> Result<()> {
    let session = SessionConfig::from_file(&config)
        .with_context(|| format!("reading session {}", config.display()))?;
    let grid = session.grid()?;
    let composer = session.composer()?;
    tracing::info!(
        rows = grid.dim().0,
        cols = grid.dim().1,
        patterns = composer.patterns.len(),
        zernike_terms = composer.weights.len(),
        "render"
    );
    let mut cache = ZernikeCache::new(grid.clone());
    let phase = composer.phase(&mut cache)?;
    let levels = quantize(&phase, session.output.levels)?;
    let outdir = mkdir!(out)?;
    let path = outdir.join("pattern.npz");
    write_npz!(
        &path,
        arrays: {
            "phase" => &phase,
            "levels" => &levels,
            "x" => grid.x(),
            "y" => grid.y(),
        }
    )?;
    tracing::info!(path = %path.display(), "wrote pattern");
    Ok(())
}

fn zernike(
    m: Option<i32>,
    n: Option<i32>,
    noll: Option<u64>,
    size: usize,
    clip: bool,
    out: PathBuf,
) -> Result<()>
{
    let mode
        = match (m, n, noll) {
            (Some(m), Some(n), None) => ZernikeMode::new(m, n)?,
            (None, None, Some(j)) => ZernikeMode::from_noll(j)?,
            _ => bail!("give either --m and --n, or --noll"),
        };
    let grid = Grid::square(size, size)?;
    let z = Zernike::new(mode)?;
    let field = if clip { z.build_clipped(&grid) } else { z.build(&grid) };
    tracing::info!(
        %mode,
        name = mode.name().unwrap_or("-"),
        noll = ?mode.to_noll(),
        degenerate = mode.is_degenerate(),
        "zernike"
    );
    let outdir = mkdir!(out)?;
    write_npz!(
        outdir.join("zernike.npz"),
        arrays: {
            "z" => &field,
            "x" => grid.x(),
            "y" => grid.y(),
        }
    )?;
    Ok(())
}

fn orthogonality(n_max: u32) -> Result<()> {
    let modes = ZernikeMode::all_up_to(n_max);
    let gram = gram_matrix(&modes, &DiskQuadrature::for_order(n_max))?;
    let deviation = identity_deviation(&gram);
    tracing::info!(n_max, modes = modes.len(), deviation, "orthogonality");
    if deviation > 1e-8 {
        tracing::warn!(deviation, "Gram matrix deviates from identity");
    }
    Ok(())
}
