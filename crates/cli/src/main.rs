use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use roadgen::network::Edge;
use roadgen::terrain::Raster;
use roadgen::{GenCfg, RoadGenerator, RoadNetwork};
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

#[derive(Parser)]
#[command(name = "roadgen")]
#[command(about = "Procedural road network generator")]
struct Cmd {
    /// Log per-round progress (debug level)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Generate a network and write its edge table (.csv or .parquet)
    Generate {
        #[arg(long)]
        out: String,
        /// JSON generator config; missing fields take defaults
        #[arg(long)]
        config: Option<String>,
        /// Raw RGBA8 raster (red = population, green = elevation)
        #[arg(long, requires_all = ["raster_width", "raster_height"])]
        raster: Option<String>,
        #[arg(long)]
        raster_width: Option<usize>,
        #[arg(long)]
        raster_height: Option<usize>,
        /// Synthetic terrain used when no raster is given
        #[arg(long, value_enum, default_value_t = TerrainKind::Radial)]
        terrain: TerrainKind,
        #[arg(long)]
        seed: Option<u64>,
        /// Locked start position as X,Y
        #[arg(long)]
        start: Option<String>,
    },
    /// Print the default generator config as JSON
    Config,
    /// Print a provenance header, with per-kind totals of an edge table if given
    Report {
        #[arg(long)]
        from: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum TerrainKind {
    Flat,
    Radial,
    River,
}

/// Texels per side of synthetic terrains.
const SYNTH_TEXELS: usize = 256;

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Generate {
            out,
            config,
            raster,
            raster_width,
            raster_height,
            terrain,
            seed,
            start,
        } => {
            let mut cfg = load_cfg(config.as_deref())?;
            if let Some(seed) = seed {
                cfg.seed = seed;
            }
            if let Some(start) = start {
                cfg.start = Some(parse_start(&start)?);
            }
            let source = match (raster, raster_width, raster_height) {
                (Some(path), Some(w), Some(h)) => RasterSource::File { path, w, h },
                _ => RasterSource::Synthetic { terrain },
            };
            generate(cfg, source, &out)
        }
        Action::Config => {
            println!("{}", serde_json::to_string_pretty(&GenCfg::default())?);
            Ok(())
        }
        Action::Report { from } => report(from.as_deref()),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
enum RasterSource {
    File { path: String, w: usize, h: usize },
    Synthetic { terrain: TerrainKind },
}

fn load_cfg(path: Option<&str>) -> Result<GenCfg> {
    let Some(path) = path else {
        return Ok(GenCfg::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))
}

fn parse_start(s: &str) -> Result<[f64; 2]> {
    let Some((x, y)) = s.split_once(',') else {
        bail!("start must look like X,Y, got {s:?}");
    };
    let x: f64 = x.trim().parse().with_context(|| format!("start x in {s:?}"))?;
    let y: f64 = y.trim().parse().with_context(|| format!("start y in {s:?}"))?;
    Ok([x, y])
}

fn build_raster(cfg: &GenCfg, source: &RasterSource) -> Result<Raster> {
    let (w, h) = (cfg.city_width, cfg.city_height);
    let raster = match source {
        RasterSource::File { path, w: tw, h: th } => {
            let bytes = fs::read(path).with_context(|| format!("reading raster {path}"))?;
            Raster::from_rgba(bytes, *tw, *th, w, h)
                .with_context(|| format!("raster {path} ({tw} x {th})"))?
        }
        RasterSource::Synthetic { terrain } => synthetic(*terrain, w, h)?,
    };
    Ok(raster)
}

/// Population peaks at the center; `River` adds a water band east of it.
fn synthetic(kind: TerrainKind, w: f64, h: f64) -> Result<Raster> {
    let raster = Raster::from_fn(SYNTH_TEXELS, SYNTH_TEXELS, w, h, |p| {
        let radial = || {
            let d = ((p.x - 0.5 * w) / w).hypot((p.y - 0.5 * h) / h);
            (255.0 * (1.0 - 1.4 * d).max(0.0)) as u8
        };
        match kind {
            TerrainKind::Flat => (128, 200),
            TerrainKind::Radial => (radial(), 200),
            TerrainKind::River => {
                let wet = p.x >= 0.6 * w && p.x < 0.66 * w;
                (radial(), if wet { 0 } else { 200 })
            }
        }
    })?;
    Ok(raster)
}

/// Parameters recorded in the provenance sidecar.
#[derive(Serialize)]
struct RunParams<'a> {
    config: &'a GenCfg,
    terrain: &'a RasterSource,
}

fn generate(cfg: GenCfg, source: RasterSource, out: &str) -> Result<()> {
    tracing::info!(out, seed = cfg.seed, source = ?source, "generate");
    let raster = build_raster(&cfg, &source)?;
    let mut gen = RoadGenerator::new(cfg.clone(), raster)?;
    let net = gen.generate();
    tracing::info!(
        highways = net.highways.len(),
        streets = net.streets.len(),
        nodes = net.nodes.len(),
        "network ready"
    );

    let mut df = edge_frame(&net)?;
    write_frame(&mut df, Path::new(out))?;

    let params = RunParams {
        config: &cfg,
        terrain: &source,
    };
    let prov = provenance::record(Path::new(out), &params, &net.stats)?;
    tracing::info!(provenance = %prov.display(), "wrote sidecar");
    Ok(())
}

/// One row per edge: highways first, then streets, in acceptance order.
fn edge_frame(net: &RoadNetwork) -> Result<DataFrame> {
    let edges: Vec<&Edge> = net.edges().collect();
    let df = df!(
        "id" => edges.iter().map(|e| e.id.0 as u64).collect::<Vec<_>>(),
        "kind" => edges.iter().map(|e| e.kind.as_str()).collect::<Vec<_>>(),
        "x1" => edges.iter().map(|e| e.endpoint1.x).collect::<Vec<_>>(),
        "y1" => edges.iter().map(|e| e.endpoint1.y).collect::<Vec<_>>(),
        "x2" => edges.iter().map(|e| e.endpoint2.x).collect::<Vec<_>>(),
        "y2" => edges.iter().map(|e| e.endpoint2.y).collect::<Vec<_>>(),
        "length" => edges.iter().map(|e| e.length()).collect::<Vec<_>>(),
        "expandable" => edges.iter().map(|e| e.expandable).collect::<Vec<_>>()
    )?;
    Ok(df)
}

fn write_frame(df: &mut DataFrame, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let ext = out.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    match ext {
        "csv" => CsvWriter::new(file).include_header(true).finish(df)?,
        "parquet" => {
            ParquetWriter::new(file).finish(df)?;
        }
        other => bail!("unsupported output extension {other:?} (use .csv or .parquet)"),
    }
    Ok(())
}

/// Per-kind edge count and total length of a written edge table.
fn summarize(path: &str) -> Result<DataFrame> {
    let lf = if path.ends_with(".parquet") {
        LazyFrame::scan_parquet(path, Default::default())?
    } else {
        LazyCsvReader::new(path)
            .with_infer_schema_length(Some(100))
            .finish()?
    };
    let df = lf
        .group_by([col("kind")])
        .agg([len().alias("edges"), col("length").sum().alias("total_length")])
        .sort(["kind"], Default::default())
        .collect()?;
    Ok(df)
}

fn report(from: Option<&str>) -> Result<()> {
    let mut obj = serde_json::json!({
        "code_rev": provenance::code_rev(),
        "version": roadgen::VERSION,
        "params": {},
        "outputs": []
    });
    if let Some(path) = from {
        let df = summarize(path)?;
        let kinds = df.column("kind")?.str()?;
        let counts = df.column("edges")?.cast(&DataType::UInt64)?;
        let counts = counts.u64()?;
        let lengths = df.column("total_length")?.f64()?;
        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            rows.push(serde_json::json!({
                "kind": kinds.get(i),
                "edges": counts.get(i),
                "total_length": lengths.get(i),
            }));
        }
        obj["outputs"] = serde_json::json!([path]);
        obj["summary"] = serde_json::Value::Array(rows);
    }
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadgen::terrain::{FlatTerrain, Terrain};
    use roadgen::Point;
    use tempfile::tempdir;

    fn small_net() -> RoadNetwork {
        let cfg = GenCfg {
            start: Some([50.0, 256.0]),
            ..GenCfg::default()
        };
        let mut gen = RoadGenerator::new(cfg, FlatTerrain::new(200.0, 128.0)).unwrap();
        gen.generate()
    }

    #[test]
    fn start_parsing() {
        assert_eq!(parse_start("10,20.5").unwrap(), [10.0, 20.5]);
        assert_eq!(parse_start(" 1 , 2 ").unwrap(), [1.0, 2.0]);
        assert!(parse_start("10").is_err());
        assert!(parse_start("a,b").is_err());
    }

    #[test]
    fn edge_frame_has_one_row_per_edge() {
        let net = small_net();
        let df = edge_frame(&net).unwrap();
        assert_eq!(df.height(), net.highways.len() + net.streets.len());
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            names,
            ["id", "kind", "x1", "y1", "x2", "y2", "length", "expandable"]
        );
    }

    #[test]
    fn csv_round_trip_through_summary() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("edges.csv");
        let net = small_net();
        let mut df = edge_frame(&net).unwrap();
        write_frame(&mut df, &out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("id,kind,x1,y1,x2,y2,length,expandable"));

        let summary = summarize(out.to_str().unwrap()).unwrap();
        let kinds = summary.column("kind").unwrap().str().unwrap();
        assert_eq!(kinds.get(0), Some("highway"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let mut df = edge_frame(&small_net()).unwrap();
        assert!(write_frame(&mut df, &dir.path().join("edges.txt")).is_err());
    }

    #[test]
    fn synthetic_terrains_match_city() {
        for kind in [TerrainKind::Flat, TerrainKind::Radial, TerrainKind::River] {
            let r = synthetic(kind, 512.0, 512.0).unwrap();
            assert_eq!(r.extent(), Some((512.0, 512.0)));
        }
        let river = synthetic(TerrainKind::River, 512.0, 512.0).unwrap();
        assert_eq!(river.elevation(Point::new(320.0, 10.0)), 0.0);
        assert_eq!(river.elevation(Point::new(100.0, 10.0)), 200.0);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(&path, r#"{"seed": 9, "grid": {"randomize": false}}"#).unwrap();
        let cfg = load_cfg(path.to_str()).unwrap();
        assert_eq!(cfg.seed, 9);
        assert!(!cfg.grid.randomize);
        assert_eq!(cfg.city_width, 512.0);
        assert!(load_cfg(Some("/nonexistent/cfg.json")).is_err());
    }
}
