use clap::Parser;
use hexmapgen::{GenerationParams, TileTag, generate_world};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Генератор гексагональных островов с реками
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (без него — параметры по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Переопределяет сид из конфигурации
    #[arg(short, long)]
    seed: Option<u64>,

    /// Переопределяет радиус сетки
    #[arg(short, long)]
    radius: Option<i32>,

    /// Путь для сохранения карты в JSON (по умолчанию: ./world.json)
    #[arg(short, long, default_value = "world.json")]
    output: PathBuf,

    /// Форматированный JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let mut params = match &cli.config {
        Some(path) => GenerationParams::from_toml_file(path)?,
        None => GenerationParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if let Some(radius) = cli.radius {
        params.radius = radius;
    }

    println!(
        "Генерация карты (радиус: {}, сид: {})...",
        params.radius, params.seed
    );
    let world = generate_world(&params)?;

    println!("Сохранение в {:?}", cli.output);
    let writer = BufWriter::new(File::create(&cli.output)?);
    if cli.pretty {
        serde_json::to_writer_pretty(writer, &world.export())?;
    } else {
        serde_json::to_writer(writer, &world.export())?;
    }

    println!(
        "\nГотово! Тайлов: {}, истоков: {}, рек: {}, слияний: {}.",
        world.map.len(),
        world.count_tagged(TileTag::RiverSource),
        world.rivers.paths.len(),
        world.rivers.confluences()
    );
    Ok(())
}
