use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dem_footprint::{create_outline, create_overlap, Emission, FootprintConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: OutputOptions,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 各DEMの有効範囲の外形をKMLで出力
    Outline {
        /// 入力DEM（GeoTIFFなど）
        #[arg(value_name = "DEM", required = true)]
        files: Vec<PathBuf>,
    },

    /// 2つ以上のDEMの重なり範囲を overlap.kml として出力
    Overlap {
        /// 入力DEM（2つ以上）
        #[arg(value_name = "DEM", num_args = 2.., required = true)]
        files: Vec<PathBuf>,
    },

    /// 重なり範囲と各DEMの外形をまとめて出力
    Report {
        /// 入力DEM（2つ以上）
        #[arg(value_name = "DEM", num_args = 2.., required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct OutputOptions {
    /// 出力ディレクトリ
    #[arg(short, long, value_name = "DIR", default_value = ".", global = true)]
    output: PathBuf,

    /// 外形線を太くする膨張処理の回数
    #[arg(long, default_value_t = 2, global = true)]
    dilations: u32,

    /// ファイルに保存せず標準出力にKMLを出力
    #[arg(long, global = true)]
    stdout: bool,
}

fn main() -> Result<()> {
    // ログの初期化
    tracing_subscriber::fmt::init();

    // CLI引数の解析
    let cli = Cli::parse();

    // 処理開始時間を記録
    let start_time = std::time::Instant::now();

    let config = FootprintConfig::default().with_dilation_iterations(cli.options.dilations);

    let save_dir = if cli.options.stdout {
        None
    } else {
        // 出力ディレクトリの作成
        fs::create_dir_all(&cli.options.output)?;
        Some(cli.options.output.as_path())
    };

    let result = match &cli.command {
        Command::Outline { files } => process_outlines(files, save_dir, &config),
        Command::Overlap { files } => process_overlap(files, save_dir, &config),
        Command::Report { files } => {
            process_overlap(files, save_dir, &config).and_then(|_| process_outlines(files, save_dir, &config))
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }

    // 処理時間を表示
    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    result
}

fn process_outlines(files: &[PathBuf], save_dir: Option<&Path>, config: &FootprintConfig) -> Result<()> {
    for path in files {
        info!("Processing file: {:?}", path);
        let emission = create_outline(path, save_dir, config)?;
        report(emission)?;
    }
    Ok(())
}

fn process_overlap(files: &[PathBuf], save_dir: Option<&Path>, config: &FootprintConfig) -> Result<()> {
    info!("Computing overlap of {} files", files.len());

    match create_overlap(files, save_dir, config)? {
        Some(emission) => report(emission)?,
        None => info!("No overlapping area found."),
    }
    Ok(())
}

fn report(emission: Emission) -> Result<()> {
    match emission {
        Emission::Saved(path) => info!("Written KML: {:?}", path),
        Emission::InMemory(doc) => println!("{}", doc.to_kml_string()?),
    }
    Ok(())
}
