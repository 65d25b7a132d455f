use caption_prep::{BlankLinePolicy, CorpusOptions, Error, JsonFeatureFile, prepare_dataset_with};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "caption-prep", version = "0.1", about = "Prepare image captioning training pairs", long_about = None)]
struct PrepareArgs {
    #[arg(short = 'f', long, help = "JSON file mapping image ids to feature vectors")]
    pub features: PathBuf,
    #[arg(short = 'c', long, help = "Caption file: a header line, then `image_id,caption` lines")]
    pub captions: PathBuf,
    #[arg(short = 'o', long, default_value = "output", help = "Directory receiving the vocabulary and datasets")]
    pub output_dir: PathBuf,
    #[arg(long, help = "Ignore blank caption lines instead of failing")]
    pub skip_blank_lines: bool,
    #[arg(short = 'v', long, default_value = "0.0", help = "Share of rows held out for validation")]
    pub validation_ratio: f32,
    #[arg(short = 's', long, default_value = "42", help = "Seed for the train/validation shuffle")]
    pub seed: u64,
}

fn run(args: &PrepareArgs) -> caption_prep::Result<()> {
    let options = CorpusOptions {
        blank_lines: if args.skip_blank_lines {
            BlankLinePolicy::Skip
        } else {
            BlankLinePolicy::Reject
        },
    };

    let start = std::time::Instant::now();
    let prepared = prepare_dataset_with(&JsonFeatureFile::new(&args.features), &args.captions, options)?;
    log::info!("Dataset prepared in {} seconds", start.elapsed().as_secs_f32());

    std::fs::create_dir_all(&args.output_dir).map_err(|e| Error::io(&args.output_dir, e))?;
    prepared.vocabulary.save(args.output_dir.join("vocabulary.json"))?;

    if args.validation_ratio != 0.0 {
        let (train, validation) = prepared.dataset.split(args.validation_ratio, args.seed)?;
        train.save_json(args.output_dir.join("train.json"))?;
        validation.save_json(args.output_dir.join("validation.json"))?;
    } else {
        prepared.dataset.save_json(args.output_dir.join("train.json"))?;
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("caption_prep=info".parse().unwrap()),
        )
        .init();

    let args = PrepareArgs::parse();
    log::info!("Using {:?}", args);

    let program_start = std::time::Instant::now();
    if let Err(e) = run(&args) {
        eprintln!("Error preparing dataset: {}", e);
        std::process::exit(1);
    }

    log::info!(
        "Completed in {} seconds",
        program_start.elapsed().as_secs_f32()
    );
}
