use ipv6_overlap_engine::config::{EngineConfig, OutputFormat};
use ipv6_overlap_engine::output::{render_csv, render_terminal};
use ipv6_overlap_engine::{read_prefix_lines, Engine};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::io::Read;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging()?;
    log::info!("#Start main()");

    let config = EngineConfig::from_env();
    let mut entries: Vec<String> = std::env::args().skip(1).collect();
    if entries.is_empty() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        entries = read_prefix_lines(&input);
    }

    let engine = Engine::new(config.clone());
    let report = engine.analyze_batch(entries.as_slice());

    match config.output {
        OutputFormat::Csv => print!("{}", render_csv(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Terminal => print!("{}", render_terminal(&report)),
    }

    log::info!("# End main() cache {:?}", engine.cache_stats());
    engine.clear_cache();
    Ok(())
}

/// Use log4rs.yml when present, otherwise warn-level logging to stderr.
fn init_logging() -> Result<(), Box<dyn Error>> {
    if std::path::Path::new("log4rs.yml").exists() {
        log4rs::init_file("log4rs.yml", Default::default())
            .map_err(|e| format!("Error initializing log4rs: {e}"))?;
        return Ok(());
    }
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
    log4rs::init_config(config)?;
    Ok(())
}
