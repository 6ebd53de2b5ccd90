use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use course_extractor::{
    collect_courses, load_json, parse_url_list, render_course_card, save_json, setup_logging,
    AppConfig, CourseCollection, CourseExtractor, CourseFilter, ExtractionEvent, LogConfig,
    SortKey, StatusMessage, DEFAULT_OUTPUT_FILE, SAMPLE_URLS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "course-extractor", version, about = "Extract course details from university websites")]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write logs to logs/course-extractor.log
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract course details from course page URLs
    Extract(ExtractArgs),
    /// Show courses from a saved JSON file
    Show(ShowArgs),
    /// Print the sample course URLs
    Sample,
}

#[derive(Args)]
struct ExtractArgs {
    /// Course page URLs; read from --file or stdin when omitted
    urls: Vec<String>,

    /// File with one URL per line
    #[arg(short, long, conflicts_with = "sample")]
    file: Option<PathBuf>,

    /// Use the built-in sample URLs
    #[arg(long)]
    sample: bool,

    /// Where to save the extracted courses
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Seconds allowed for each extraction (overrides EXTRACT_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Seconds to wait between URLs (overrides EXTRACT_DELAY_SECS)
    #[arg(long)]
    delay: Option<u64>,

    /// Do not write the JSON file
    #[arg(long)]
    no_save: bool,

    /// Print the JSON array to stdout instead of course cards
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ShowArgs {
    /// JSON file written by `extract`
    #[arg(default_value = DEFAULT_OUTPUT_FILE)]
    file: PathBuf,

    /// Only courses from this university
    #[arg(long)]
    university: Option<String>,

    /// Only courses of this degree type
    #[arg(long)]
    degree_type: Option<String>,

    /// course-name, university or degree-type
    #[arg(long, default_value = "course-name")]
    sort_by: SortKey,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    setup_logging(LogConfig {
        log_level: cli.log_level.clone(),
        file_output: cli.log_file,
        ..Default::default()
    })?;

    match cli.command {
        Command::Extract(args) => run_extract(args).await,
        Command::Show(args) => run_show(args),
        Command::Sample => {
            for url in SAMPLE_URLS {
                println!("{url}");
            }
            Ok(())
        }
    }
}

fn read_input(args: &ExtractArgs) -> Result<String, Box<dyn Error>> {
    if args.sample {
        return Ok(SAMPLE_URLS.join("\n"));
    }
    if let Some(path) = &args.file {
        return Ok(std::fs::read_to_string(path)?);
    }
    if !args.urls.is_empty() {
        return Ok(args.urls.join("\n"));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!(
            "{}",
            "Enter course URLs, one per line (Ctrl-D to finish):".bold()
        );
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text)?;
    Ok(text)
}

async fn run_extract(args: ExtractArgs) -> Result<(), Box<dyn Error>> {
    let input = read_input(&args)?;
    let batch = parse_url_list(&input);

    if batch.is_empty() {
        return Err("Please enter URLs first".into());
    }

    if !batch.invalid.is_empty() {
        eprintln!(
            "{}",
            format!("⚠️  Found {} invalid URLs:", batch.invalid.len()).yellow()
        );
        for invalid in &batch.invalid {
            eprintln!("  ❌ {} ({})", invalid.input, invalid.reason);
        }
    }

    if batch.valid.is_empty() {
        return Err("No valid URLs found".into());
    }
    eprintln!(
        "{}",
        format!("✅ Found {} valid URLs", batch.valid.len()).green()
    );

    let config = AppConfig::from_env().map_err(|e| {
        e.log();
        e
    })?;
    let mut pipeline_config = config.pipeline_config();
    if let Some(secs) = args.timeout {
        pipeline_config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.delay {
        pipeline_config.throttle = Duration::from_secs(secs);
    }

    let service = Arc::new(config.firecrawl_service()?);
    let extractor = CourseExtractor::with_config(service, pipeline_config);

    let pb = ProgressBar::new(batch.valid.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut shown = 0;
    let summary = collect_courses(
        extractor.extract_courses(batch.valid_strings()),
        |event, courses| match event {
            ExtractionEvent::Status(status) => {
                if status.is_outcome() {
                    pb.inc(1);
                }
                pb.println(status_line(status));
                pb.set_message(format!("{} course(s) so far", courses.len()));
            }
            // the collection only grows for courses not seen before
            ExtractionEvent::Course(course) if courses.len() > shown => {
                shown = courses.len();
                if !args.json {
                    pb.println(format!("{}\n", render_course_card(course, shown - 1)));
                }
            }
            ExtractionEvent::Course(course) => {
                pb.println(
                    format!("  ↩️  Skipping duplicate: {}", course.display_name())
                        .dimmed()
                        .to_string(),
                );
            }
        },
    )
    .await;
    pb.finish_and_clear();

    let courses = summary.courses;
    eprintln!(
        "{}",
        format!(
            "🎉 Extraction completed! Found {} unique courses ({} of {} URLs failed, {} duplicates skipped).",
            courses.len(),
            summary.failed,
            summary.attempted,
            summary.duplicates
        )
        .bold()
    );

    if args.json {
        println!("{}", course_extractor::to_json_pretty(courses.records())?);
    } else if !courses.is_empty() {
        print_stats(&courses);
    }

    if !args.no_save && !courses.is_empty() {
        save_json(&args.output, courses.records())?;
        eprintln!(
            "{}",
            format!("💾 Saved to {}", args.output.display()).green()
        );
    }

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<(), Box<dyn Error>> {
    let courses: CourseCollection = load_json(&args.file)?.into_iter().collect();
    if courses.is_empty() {
        println!("No courses in {}", args.file.display());
        return Ok(());
    }

    let filter = CourseFilter {
        university: args.university,
        degree_type: args.degree_type,
    };
    print_courses(&courses, &filter, args.sort_by);
    Ok(())
}

fn print_courses(courses: &CourseCollection, filter: &CourseFilter, sort: SortKey) {
    print_stats(courses);

    let shown = courses.view(filter, sort);
    println!("Showing {} of {} courses\n", shown.len(), courses.len());

    for (i, course) in shown.into_iter().enumerate() {
        println!("{}\n", render_course_card(course, i));
    }
}

fn print_stats(courses: &CourseCollection) {
    let stats = courses.stats();
    println!(
        "{}  {}  {}",
        format!("{} Courses Extracted", stats.courses).bold().blue(),
        format!("{} Universities", stats.universities).bold().blue(),
        format!("{} Degree Types", stats.degree_types).bold().blue(),
    );
}

fn status_line(status: &StatusMessage) -> String {
    let line = status.to_string();
    match status {
        StatusMessage::Started { .. } => line.cyan().to_string(),
        StatusMessage::Completed { .. } => line.green().to_string(),
        StatusMessage::NoData { .. } | StatusMessage::TimedOut { .. } => line.yellow().to_string(),
        StatusMessage::Failed { .. } => line.red().to_string(),
    }
}
