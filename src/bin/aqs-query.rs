use anyhow::{Context, Result};
use aqs::config::Config;
use aqs::druid::{DruidBackend, HttpDruidClient};
use aqs::error::AqsError;
use aqs::history::{MetricsQueryBuilder, RevisionMetric, TimeseriesRequest};
use aqs::validation::{validate_range, RangeParams, ValidationOptions};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "aqs-query")]
#[command(about = "Validate date ranges and inspect analytics queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a start/end pair and print the normalized range
    Range(RangeArgs),
    /// Print the Druid query for a revisions timeseries
    Revisions(RevisionsArgs),
}

#[derive(Args)]
struct RangeArgs {
    start: String,
    end: String,
    #[arg(long)]
    project: Option<String>,
    /// Accept YYYYMMDD input
    #[arg(long)]
    fake_hour: bool,
    #[arg(long)]
    zero_hour: bool,
    #[arg(long)]
    strip_hour: bool,
    #[arg(long)]
    full_months: bool,
    #[arg(long)]
    full_months_druid: bool,
    #[arg(long)]
    iso_date: bool,
    #[arg(long)]
    iso_date_time: bool,
    #[arg(long)]
    max_span_seconds: Option<i64>,
    #[arg(long)]
    no_all_projects: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Metric {
    Edits,
    NetBytesDiff,
    AbsBytesDiff,
}

impl From<Metric> for RevisionMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Edits => RevisionMetric::Edits,
            Metric::NetBytesDiff => RevisionMetric::NetBytesDiff,
            Metric::AbsBytesDiff => RevisionMetric::AbsBytesDiff,
        }
    }
}

#[derive(Args)]
struct RevisionsArgs {
    project: String,
    editor_type: String,
    page_type: String,
    granularity: String,
    start: String,
    end: String,
    #[arg(long, value_enum, default_value = "edits")]
    metric: Metric,
    /// Send the query to the configured Druid and print its answer instead
    #[arg(long)]
    send: bool,
}

fn print_errors(err: &AqsError) {
    if err.messages().is_empty() {
        eprintln!("✗ {}", err);
    } else {
        for message in err.messages() {
            eprintln!("✗ {}", message);
        }
    }
}

fn run_range(args: RangeArgs) -> Result<()> {
    let opts = ValidationOptions {
        fake_hour: args.fake_hour,
        zero_hour: args.zero_hour,
        strip_hour: args.strip_hour,
        full_months: args.full_months,
        full_months_druid: args.full_months_druid,
        iso_date_format: args.iso_date,
        iso_date_time_format: args.iso_date_time,
        max_span_seconds: args.max_span_seconds,
        no_all_projects: args.no_all_projects,
        druid_range: false,
    };
    let mut params = RangeParams::new(args.start, args.end);
    params.project = args.project;

    match validate_range(&params, &opts) {
        Ok(range) => {
            println!("start:   {}", range.start);
            println!("end:     {}", range.end);
            if let Some(project) = range.project {
                println!("project: {}", project);
            }
            Ok(())
        }
        Err(err) => {
            print_errors(&err);
            std::process::exit(1);
        }
    }
}

async fn run_revisions(args: RevisionsArgs) -> Result<()> {
    let config = Config::from_env()?;
    let builder = MetricsQueryBuilder::new(config.druid);
    let req = TimeseriesRequest {
        project: args.project,
        editor_type: Some(args.editor_type),
        page_type: Some(args.page_type),
        granularity: args.granularity,
        start: args.start,
        end: args.end,
        ..Default::default()
    };

    let query = match builder.revisions(args.metric.into(), &req) {
        Ok(query) => query,
        Err(err) => {
            print_errors(&err);
            std::process::exit(1);
        }
    };

    if !args.send {
        println!("POST {}", query.request.uri);
        println!("{}", query.request.body_json().context("failed to render query")?);
        return Ok(());
    }

    let client = HttpDruidClient::new()?;
    let response = client.query(&query.request).await?;
    println!("HTTP {}", response.status);
    println!(
        "{}",
        serde_json::to_string_pretty(&response.body).context("failed to render answer")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Range(args) => run_range(args),
        Commands::Revisions(args) => run_revisions(args).await,
    }
}
