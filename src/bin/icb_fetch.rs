use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use icb_data_fetch::app::App;
use icb_data_fetch::archive::ArchiveHttpClient;
use icb_data_fetch::catalog::CatalogHttpClient;
use icb_data_fetch::config::{
    ConfigLoader, DEFAULT_ARCHIVE_BASE_URL, DEFAULT_CATALOG_URL, DEFAULT_DOWNLOAD_DIR,
    FailurePolicy, RunSettings,
};
use icb_data_fetch::error::FetchError;
use icb_data_fetch::output::{JsonOutput, OutputMode, TextOutput, TracingSink};

#[derive(Parser)]
#[command(name = "icb-fetch")]
#[command(about = "Download clinical ICB datasets listed by ORCESTRA and unpack them locally")]
#[command(version, author)]
struct Cli {
    /// Base URL the `<name>.zip` archives are served from
    #[arg(long, value_name = "URL", default_value = DEFAULT_ARCHIVE_BASE_URL)]
    base_url: String,

    /// Endpoint listing the available datasets
    #[arg(long, value_name = "URL", default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Directory datasets are unpacked into
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DOWNLOAD_DIR)]
    dest: String,

    /// Fetch only these datasets instead of querying the catalog
    #[arg(long = "study", value_name = "NAME")]
    studies: Vec<String>,

    /// Do not append the datasets missing from the catalog
    #[arg(long)]
    no_extras: bool,

    /// Keep going after a dataset fails instead of stopping the run
    #[arg(long)]
    keep_going: bool,

    #[arg(long, value_name = "SECONDS")]
    timeout_secs: Option<u64>,

    #[arg(long, default_value_t = 0)]
    retries: usize,

    /// Print what would be fetched without downloading anything
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_settings(self) -> RunSettings {
        RunSettings {
            archive_base_url: Some(self.base_url),
            catalog_url: Some(self.catalog_url),
            studies: self.studies,
            extras: self.no_extras.then(Vec::new),
            download_dir: Some(self.dest),
            timeout_secs: self.timeout_secs,
            retries: self.retries,
            failure_policy: if self.keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::Abort
            },
            dry_run: self.dry_run,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(err) = report.downcast_ref::<FetchError>() {
                return ExitCode::from(map_exit_code(err));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &FetchError) -> u8 {
    match error {
        FetchError::InvalidDatasetName(_) => 2,
        FetchError::HttpClient(_)
        | FetchError::CatalogHttp(_)
        | FetchError::CatalogParse(_)
        | FetchError::ArchiveHttp { .. } => 3,
        FetchError::DestinationExists(_)
        | FetchError::InvalidArchive { .. }
        | FetchError::UnsafeArchiveEntry(_)
        | FetchError::Filesystem(_) => 4,
    }
}

fn run() -> miette::Result<ExitCode> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config = ConfigLoader::resolve_settings(cli.into_settings())?;

    let catalog = CatalogHttpClient::new(&config)?;
    let archives = ArchiveHttpClient::new(&config)?;
    let app = App::new(catalog, archives);

    let report = match output_mode {
        OutputMode::Json => app.run(&config, &JsonOutput),
        OutputMode::Human => app.run(&config, &TracingSink),
    }?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_report(&report).into_diagnostic()?,
        OutputMode::Human => TextOutput::print_report(&report).into_diagnostic()?,
    }

    if report.failed() > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}
