use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pezzottify_charts::chart::{
    all_time_chart, number_ones, year_end_chart, ChartEntry, WeeklyChart, ALL_TIME_LIMIT,
};
use pezzottify_charts::chart_store::{load_state_or_default, ChartStore, SqliteChartStore};
use pezzottify_charts::cli_style::{
    colors, get_styles, print_banner, print_empty_list, print_error, print_key_value,
    print_section_footer, print_section_header, print_success, print_warning, status_color,
    TableBuilder,
};
use pezzottify_charts::config::{AppConfig, CliConfig, FileConfig};
use pezzottify_charts::runner::chart_pending_weeks;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn parse_week(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid week {:?}, expected YYYY-MM-DD", s))
}

#[derive(Parser, Debug)]
#[command(name = "pezzottify-charts", styles = get_styles())]
#[command(about = "Weekly song charts from a play history")]
struct CliArgs {
    /// Path to the SQLite charts database.
    #[clap(long = "db", global = true, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to a TOML config file, its values override the command line.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Hours added to every play timestamp before bucketing into weeks.
    #[clap(long, global = true, allow_hyphen_values = true)]
    pub utc_offset: Option<i64>,

    /// Number of positions of each weekly chart.
    #[clap(long, global = true)]
    pub chart_limit: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reads a JSON Lines play log and charts every new week it covers.
    Run {
        #[clap(long, value_parser = parse_path)]
        plays: PathBuf,
    },

    /// Shows the stored chart of a week.
    Chart {
        /// Week start date, YYYY-MM-DD.
        #[clap(value_parser = parse_week)]
        week: NaiveDate,
    },

    /// Shows the songs that collected the most points over a year.
    YearEnd {
        year: i32,
        #[clap(long)]
        limit: Option<usize>,
    },

    /// Shows the songs that collected the most points over every stored week.
    AllTime {
        #[clap(long, default_value_t = ALL_TIME_LIMIT)]
        limit: usize,
    },

    /// Shows every week's number one.
    NumberOnes {
        #[clap(long)]
        year: Option<i32>,
    },
}

fn main() {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    if let Err(err) = run(cli_args) {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli_args: CliArgs) -> Result<()> {
    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        utc_offset_hours: cli_args.utc_offset,
        chart_limit: cli_args.chart_limit,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening chart database at {:?}", config.db_path);
    let store = SqliteChartStore::new(&config.db_path)?;

    match cli_args.command {
        Command::Run { plays } => run_plays(&config, &store, &plays),
        Command::Chart { week } => show_chart(&store, week),
        Command::YearEnd { year, limit } => {
            show_year_end(&store, year, limit.unwrap_or(config.limits.chart_limit))
        }
        Command::AllTime { limit } => show_all_time(&store, limit),
        Command::NumberOnes { year } => show_number_ones(&store, year),
    }
}

fn run_plays(config: &AppConfig, store: &SqliteChartStore, plays: &Path) -> Result<()> {
    let pipeline = config.pipeline()?;
    let mut state = load_state_or_default(store);

    let mut aggregator = config.aggregator();
    let summary = config.play_log_reader().read_file(plays, &mut aggregator)?;
    let aggregated = aggregator.finish();

    print_banner();
    print_section_header("Play log");
    print_key_value("File", &plays.display().to_string());
    print_key_value("Plays", &summary.plays.to_string());
    print_key_value("Weeks with plays", &aggregated.weeks.len().to_string());
    print_section_footer();
    if summary.malformed > 0 {
        print_warning(&format!("Skipped {} malformed lines", summary.malformed));
    }

    let report = chart_pending_weeks(&pipeline, store, &mut state, &aggregated)?;
    if report.skipped_weeks > 0 {
        print_warning(&format!(
            "Ignored plays of {} weeks that were already charted",
            report.skipped_weeks
        ));
    }
    if report.weeks.is_empty() {
        print_empty_list("No new weeks to chart");
        return Ok(());
    }

    let mut table = TableBuilder::new(vec!["Week", "Entries", "Debuts", "Number one"])
        .align_right(&[1, 2]);
    for week in &report.weeks {
        table.add_row(vec![
            week.week.to_string(),
            week.entries.to_string(),
            week.debuts.to_string(),
            week.number_one
                .as_ref()
                .map_or_else(|| "-".to_string(), |e| format!("{} - {}", e.name, e.artist)),
        ]);
    }
    table.print();
    print_success(&format!("Charted {} weeks", report.weeks.len()));
    Ok(())
}

fn show_chart(store: &SqliteChartStore, week: NaiveDate) -> Result<()> {
    let Some(chart) = store.load_chart(week)? else {
        let weeks = store.list_weeks()?;
        match (weeks.first(), weeks.last()) {
            (Some(first), Some(last)) => bail!(
                "No chart for week {}, charted weeks go from {} to {}",
                week,
                first,
                last
            ),
            _ => bail!("No chart for week {}, nothing was charted yet", week),
        }
    };
    print_chart(&chart);
    Ok(())
}

fn print_chart(chart: &WeeklyChart) {
    print_section_header(&format!("Week of {}", chart.week));
    if chart.is_empty() {
        print_empty_list("No songs charted this week");
        print_section_footer();
        return;
    }

    let mut table = TableBuilder::new(vec![
        "Pos", "Last", "Move", "Title", "Artist", "Points", "Change", "Peak", "Weeks",
    ])
    .align_right(&[0, 1, 5, 6, 7, 8]);
    for entry in &chart.entries {
        table.add_colored_row(vec![
            (entry.position.to_string(), colors::WHITE),
            (
                entry
                    .previous_position
                    .map_or_else(|| "-".to_string(), |p| p.to_string()),
                colors::DIM,
            ),
            (entry.status.to_string(), status_color(&entry.status)),
            (entry.entity.name.clone(), colors::WHITE),
            (entry.entity.artist.clone(), colors::WHITE),
            (entry.weighted_points.to_string(), colors::WHITE),
            (format_change(entry.percent_change), colors::DIM),
            (peak_label(entry), peak_color(entry)),
            (entry.weeks_on_chart.to_string(), colors::WHITE),
        ]);
    }
    table.print();
    print_section_footer();
}

fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) => format!("{:+.0}%", c * 100.0),
        None => "-".to_string(),
    }
}

fn peak_label(entry: &ChartEntry) -> String {
    if entry.peak_streak > 1 && entry.position == entry.peak_position {
        format!("{} ({}x)", entry.peak_position, entry.peak_streak)
    } else {
        entry.peak_position.to_string()
    }
}

fn peak_color(entry: &ChartEntry) -> crossterm::style::Color {
    if entry.is_new_peak {
        colors::GOLD
    } else if entry.is_repeak {
        colors::GREEN
    } else {
        colors::WHITE
    }
}

fn show_year_end(store: &SqliteChartStore, year: i32, limit: usize) -> Result<()> {
    let (Some(from), Some(to)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        bail!("Invalid year {}", year);
    };
    let charts = store.load_charts_between(from, to)?;
    let year_end = year_end_chart(&charts, year, limit);

    print_section_header(&format!("Year end {}", year));
    print_key_value("Weeks", &charts.len().to_string());
    if year_end.is_empty() {
        print_empty_list("No songs charted this year");
        print_section_footer();
        return Ok(());
    }

    let mut table = TableBuilder::new(vec![
        "Pos", "Title", "Artist", "Points", "Peak", "Streak", "Weeks",
    ])
    .align_right(&[0, 3, 4, 5, 6]);
    for entry in &year_end {
        table.add_row(vec![
            entry.position.to_string(),
            entry.entity.name.clone(),
            entry.entity.artist.clone(),
            entry.total_points.to_string(),
            entry.peak_position.to_string(),
            entry.peak_streak.to_string(),
            entry.weeks_on_chart.to_string(),
        ]);
    }
    table.print();
    print_section_footer();
    Ok(())
}

fn show_all_time(store: &SqliteChartStore, limit: usize) -> Result<()> {
    let charts = store.load_all_charts()?;
    let all_time = all_time_chart(&charts, limit);

    print_section_header("All time");
    print_key_value("Weeks", &charts.len().to_string());
    if all_time.is_empty() {
        print_empty_list("Nothing was charted yet");
        print_section_footer();
        return Ok(());
    }

    let mut table = TableBuilder::new(vec![
        "Pos", "Title", "Artist", "Points", "Streams %", "Sales %", "Airplay %", "Peak", "Weeks",
    ])
    .align_right(&[0, 3, 4, 5, 6, 7, 8]);
    for entry in &all_time {
        let shares = &entry.average_percentages;
        table.add_row(vec![
            entry.position.to_string(),
            entry.entity.name.clone(),
            entry.entity.artist.clone(),
            entry.total_points.to_string(),
            format!("{:.0}", shares.streams * 100.0),
            format!("{:.0}", shares.sales * 100.0),
            format!("{:.0}", shares.airplay * 100.0),
            peak_with_streak(entry.peak_position, entry.peak_streak),
            entry.weeks_on_chart.to_string(),
        ]);
    }
    table.print();
    print_section_footer();
    Ok(())
}

fn peak_with_streak(peak_position: u32, peak_streak: u32) -> String {
    if peak_streak > 1 {
        format!("{} ({}x)", peak_position, peak_streak)
    } else {
        peak_position.to_string()
    }
}

fn show_number_ones(store: &SqliteChartStore, year: Option<i32>) -> Result<()> {
    let charts = store.load_all_charts()?;
    let ones: Vec<ChartEntry> = number_ones(&charts)
        .into_iter()
        .filter(|e| year.map_or(true, |y| e.week.year() == y))
        .collect();

    let title = match year {
        Some(y) => format!("Number ones of {}", y),
        None => "Number ones".to_string(),
    };
    print_section_header(&title);
    if ones.is_empty() {
        print_empty_list("No number ones yet");
        print_section_footer();
        return Ok(());
    }

    let mut table = TableBuilder::new(vec!["Week", "Title", "Artist", "Points", "Weeks at #1"])
        .align_right(&[3, 4]);
    for entry in &ones {
        let weeks_at_one = if entry.peak_position == 1 {
            entry.peak_streak.to_string()
        } else {
            "-".to_string()
        };
        table.add_colored_row(vec![
            (entry.week.to_string(), colors::DIM),
            (entry.entity.name.clone(), colors::WHITE),
            (entry.entity.artist.clone(), colors::WHITE),
            (entry.weighted_points.to_string(), colors::WHITE),
            (weeks_at_one, colors::GOLD),
        ]);
    }
    table.print();
    print_section_footer();
    Ok(())
}
