// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use bazi_fortune::{Config, FortuneReport, Gender, HistoryRecord, HistoryStore, HISTORY_TAIL};
use chrono::{Local, NaiveDate};
use log::info;
use std::env;
use std::fs::File;

const USAGE: &str = "usage: bazi-fortune [calc <YYYY-MM-DD> <hour> [male|female] | history | stats | export <file.csv>]";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::from_env().context("Failed to read configuration")?;
    let store = HistoryStore::with_capacity(&config.history_file, config.history_capacity);
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("calc") => run_calc(&store, &args[1..])?,
        Some("history") => run_history(&store),
        Some("stats") => run_stats(&store),
        Some("export") => run_export(&store, &args[1..])?,
        Some("help") | Some("--help") | Some("-h") => println!("{}", USAGE),
        Some(other) => bail!("unknown command {:?}\n{}", other, USAGE),
        None => run_ui_mode(&store)?,
    }

    Ok(())
}

fn run_calc(store: &HistoryStore, args: &[String]) -> Result<()> {
    let (date, hour) = match args {
        [date, hour, ..] => (date, hour),
        _ => bail!("calc needs a birth date and hour\n{}", USAGE),
    };
    let birth_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid birth date {:?}", date))?;
    let hour: u32 = hour
        .parse()
        .with_context(|| format!("invalid birth hour {:?}", hour))?;
    let gender = Gender::parse(args.get(2).map(String::as_str).unwrap_or("male"));

    let report = FortuneReport::compute(birth_date, hour, gender, Local::now().date_naive())?;
    store.append(HistoryRecord::new(birth_date, report.fortune, report.wealth))?;
    info!("Recorded query for {}", birth_date);

    println!("农历: {}", report.lunar);
    println!("八字: {}", report.bazi);
    let elements: Vec<String> = report
        .elements
        .iter()
        .map(|(element, n)| format!("{}{}", element, n))
        .collect();
    println!("五行: {}", elements.join(" "));
    let shares: Vec<String> = report
        .balance
        .iter()
        .map(|share| {
            format!(
                "{}{:.1}%{}",
                share.element,
                share.percentage,
                share.rating.glyph()
            )
        })
        .collect();
    println!("占比: {}", shares.join(" "));
    println!(
        "阴阳: 阳{} 阴{}",
        report.polarity.yang, report.polarity.yin
    );
    let dm = &report.day_master;
    println!("日主: {} ({}) 强度 {}", dm.stem, dm.element, dm.strength);
    println!(
        "生我 {} 我生 {} 我克 {} 克我 {}",
        dm.supported_by, dm.feeds, dm.controls, dm.controlled_by
    );
    println!("性格: {}", dm.character);
    println!("事业: {}", dm.career);
    println!("健康: {}", dm.health);
    println!("今日运势: {}", report.fortune);
    println!("财运指数: {}", report.wealth);
    for line in &report.advice {
        println!("建议: {}", line);
    }

    Ok(())
}

fn run_history(store: &HistoryStore) {
    let records = store.tail(HISTORY_TAIL);
    if records.is_empty() {
        println!("No queries recorded yet");
        return;
    }
    for record in records {
        println!(
            "{}  {}  fortune {:>3}  wealth {:>3}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.birth_date,
            record.fortune,
            record.wealth
        );
    }
}

fn run_stats(store: &HistoryStore) {
    let stats = store.statistics();
    println!("Total queries:   {}", stats.total);
    println!("Average fortune: {:.1}", stats.avg_fortune);
    println!("Average wealth:  {:.1}", stats.avg_wealth);
}

fn run_export(store: &HistoryStore, args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        bail!("export needs an output file\n{}", USAGE);
    };
    let file = File::create(path).with_context(|| format!("cannot create {}", path))?;
    let rows = store.export_csv(file)?;
    println!("Exported {} records to {}", rows, path);
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: &HistoryStore) -> Result<()> {
    let records = store.load();
    println!("Loaded {} queries from {:?}", records.len(), store.path());

    let mut app = ui::App::new(records);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: &HistoryStore) -> Result<()> {
    eprintln!("TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run a command: {}", USAGE);
    std::process::exit(1);
}
