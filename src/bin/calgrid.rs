extern crate calgrid as lib;

use chrono::{DateTime, FixedOffset};
use lib::ctrl::RecordBatch;
use lib::{CalendarController, Event, ItemProjector, ThemeTag};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr};
use std::fs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "calgrid",
    about = "Renders the month grid of a calendar as the widget would receive it."
)]
pub struct Args {
    #[structopt(
        name = "ITEMS",
        help = "TOML file with [[item]] entries",
        parse(from_os_str)
    )]
    pub items: PathBuf,

    #[structopt(
        name = "CONFIG",
        short = "c",
        long = "config",
        help = "path to config file",
        parse(from_os_str)
    )]
    pub configfile: Option<PathBuf>,

    #[structopt(
        short = "d",
        long = "date",
        help = "viewport date as sent by the widget, e.g. 2024-03-15T00:00:00.000+01:00"
    )]
    pub date: Option<String>,

    #[structopt(short = "a", long = "activate", help = "item key to click")]
    pub activate: Vec<String>,

    #[structopt(long = "hide-weekends", help = "hide saturdays and sundays")]
    pub hide_weekends: bool,

    #[structopt(long = "log-file", help = "path to log file", parse(from_os_str))]
    pub log_file: Option<PathBuf>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct Entry {
    #[serde_as(as = "DisplayFromStr")]
    date: DateTime<FixedOffset>,
    label: String,
    #[serde(default)]
    theme: ThemeTag,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    #[serde(default, rename = "item")]
    items: Vec<Entry>,
}

fn load_items(path: &Path) -> Result<Vec<Entry>, lib::Error> {
    let content = fs::read_to_string(path)?;
    let file: ItemFile = toml::from_str(&content)?;
    Ok(file.items)
}

fn print_batch(batch: &RecordBatch) {
    match serde_json::to_string_pretty(batch) {
        Ok(json) => println!("{}", json),
        Err(err) => log::error!("could not serialize batch: {}", err),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_args();

    let _logger = lib::logging::init(None, args.log_file.as_deref())?;

    std::panic::set_hook(Box::new(move |info| {
        println!("calgrid ran into a fatal error!");
        println!(
            "Consider filing an issue with a log file and the backtrace below at {}",
            env!("CARGO_PKG_REPOSITORY")
        );

        println!("{}", info);
        println!("{:?}", backtrace::Backtrace::new());
    }));

    let mut config = lib::config::load_suitable_config(args.configfile.as_deref())?;
    if args.hide_weekends {
        config.hide_weekends = true;
    }

    let projector = ItemProjector::new(|e: &Entry| Some(e.label.clone()), |e: &Entry| Some(e.date))
        .with_theme(|e: &Entry| Some(e.theme))
        .with_data_generator(|e: &Entry, data: &mut Map<String, Value>| {
            if let Some(location) = &e.location {
                data.insert("location".to_owned(), Value::from(location.as_str()));
            }
        });

    let mut calendar = CalendarController::new(projector, &config, print_batch);
    calendar.add_click_listener(|event: &lib::ItemClicked<Entry>| {
        log::info!("item '{}' clicked", event.key);
    });

    if let Some(date) = args.date {
        calendar.handle(Event::ViewportChanged(date))?;
    }

    calendar.set_items(load_items(&args.items)?)?;

    for key in args.activate {
        let event = calendar.on_item_activated(&key)?;
        println!("{}: {} ({})", key, event.item.label, event.item.date);
    }

    Ok(())
}
