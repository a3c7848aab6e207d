use anyhow::Result;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use std::path::PathBuf;

use tabgrid::data::data_view::RowRange;
use tabgrid::data::datatable::PinSide;
use tabgrid::data::store::SessionStore;
use tabgrid::data::filter::{ColumnFilter, FilterOp};
use tabgrid::data::sort::{SortDirection, SortSpec};
use tabgrid::engine::GridEngine;
use tabgrid::Config;

fn print_help() {
    println!("tabgrid - inspect delimited data with filters, sorting and export");
    println!();
    println!("Usage: tabgrid [FILE] [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --paste                  Load data from the system clipboard");
    println!("  --filter COL:OP:VALUE    Column filter, repeatable (ops: contains,");
    println!("                           equals, startsWith, endsWith, notContains,");
    println!("                           isEmpty, isNotEmpty)");
    println!("  --search TEXT            Global filter across visible columns");
    println!("  --sort COL:asc|desc      Sort key, repeatable (applied in order)");
    println!("  --rows START-END         Restrict to a 1-based inclusive row range");
    println!("  --hide COL               Hide a column, repeatable");
    println!("  --pin COL:left|right     Pin a column to an edge, repeatable");
    println!("  --export csv|json        Print the view in that format instead of");
    println!("                           a table");
    println!("  --out DIR                With --export, write a timestamped file");
    println!("                           into DIR instead of stdout");
    println!("  --help                   Show this help");
}

struct CliArgs {
    file: Option<PathBuf>,
    paste: bool,
    filters: Vec<ColumnFilter>,
    search: Option<String>,
    sorts: Vec<SortSpec>,
    rows: Option<RowRange>,
    hide: Vec<String>,
    pins: Vec<(String, PinSide)>,
    export: Option<String>,
    out: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs {
        file: None,
        paste: false,
        filters: Vec::new(),
        search: None,
        sorts: Vec::new(),
        rows: None,
        hide: Vec::new(),
        pins: Vec::new(),
        export: None,
        out: None,
    };

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--paste" => parsed.paste = true,
            "--filter" => {
                let spec = expect_value(&mut iter, "--filter")?;
                parsed.filters.push(parse_filter(&spec)?);
            }
            "--search" => parsed.search = Some(expect_value(&mut iter, "--search")?),
            "--sort" => {
                let spec = expect_value(&mut iter, "--sort")?;
                parsed.sorts.push(parse_sort(&spec)?);
            }
            "--rows" => {
                let spec = expect_value(&mut iter, "--rows")?;
                parsed.rows = Some(parse_range(&spec)?);
            }
            "--hide" => parsed.hide.push(expect_value(&mut iter, "--hide")?),
            "--pin" => {
                let spec = expect_value(&mut iter, "--pin")?;
                parsed.pins.push(parse_pin(&spec)?);
            }
            "--export" => {
                let format = expect_value(&mut iter, "--export")?;
                match format.as_str() {
                    "csv" | "json" => parsed.export = Some(format),
                    other => anyhow::bail!("unknown export format '{}', use csv or json", other),
                }
            }
            "--out" => parsed.out = Some(PathBuf::from(expect_value(&mut iter, "--out")?)),
            other if other.starts_with("--") => {
                anyhow::bail!("unknown option '{}', see --help", other)
            }
            other => parsed.file = Some(PathBuf::from(other)),
        }
    }
    Ok(parsed)
}

fn expect_value(
    iter: &mut std::iter::Peekable<std::slice::Iter<'_, String>>,
    flag: &str,
) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
}

fn parse_filter(spec: &str) -> Result<ColumnFilter> {
    // COL:OP[:VALUE] with the value optional for the emptiness ops
    let mut parts = spec.splitn(3, ':');
    let column = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("bad filter '{}', expected COL:OP:VALUE", spec))?;
    let op_str = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("bad filter '{}', expected COL:OP:VALUE", spec))?;
    let op = FilterOp::parse(op_str)
        .ok_or_else(|| anyhow::anyhow!("unknown filter operator '{}'", op_str))?;
    let value = parts.next().unwrap_or("");
    Ok(ColumnFilter::new(column, op, value))
}

fn parse_sort(spec: &str) -> Result<SortSpec> {
    let (column, dir) = match spec.rsplit_once(':') {
        Some((col, dir)) => (col, SortDirection::parse(dir)
            .ok_or_else(|| anyhow::anyhow!("bad sort direction '{}', use asc or desc", dir))?),
        None => (spec, SortDirection::Asc),
    };
    if column.is_empty() {
        anyhow::bail!("bad sort '{}', expected COL:asc|desc", spec);
    }
    Ok(SortSpec {
        column: column.to_string(),
        direction: dir,
    })
}

fn parse_range(spec: &str) -> Result<RowRange> {
    let (start, end) = spec
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("bad range '{}', expected START-END", spec))?;
    let start: usize = start.trim().parse()?;
    let end: usize = end.trim().parse()?;
    Ok(RowRange::new(start, end))
}

fn parse_pin(spec: &str) -> Result<(String, PinSide)> {
    let (column, side) = spec
        .rsplit_once(':')
        .ok_or_else(|| anyhow::anyhow!("bad pin '{}', expected COL:left|right", spec))?;
    let side = match side {
        "left" => PinSide::Left,
        "right" => PinSide::Right,
        "none" => PinSide::None,
        other => anyhow::bail!("bad pin side '{}', use left or right", other),
    };
    Ok((column.to_string(), side))
}

fn display_grid(engine: &GridEngine) {
    let snapshot = engine.snapshot();
    if snapshot.rows.is_empty() {
        println!("No rows match.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        snapshot
            .visible_headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );
    for row in &snapshot.rows {
        table.add_row(row.clone());
    }
    println!("{table}");
    println!(
        "\n{} of {} rows shown",
        snapshot.visible_row_count, snapshot.total_row_count
    );
}

/// Load data per the CLI, falling back to a restored session when no
/// input is given. Returns false when there is nothing to show.
fn load_input(engine: &mut GridEngine, cli: &CliArgs) -> Result<bool> {
    if cli.paste {
        engine.paste_from_clipboard()?;
    } else if let Some(file) = &cli.file {
        engine.load_csv_file(file)?;
    } else if engine.file_name().is_none() {
        return Ok(false);
    }
    Ok(true)
}

fn main() -> Result<()> {
    tabgrid::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let cli = parse_args(&args)?;
    let mut engine = GridEngine::new(Config::load());
    if let Some(store) = SessionStore::open_default() {
        engine = engine.with_store(store);
    }

    if !load_input(&mut engine, &cli)? {
        print_help();
        return Ok(());
    }

    for name in &cli.hide {
        engine.toggle_column(name, Some(false))?;
    }
    for (name, side) in &cli.pins {
        engine.pin_column(name, *side)?;
    }
    if let Some(range) = cli.rows {
        engine.set_row_range(Some(range));
    }
    if !cli.filters.is_empty() {
        engine.set_column_filters(cli.filters.clone());
    }
    if let Some(search) = &cli.search {
        engine.set_global_filter(search);
    }
    engine.apply_pending_filters();
    if !cli.sorts.is_empty() {
        engine.apply_sorting(cli.sorts.clone());
    }

    match cli.export.as_deref() {
        Some("csv") => match &cli.out {
            Some(dir) => {
                let path = engine.write_csv_file(dir, false)?;
                println!("Wrote {}", path.display());
            }
            None => print!("{}", engine.export_csv(false)?),
        },
        Some("json") => match &cli.out {
            Some(dir) => {
                let path = engine.write_json_file(dir, false)?;
                println!("Wrote {}", path.display());
            }
            None => println!("{}", engine.export_json(false)?),
        },
        _ => display_grid(&engine),
    }

    Ok(())
}
