use std::io::IsTerminal;
use std::time::Instant;

use chrono::Utc;
use crossterm::style::{style, Color, Stylize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::context::PassRequest;
use crate::app::{AppContext, Result, TributaryError};
use crate::cli::DisplayArgs;
use crate::config::ColorConfig;
use crate::domain::{pluralize, RankedItem};
use crate::fetcher::PassReport;
use crate::rank::Query;
use crate::store::FreshnessStore;

const TITLE_WIDTH: usize = 30;

pub async fn show_feed(ctx: &AppContext, display: DisplayArgs) -> Result<()> {
    let request = PassRequest {
        list: display.list,
        query: None,
        since: display.since,
        limit: display.limit,
    };
    run_and_print(ctx, &request).await
}

pub async fn search(ctx: &AppContext, query: &str, display: DisplayArgs) -> Result<()> {
    let request = PassRequest {
        list: display.list,
        query: Some(Query::parse(query)?),
        since: display.since,
        limit: display.limit,
    };
    run_and_print(ctx, &request).await
}

async fn run_and_print(ctx: &AppContext, request: &PassRequest) -> Result<()> {
    let started = Instant::now();
    let report = ctx.run(request, Utc::now()).await?;

    for failure in &report.failures {
        eprintln!("{}", failure);
    }
    if let Some(e) = &report.persist_error {
        eprintln!("failed to save cache information: {}", e);
    }

    if report.items.is_empty() {
        eprintln!("no items to display");
        return Ok(());
    }

    let styled = std::io::stdout().is_terminal();
    print!("{}", render_items(&report, &ctx.config.colors, styled));

    if ctx.config.summary {
        println!("{}", report.summary.describe(started.elapsed()));
    }
    Ok(())
}

/// Renders items oldest-ranked first so the top result ends up nearest the
/// prompt.
pub fn render_items(report: &PassReport, colors: &ColorConfig, styled: bool) -> String {
    let paint = |text: String, color: u8| {
        if styled {
            style(text).with(Color::AnsiValue(color)).to_string()
        } else {
            text
        }
    };

    let width = report
        .items
        .iter()
        .map(|item| {
            item.feed_title
                .width()
                .max(published_label(item).width())
        })
        .max()
        .unwrap_or(0)
        .min(TITLE_WIDTH);

    let mut out = String::new();
    for item in report.items.iter().rev() {
        let new_mark = if item.is_new {
            paint("• ".to_string(), colors.highlight())
        } else {
            String::new()
        };
        out.push_str(&format!(
            "{}  {}{}\n{}  {}\n\n",
            paint(pad(&truncate(&item.feed_title, width), width), item.color),
            new_mark,
            item.display_title(),
            paint(pad(&published_label(item), width), colors.secondary_text()),
            paint(item.entry.link.clone().unwrap_or_default(), colors.secondary_text()),
        ));
    }
    out
}

fn published_label(item: &RankedItem) -> String {
    item.entry
        .published
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Cuts `text` to `width` terminal columns, ending in `...` when cut.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(3);
    let mut used = 0;
    let mut kept = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }
    format!("{kept}...")
}

/// Left-aligns `text` in `width` columns. `format!` pads by chars, which
/// misaligns double-width glyphs.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

pub fn follow(ctx: &AppContext, urls: &[String], list: &str) -> Result<()> {
    let urls = urls
        .iter()
        .map(|raw| {
            url::Url::parse(raw)
                .map(|u| u.to_string())
                .map_err(|_| TributaryError::Usage(format!("failed to parse URL: {raw}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let added = ctx.store.subscribe(list, &urls)?;
    println!("added {} to list: {}", pluralize(added, "feed"), list);
    Ok(())
}

pub fn cache_info(ctx: &AppContext) -> Result<()> {
    let mut entries: Vec<_> = ctx.store.load()?.into_values().collect();
    entries.sort_by(|a, b| a.url.cmp(&b.url));

    let width = entries.iter().map(|e| e.url.len()).max().unwrap_or(0).max(3);
    println!("{}  Last fetch           Fetch after", pad("URL", width));
    for entry in entries {
        println!(
            "{}  {}  {}",
            pad(&entry.url, width),
            entry.last_fetch.format("%Y-%m-%d %H:%M:%S"),
            entry.fetch_after.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    Ok(())
}
