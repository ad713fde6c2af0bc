//! Plain-text rendering of a single search for `scout show`.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::fmt::Write;

use crate::dates::format_relative;
use crate::error::Result;
use crate::models::{Candidate, Locale, SearchRecord};
use crate::prompt::{format_prompt_text, TextBlock};
use crate::status::{classify, SearchView};

const WIDTH: usize = 78;

/// Picks the German or English variant of a UI string.
pub fn t(locale: Locale, de: &'static str, en: &'static str) -> &'static str {
    match locale {
        Locale::De => de,
        Locale::En => en,
    }
}

fn wrap(text: &str, first: &str, rest: &str) -> String {
    let options = textwrap::Options::new(WIDTH)
        .initial_indent(first)
        .subsequent_indent(rest);
    textwrap::fill(text, options)
}

pub fn write_blocks(out: &mut String, blocks: &[TextBlock]) {
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match block {
            TextBlock::Paragraph { text } => {
                out.push_str(&wrap(text, "  ", "  "));
                out.push('\n');
            }
            TextBlock::List {
                leading_text,
                items,
            } => {
                if let Some(lead) = leading_text {
                    out.push_str(&wrap(lead, "  ", "  "));
                    out.push('\n');
                }
                for item in items {
                    out.push_str(&wrap(item, "  • ", "    "));
                    out.push('\n');
                }
            }
        }
    }
}

fn optional_number(value: Option<u32>, locale: Locale) -> String {
    match value {
        Some(n) => n.to_string(),
        None => t(locale, "Nicht angegeben", "Not specified").to_string(),
    }
}

/// One line for the list view: "N Kandidaten gefunden" on completed searches.
pub fn candidate_count_label(view: &SearchView, locale: Locale) -> Option<String> {
    view.candidate_count().map(|n| match locale {
        Locale::De => format!("{} Kandidaten gefunden", n),
        Locale::En => format!("{} candidates found", n),
    })
}

fn write_candidate(out: &mut String, candidate: &Candidate, locale: Locale) -> std::fmt::Result {
    writeln!(out, "  {}", candidate.name)?;
    let details: Vec<&str> = [candidate.position.as_deref(), candidate.location.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !details.is_empty() {
        writeln!(out, "    {}", details.join(" | "))?;
    }
    if let Some(summary) = &candidate.summary {
        writeln!(out, "{}", wrap(summary, "    ", "    "))?;
    }
    if let Some(url) = &candidate.profile_url {
        writeln!(out, "    {}: {}", t(locale, "Profil", "Profile"), url)?;
    }
    for (i, link) in candidate.profile_links.iter().enumerate() {
        writeln!(out, "    Link {}: {}", i + 1, link)?;
    }
    Ok(())
}

pub fn render_detail<Tz: TimeZone>(
    search: &SearchRecord,
    now: &DateTime<Utc>,
    tz: &Tz,
    locale: Locale,
) -> Result<String> {
    let view = classify(search)?;
    let status = search.parsed_status()?;
    let mut out = String::new();
    write_detail(&mut out, search, &view, status.label(locale), now, tz, locale)?;
    Ok(out)
}

/// Machine-readable form of the detail page: the stored record plus
/// everything derived from it.
pub fn detail_json(search: &SearchRecord) -> Result<serde_json::Value> {
    let view = classify(search)?;
    let candidates = match &view {
        SearchView::ResultsPresent(shape) => shape.candidates().to_vec(),
        _ => Vec::new(),
    };
    Ok(json!({
        "search": search,
        "display_name": search.display_name(),
        "render_mode": view.mode(),
        "candidate_count": view.candidate_count(),
        "candidates": candidates,
        "system_prompt": format_prompt_text(search.system_prompt.as_deref()),
        "user_prompt": format_prompt_text(search.user_prompt.as_deref()),
    }))
}

fn write_detail<Tz: TimeZone>(
    out: &mut String,
    search: &SearchRecord,
    view: &SearchView,
    status_label: &str,
    now: &DateTime<Utc>,
    tz: &Tz,
    locale: Locale,
) -> std::fmt::Result {
    writeln!(out, "Search #{}: {}", search.id, search.display_name())?;
    if search.has_name() {
        writeln!(out, "{}", search.search_keywords)?;
    }
    writeln!(
        out,
        "{}: {}",
        t(locale, "Erstellt", "Created"),
        format_relative(&search.created_at, now, tz, locale)
    )?;
    if let Some(completed) = &search.completed_at {
        writeln!(
            out,
            "{}: {}",
            t(locale, "Abgeschlossen", "Completed"),
            format_relative(completed, now, tz, locale)
        )?;
    }
    writeln!(out, "Status: {}", status_label)?;

    writeln!(out, "\n--- {} ---", t(locale, "Suchfilter", "Search filters"))?;
    if let Some(name) = search.name.as_deref().filter(|_| search.has_name()) {
        writeln!(out, "{}: {}", t(locale, "Such-Name", "Search name"), name)?;
    }
    writeln!(out, "Position: {}", search.search_keywords)?;
    writeln!(
        out,
        "{}: {}",
        t(locale, "Standort", "Location"),
        search.location.as_deref().unwrap_or(t(locale, "Beliebig", "Any"))
    )?;
    writeln!(
        out,
        "{}: {}",
        t(locale, "Lebenslauf aktualisiert (Tage)", "Resume updated (days)"),
        optional_number(search.resume_last_updated_days, locale)
    )?;
    writeln!(
        out,
        "{}: {}",
        t(locale, "Ziel-Kandidaten", "Target candidates"),
        optional_number(search.target_candidates, locale)
    )?;
    writeln!(
        out,
        "{}: {}",
        t(locale, "Max. Radius (km)", "Max. radius (km)"),
        optional_number(search.max_radius, locale)
    )?;
    writeln!(
        out,
        "{}: {}",
        t(locale, "Empfänger-E-Mail", "Recipient email"),
        search
            .recipient_email
            .as_deref()
            .unwrap_or(t(locale, "Nicht angegeben", "Not specified"))
    )?;

    for (title, prompt) in [
        ("System-Prompt", &search.system_prompt),
        ("User-Prompt", &search.user_prompt),
    ] {
        let blocks = format_prompt_text(prompt.as_deref());
        if blocks.is_empty() {
            continue;
        }
        writeln!(out, "\n--- {} ---", title)?;
        write_blocks(out, &blocks);
    }

    writeln!(out, "\n--- {} ---", t(locale, "Ergebnisse", "Results"))?;
    match view {
        SearchView::Waiting(status) => {
            writeln!(
                out,
                "{} ({})",
                t(locale, "Suche läuft...", "Search in progress..."),
                status.label(locale)
            )?;
        }
        SearchView::Failed => {
            writeln!(
                out,
                "{}",
                t(
                    locale,
                    "Suche fehlgeschlagen. Bitte versuchen Sie es erneut.",
                    "Search failed. Please try again."
                )
            )?;
        }
        SearchView::ResultsEmpty => {
            writeln!(
                out,
                "{}",
                t(
                    locale,
                    "Keine Kandidaten für diese Suche gefunden.",
                    "No candidates found for this search."
                )
            )?;
        }
        SearchView::ResultsPresent(shape) => {
            if let Some(label) = candidate_count_label(view, locale) {
                writeln!(out, "{}\n", label)?;
            }
            for candidate in shape.candidates() {
                write_candidate(out, candidate, locale)?;
            }
        }
    }
    Ok(())
}
