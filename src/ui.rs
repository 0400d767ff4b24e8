//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, NowPlaying};
use crate::config::ControlsSettings;
use crate::session::SessionState;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("enter", "play selected song");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next song");
    // H/L is filled dynamically from config.
    map.insert("s", "stop");
    map.insert("/", "search");
    map.insert("1-5", "rate");
    map.insert("K", "metadata");
    map.insert("R", "reload");
    map.insert("q", "quit");
    map
});

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "enter", "space/p", "h/l", "H/L", "s", "/", "1-5", "K", "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format seconds as `MM:SS`.
fn format_mmss(secs: f64) -> String {
    let secs = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `elapsed / total`, or just elapsed when the total is unknown.
fn progress_text(now: &NowPlaying) -> String {
    let elapsed = format_mmss(now.progress.elapsed);
    match now.progress.duration {
        Some(total) => format!("{} / {}", elapsed, format_mmss(total)),
        None => elapsed,
    }
}

fn progress_ratio(now: &NowPlaying) -> f64 {
    match now.progress.duration {
        Some(total) if total > 0.0 => (now.progress.elapsed / total).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn status_text(app: &App, now: &NowPlaying) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(" STATE: {}", now.state));

    if let Some(track) = &now.track {
        let mut song = track.to_string();
        if let Some(meta) = &now.metadata {
            song = format!("{} - {}", meta.artist, song);
        }
        parts.push(format!("Song: {} [{}]", song, progress_text(now)));
    }

    let q = app.filter_query.trim();
    if app.filter_mode {
        parts.push(format!("SEARCH: {}_", app.filter_query));
    } else if let Some(submitted) = &app.submitted_query {
        parts.push(format!("RESULTS: {}", submitted));
    } else if !q.is_empty() {
        parts.push(format!("SEARCH: {}", q));
    }

    if !app.catalog_loaded {
        parts.push("Catalog: not loaded".to_string());
    } else {
        parts.push(format!("Catalog: {} tracks", app.catalog.len()));
    }

    parts.join(" • ")
}

/// Uppercase the part of `title` that matched the search, as the list
/// has no other highlight channel.
fn highlighted(title: &str, query: Option<&str>) -> String {
    let Some(positions) = query.and_then(|q| App::match_positions(title, q)) else {
        return title.to_string();
    };
    title
        .chars()
        .enumerate()
        .flat_map(|(i, ch)| {
            let upper = positions.contains(&i);
            let mapped: Vec<char> = if upper {
                ch.to_uppercase().collect()
            } else {
                vec![ch]
            };
            mapped
        })
        .collect()
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn metadata_text(now: &NowPlaying) -> String {
    match (&now.track, &now.metadata) {
        (Some(_), Some(meta)) => format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nBitrate: {} kbps\nSize: {} bytes\nLocal file: {}",
            meta.track_name,
            meta.artist,
            meta.album,
            format_mmss(meta.duration_seconds() as f64),
            meta.bitrate_bps() / 1000,
            meta.total_bytes,
            now.resource
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        (Some(track), None) => format!("Title: {}\nLoading…", track),
        _ => "Nothing playing".to_string(),
    }
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App, now: &NowPlaying, controls: &ControlsSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new("remote catalog player")
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = Paragraph::new(status_text(app, now))
        .block(Block::bordered().padding(LEFT_PAD).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Progress gauge
    let gauge_style = if now.progress.dragging {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let gauge = Gauge::default()
        .gauge_style(gauge_style)
        .ratio(progress_ratio(now))
        .label(progress_text(now));
    frame.render_widget(gauge, chunks[2]);

    // Latest notice
    let notice = match &app.notice {
        Some(n) => Paragraph::new(format!(" {}: {}", n.title, n.message))
            .style(Style::default().fg(Color::Red)),
        None => Paragraph::new(""),
    };
    frame.render_widget(notice, chunks[3]);

    // Main list
    {
        let visible = app.visible();
        let query = app
            .submitted_query
            .as_deref()
            .filter(|_| app.search_results.is_some());

        // Center the selected item when possible by creating a visible window.
        // Important: only build ListItems for the visible window (avoid allocating the entire list).
        let total = visible.len();
        let list_height = chunks[4].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let playing = now.track.as_ref();
        let items: Vec<ListItem> = visible[start..end]
            .iter()
            .map(|id| {
                let text = highlighted(id.as_str(), query);
                if Some(id) == playing && now.state != SessionState::Idle {
                    ListItem::new(format!("♪ {}", text))
                        .style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new(format!("  {}", text))
                }
            })
            .collect();

        let title = if app.search_results.is_some() {
            " results (Esc clears) "
        } else {
            " tracks "
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[4], &mut state);
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[4]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(now))
            .block(
                Block::default()
                    .padding(LEFT_PAD)
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    let footer = Paragraph::new(controls_text(controls.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);
}
