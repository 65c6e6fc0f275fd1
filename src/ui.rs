use std::fmt::Write;

use chrono::{DateTime, Duration, Local, Utc};
use crossterm::style::Stylize;
use itertools::Itertools;

use crate::commands::SortKey;
use crate::devices::WlanEndpoint;
use crate::status::StatusMessage;

/// How many session events `wlan.show` prints under the table.
pub const RECENT_EVENTS: usize = 20;

const FRESH_SECS: i64 = 10;
const STALE_SECS: i64 = 60;
const WARMUP_SECS: i64 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Bold,
    Dim,
}

/// SSID ascending, ties broken by address ascending.
pub fn sort_by_ssid(entries: &mut [WlanEndpoint]) {
    entries.sort_by(|a, b| a.ssid().cmp(b.ssid()).then_with(|| a.address().cmp(&b.address())));
}

/// Most recently seen first.
pub fn sort_by_seen(entries: &mut [WlanEndpoint]) {
    entries.sort_by(|a, b| b.endpoint.last_seen().cmp(&a.endpoint.last_seen()));
}

pub fn sorted(mut entries: Vec<WlanEndpoint>, key: SortKey) -> Vec<WlanEndpoint> {
    match key {
        SortKey::Ssid => sort_by_ssid(&mut entries),
        SortKey::Seen => sort_by_seen(&mut entries),
    }
    entries
}

/// Dim when missed last sweep. Bold when it showed up in the last ten
/// seconds of a session that has been running for more than twenty.
pub fn address_emphasis(
    entry: &WlanEndpoint,
    now: DateTime<Utc>,
    session_age: Duration,
) -> Emphasis {
    if entry.was_missed() {
        Emphasis::Dim
    } else if session_age > Duration::seconds(WARMUP_SECS)
        && now - entry.endpoint.first_seen() <= Duration::seconds(FRESH_SECS)
    {
        Emphasis::Bold
    } else {
        Emphasis::Plain
    }
}

/// Bold when seen in the last ten seconds, dim after a minute of silence.
pub fn last_seen_emphasis(entry: &WlanEndpoint, now: DateTime<Utc>) -> Emphasis {
    let age = now - entry.endpoint.last_seen();
    if age <= Duration::seconds(FRESH_SECS) {
        Emphasis::Bold
    } else if age > Duration::seconds(STALE_SECS) {
        Emphasis::Dim
    } else {
        Emphasis::Plain
    }
}

// Pad before styling, escape codes would throw the widths off.
fn paint(text: String, emphasis: Emphasis) -> String {
    match emphasis {
        Emphasis::Plain => text,
        Emphasis::Bold => text.bold().to_string(),
        Emphasis::Dim => text.dim().to_string(),
    }
}

fn elapsed_string(age: Duration) -> String {
    let total_seconds = age.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// The `wlan.show` output: directory table followed by recent events.
pub fn render_report(
    entries: Vec<WlanEndpoint>,
    key: SortKey,
    events: &[StatusMessage],
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let session_age = now - started_at;

    let (stations, clients): (Vec<_>, Vec<_>) =
        entries.iter().partition(|entry| entry.is_base_station());
    writeln!(
        output,
        "{:<10} {:>8} | Base stations: {:<4} Clients: {:<4}",
        "wlan.recon",
        elapsed_string(session_age),
        stations.len(),
        clients.len()
    )
    .ok();
    writeln!(output, "{}", "-".repeat(100)).ok();

    writeln!(
        output,
        "{:<17} {:<16} {:<24} {:<24} {:>4} {:>9}",
        "MAC", "ALIAS", "SSID", "Vendor", "CH", "Last Seen",
    )
    .ok();

    for entry in sorted(entries, key) {
        let address = paint(
            format!("{:<17}", entry.address().to_string()),
            address_emphasis(&entry, now, session_age),
        );
        let channel = match entry.channel {
            0 => "-".to_string(),
            channel => channel.to_string(),
        };
        let last_seen = paint(
            format!(
                "{:>9}",
                entry
                    .endpoint
                    .last_seen()
                    .with_timezone(&Local)
                    .format("%H:%M:%S")
                    .to_string()
            ),
            last_seen_emphasis(&entry, now),
        );

        writeln!(
            output,
            "{} {:<16.16} {:<24.24} {:<24.24} {:>4} {}",
            address,
            entry.endpoint.display_name(),
            entry.ssid(),
            entry.endpoint.vendor,
            channel,
            last_seen,
        )
        .ok();
    }

    if !events.is_empty() {
        writeln!(output).ok();
        let start = events.len().saturating_sub(RECENT_EVENTS);
        let lines = events[start..]
            .iter()
            .map(|message| {
                format!(
                    "{} [{}] {}",
                    message.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                    message.message_type,
                    message.content
                )
            })
            .join("\n");
        writeln!(output, "{}", lines).ok();
    }

    output
}
