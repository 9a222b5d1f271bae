//! Poll output formatting helpers.

use std::io::{self, Write};

use plenary_core::poll::{Poll, PollStatus};
use plenary_core::results::PollResults;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const BAR_WIDTH: usize = 20;

pub fn write_poll_table(w: &mut impl Write, polls: &[Poll]) -> io::Result<()> {
    if polls.is_empty() {
        return writeln!(w, "No active polls.");
    }
    writeln!(
        w,
        "{:<6} {:<8} {:<17} {:>6}  {}",
        "ID", "STATUS", "CLOSES", "VOTES", "TITLE"
    )?;
    for poll in polls {
        writeln!(
            w,
            "{:<6} {:<8} {:<17} {:>6}  {}",
            poll.id,
            status_str(poll.status),
            format_time(poll.closing_time),
            poll.total_votes,
            truncate(&poll.title, 50),
        )?;
    }
    writeln!(w, "\n{} poll(s)", polls.len())
}

pub fn write_poll_detail(w: &mut impl Write, poll: &Poll, now: OffsetDateTime) -> io::Result<()> {
    writeln!(w, "  Poll:     #{}", poll.id)?;
    writeln!(w, "  Title:    {}", poll.title)?;
    writeln!(w, "  Status:   {}", status_str(poll.status))?;
    writeln!(w, "  Closes:   {}", format_time(poll.closing_time))?;
    if poll.status == PollStatus::Active && !poll.is_open_at(now) {
        writeln!(w, "  Note:     closing time has passed")?;
    }
    if let Some(description) = poll.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(w, "  About:    {description}")?;
    }
    if let Some(url) = &poll.attachment_url {
        writeln!(w, "  Attached: {url}")?;
    }
    Ok(())
}

/// Tallies with a proportional bar per alternative; leaders are starred.
pub fn write_results(w: &mut impl Write, results: &PollResults) -> io::Result<()> {
    if results.alternatives.is_empty() {
        return writeln!(w, "  (no alternatives)");
    }
    for alt in &results.alternatives {
        let marker = if alt.leading { '*' } else { ' ' };
        writeln!(
            w,
            "  {marker} [{:>4}] {:<30} {} {:>5.1}% ({})",
            alt.id,
            truncate(&alt.text, 30),
            result_bar(alt.percentage, BAR_WIDTH),
            alt.percentage,
            alt.votes,
        )?;
    }
    writeln!(w, "  Total votes: {}", results.total_votes)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn result_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

pub const fn status_str(status: PollStatus) -> &'static str {
    match status {
        PollStatus::Active => "active",
        PollStatus::Closed => "closed",
        PollStatus::Draft => "draft",
    }
}

/// `YYYY-MM-DD HH:MM UTC`.
pub fn format_time(t: OffsetDateTime) -> String {
    let utc = t.to_offset(UtcOffset::UTC);
    utc.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .unwrap_or_else(|_| utc.to_string())
}

pub fn truncate(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max - 1).collect::<String>())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use plenary_core::poll::Alternative;
    use plenary_core::results::compute_results;
    use time::macros::datetime;

    fn poll() -> Poll {
        Poll {
            id: 21,
            title: "Extend library opening hours".into(),
            description: Some("Weekend opening pilot".into()),
            closing_time: datetime!(2026-11-30 18:00 -3),
            status: PollStatus::Active,
            attachment_url: None,
            alternatives: vec![
                Alternative {
                    id: 1,
                    text: "Saturdays".into(),
                    vote_count: 6,
                },
                Alternative {
                    id: 2,
                    text: "Sundays".into(),
                    vote_count: 2,
                },
            ],
            total_votes: 8,
            created_at: None,
            updated_at: None,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn closing_time_is_shown_in_utc() {
        assert_eq!(format_time(datetime!(2026-11-30 18:00 -3)), "2026-11-30 21:00 UTC");
    }

    #[test]
    fn bar_is_proportional() {
        assert_eq!(result_bar(0.0, 4), "....");
        assert_eq!(result_bar(50.0, 4), "##..");
        assert_eq!(result_bar(100.0, 4), "####");
        assert_eq!(result_bar(250.0, 4), "####");
    }

    #[test]
    fn truncate_long_titles() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn table_lists_each_poll() {
        let text = render(|w| write_poll_table(w, &[poll()]));
        assert!(text.contains("TITLE"));
        assert!(text.contains("Extend library opening hours"));
        assert!(text.contains("2026-11-30 21:00 UTC"));
        assert!(text.contains("1 poll(s)"));
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(render(|w| write_poll_table(w, &[])), "No active polls.\n");
    }

    #[test]
    fn detail_flags_passed_closing_time() {
        let text = render(|w| write_poll_detail(w, &poll(), datetime!(2026-12-01 00:00 UTC)));
        assert!(text.contains("closing time has passed"));
        assert!(text.contains("Weekend opening pilot"));
    }

    #[test]
    fn results_star_the_leader() {
        let text = render(|w| write_results(w, &compute_results(&poll())));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("  * "), "{text}");
        assert!(lines[0].contains("75.0%"));
        assert!(lines[1].starts_with("    "));
        assert!(lines[2].contains("Total votes: 8"));
    }
}
