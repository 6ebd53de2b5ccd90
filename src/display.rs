//! Text cards for courses and extraction errors

use crate::course::CourseRecord;
use crate::utils::{truncate_str, wrap_text};
use std::fmt::{Display, Write};
use tracing::{error, info};

const CARD_WIDTH: usize = 80;
const CONTENT_WIDTH: usize = CARD_WIDTH - 2;
const DESCRIPTION_WIDTH: usize = 400;

/// Card rows in display order, as (label, record key)
const CARD_FIELDS: [(&str, &str); 7] = [
    ("University", "university"),
    ("Degree Type", "degree_type"),
    ("Level", "level"),
    ("Duration", "duration"),
    ("Fees", "fees"),
    ("Intake Date", "intake_date"),
    ("Requirements", "requirements"),
];

fn create_separator(width: usize, ch: char) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// Text card for one course, shown in the order a reader scans a course page
pub fn render_course_card(course: &CourseRecord, index: usize) -> String {
    let horizontal_line = create_separator(CARD_WIDTH - 2, '═');
    let mut card = String::new();

    let _ = writeln!(card, "╔{horizontal_line}╗");
    let _ = writeln!(
        card,
        " #{} 🎓 {}",
        index + 1,
        wrap_text(course.display_name(), CONTENT_WIDTH - 8, "      ")
    );

    for (label, key) in CARD_FIELDS {
        if let Some(value) = course.field(key) {
            let _ = writeln!(
                card,
                " {label}: {}",
                wrap_text(value, CONTENT_WIDTH - label.len() - 3, "   ")
            );
        }
    }

    if let Some(description) = &course.description {
        let short = truncate_str(description.trim(), DESCRIPTION_WIDTH);
        let _ = writeln!(
            card,
            " Description: {}",
            wrap_text(&short, CONTENT_WIDTH - 14, "   ")
        );
    }

    let _ = writeln!(card, " Source: {}", course.source_url);
    let _ = write!(card, "╚{horizontal_line}╝");
    card
}

pub fn log_course_card(course: &CourseRecord, index: usize) {
    info!("\n{}", render_course_card(course, index));
}

pub fn log_error_card<E: Display + std::error::Error>(url: &str, error: &E) {
    const CARD_WIDTH: usize = 70;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 10;

    let top_bottom = create_separator(CARD_WIDTH - 2, '═');
    let middle = create_separator(CARD_WIDTH - 2, '─');

    let mut error_details = error.to_string();
    if let Some(source) = error.source() {
        error_details = format!("{error_details} (cause: {source})");
    }

    error!(
        "\n╔═{}═╗\n\
         ║ URL:   {:<width$} ║\n\
         ║{}║\n\
         ║ Error: {:<width$} ║\n\
         ╚═{}═╝",
        top_bottom,
        truncate_str(url, CONTENT_WIDTH),
        middle,
        truncate_str(&error_details, CONTENT_WIDTH),
        top_bottom,
        width = CONTENT_WIDTH
    );
}
