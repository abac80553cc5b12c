//! Plain-text rendering of query views.

use miet_core::{DayView, LessonView, TodayView, WeekView};

fn header(out: &mut String, label_view: &str, label_now: &str, index: usize, cycle: usize, number: i64) {
    out.push_str(label_view);
    if cycle > 1 {
        out.push_str(&format!(" ({}/{cycle})", index + 1));
    }
    out.push_str(&format!(" · учебная неделя {number}"));
    if !label_now.is_empty() && label_now != label_view {
        out.push_str(&format!(" · сейчас: {label_now}"));
    }
    out.push('\n');
}

fn lesson_line(out: &mut String, l: &LessonView) {
    let time = l.time.replace('\n', "–");
    out.push_str(&format!("  {:>2}  {:<11}  {}", l.lesson, time, l.subject));
    if !l.lesson_type.is_empty() {
        out.push_str(&format!(" [{}]", l.lesson_type));
    }
    if !l.room.is_empty() {
        out.push_str(&format!("  {}", l.room));
    }
    if !l.teacher.is_empty() {
        out.push_str(&format!("  {}", l.teacher));
    }
    out.push('\n');
}

fn day_block(out: &mut String, day: &DayView) {
    out.push_str(&day.label);
    out.push('\n');
    if day.lessons.is_empty() {
        out.push_str("  пар нет\n");
    }
    for l in &day.lessons {
        lesson_line(out, l);
    }
}

pub fn today_text(view: &TodayView) -> String {
    let mut out = String::new();
    header(
        &mut out,
        &view.week_label_view,
        &view.week_label_now,
        view.week_index,
        view.week_cycle,
        view.week_number,
    );
    out.push('\n');
    day_block(
        &mut out,
        &DayView { label: view.today_label.clone(), lessons: view.lessons.clone() },
    );
    out
}

pub fn week_text(view: &WeekView) -> String {
    let mut out = String::new();
    header(
        &mut out,
        &view.week_label_view,
        &view.week_label_now,
        view.week_index,
        view.week_cycle,
        view.week_number,
    );
    for day in &view.days {
        out.push('\n');
        day_block(&mut out, day);
    }
    out
}
