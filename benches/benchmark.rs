use calsift::calendar::{
    import_ics, resolve_all, resolve_occurrences, AnalysisWindow, CalendarDay, EventOverride, Participants,
    RawEvent, RawParticipant,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

// Daily series with every 7th day excepted and every 5th day moved by an hour
fn daily_series() -> RawEvent {
    let start = utc(2021, 1, 1, 9);
    let mut event = RawEvent::new("Daily sync", start, start + Duration::minutes(15));
    event.recurrence_rule = Some("FREQ=DAILY".to_string());
    for day in 0..365 {
        let instance = start + Duration::days(day);
        if day % 7 == 3 {
            event.exception_dates.insert(CalendarDay::truncate(instance));
        } else if day % 5 == 0 {
            let moved = instance + Duration::hours(1);
            event.overrides.insert(
                CalendarDay::truncate(instance),
                EventOverride { subject: "Daily sync (moved)".into(), start: moved, end: moved + Duration::minutes(15) },
            );
        }
    }
    event.organizer = Some(RawParticipant::new("Ann", "mailto:ann@company1.com"));
    event.attendees = Some(Participants::Many(vec![
        RawParticipant::new("Ben", "mailto:ben@customer2.com"),
        RawParticipant::new("Me", "mailto:me@apple.com"),
    ]));
    event
}

fn generate_calendar(event_count: usize) -> String {
    let mut ics = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n");
    for i in 0..event_count {
        let rule = if i % 4 == 0 { "RRULE:FREQ=WEEKLY;BYDAY=MO,WE\r\n" } else { "" };
        ics.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:bench-{i}\r\nSUMMARY:Meeting {i}\r\nDTSTART:202103{:02}T{:02}0000Z\r\n\
             DURATION:PT45M\r\n{rule}ORGANIZER;CN=Org {i}:mailto:org{i}@company1.com\r\nEND:VEVENT\r\n",
            1 + i % 28,
            8 + i % 9,
        ));
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}

fn benchmark_series_expansion(c: &mut Criterion) {
    let event = daily_series();
    let mut group = c.benchmark_group("series_expansion");
    for months in [1u32, 3, 12] {
        let window = AnalysisWindow::new(utc(2021, 1, 1, 0), utc(2021, 1, 1, 0) + Duration::days(30 * months as i64))
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(months), &window, |b, window| {
            b.iter(|| resolve_occurrences(black_box(&event), window))
        });
    }
    group.finish();
}

fn benchmark_import_and_resolve(c: &mut Criterion) {
    let window = AnalysisWindow::new(utc(2021, 3, 1, 0), utc(2021, 7, 2, 0)).unwrap();
    let mut group = c.benchmark_group("import_and_resolve");
    for count in [50, 500] {
        let ics = generate_calendar(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &ics, |b, ics| {
            b.iter(|| {
                let events = import_ics(black_box(ics.as_bytes()), Tz::UTC).unwrap();
                resolve_all(&events, &window)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_series_expansion, benchmark_import_and_resolve);
criterion_main!(benches);
