use course_extractor::{
    collect_courses, extract_all_courses, load_json, CourseExtractor, ExtractionEvent,
    LogLevelGuard, MockService, PipelineConfig, StatusMessage,
};
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const LIVERPOOL: &str = "https://www.liverpool.ac.uk/courses/accounting-and-finance-bsc-hons";
const LEEDS: &str = "https://www.leedsbeckett.ac.uk/courses/accounting-finance-ba";
const BRIGHTON: &str = "https://www.brighton.ac.uk/courses/study/secondary-biology-pgce.aspx";

fn extractor(service: &MockService) -> CourseExtractor {
    CourseExtractor::new(Arc::new(service.clone()))
}

fn statuses(events: &[ExtractionEvent]) -> Vec<&StatusMessage> {
    events.iter().filter_map(ExtractionEvent::as_status).collect()
}

#[tokio::test(start_paused = true)]
async fn test_successful_extraction_tags_source_url() {
    let service = MockService::new().with_response(
        LIVERPOOL,
        json!({
            "course_name": "Accounting and Finance BSc (Hons)",
            "level": "Undergraduate",
            "duration": "3 years"
        }),
    );

    let events: Vec<_> = extractor(&service)
        .extract_courses([LIVERPOOL])
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        ExtractionEvent::Status(StatusMessage::Started {
            index: 1,
            total: 1,
            url: LIVERPOOL.to_string(),
        })
    );
    let course = events[1].as_course().unwrap();
    assert_eq!(course.source_url, LIVERPOOL);
    assert_eq!(course.duration.as_deref(), Some("3 years"));
    assert_eq!(
        events[2],
        ExtractionEvent::Status(StatusMessage::Completed {
            url: LIVERPOOL.to_string(),
            records: 1,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_array_payload_yields_one_record_per_object() {
    let service = MockService::new().with_response(
        BRIGHTON,
        json!([
            {"course_name": "Secondary Biology PGCE"},
            "stray text",
            {"course_name": "Secondary Physics with Mathematics PGCE"}
        ]),
    );

    let events: Vec<_> = extractor(&service)
        .extract_courses([BRIGHTON])
        .collect()
        .await;
    let courses: Vec<_> = events.iter().filter_map(ExtractionEvent::as_course).collect();

    assert_eq!(courses.len(), 2);
    assert!(courses.iter().all(|c| c.source_url == BRIGHTON));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_yields_message_and_no_record() {
    let service = MockService::new()
        .with_response(LIVERPOOL, json!({"course_name": "Slow Course"}))
        .with_delay(LIVERPOOL, Duration::from_secs(120))
        .with_response(LEEDS, json!({"course_name": "Accounting and Finance BA"}));

    let events: Vec<_> = extractor(&service)
        .extract_courses([LIVERPOOL, LEEDS])
        .collect()
        .await;

    assert_eq!(
        events[1],
        ExtractionEvent::Status(StatusMessage::TimedOut {
            url: LIVERPOOL.to_string(),
            limit: Duration::from_secs(60),
        })
    );
    assert_eq!(
        events[1].to_string(),
        format!("⏰ Timeout extracting {LIVERPOOL} (60s limit)")
    );

    let names: Vec<_> = events
        .iter()
        .filter_map(ExtractionEvent::as_course)
        .map(|c| c.display_name().to_string())
        .collect();
    assert_eq!(names, vec!["Accounting and Finance BA"]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_timeout() {
    let service = MockService::new()
        .with_response(LIVERPOOL, json!({"course_name": "A"}))
        .with_delay(LIVERPOOL, Duration::from_secs(10));
    let extractor = CourseExtractor::with_config(
        Arc::new(service),
        PipelineConfig {
            timeout: Duration::from_secs(5),
            throttle: Duration::ZERO,
        },
    );

    let events: Vec<_> = extractor.extract_courses([LIVERPOOL]).collect().await;

    assert!(matches!(
        events.last(),
        Some(ExtractionEvent::Status(StatusMessage::TimedOut { .. }))
    ));
    assert!(events.iter().all(|e| e.as_course().is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_errors_and_empty_results_do_not_stop_the_stream() {
    let _guard = LogLevelGuard::set_level("debug");
    let service = MockService::new()
        .with_error(LIVERPOOL, "Insufficient credits")
        .with_empty(LEEDS)
        .with_response(BRIGHTON, json!({"course_name": "Secondary Biology PGCE"}));

    let events: Vec<_> = extractor(&service)
        .extract_courses([LIVERPOOL, LEEDS, BRIGHTON])
        .collect()
        .await;
    let statuses = statuses(&events);

    let started = statuses
        .iter()
        .filter(|s| matches!(s, StatusMessage::Started { .. }))
        .count();
    assert_eq!(started, 3);

    assert!(matches!(statuses[1], StatusMessage::Failed { error, .. } if error.contains("Insufficient credits")));
    assert_eq!(
        statuses[3],
        &StatusMessage::NoData {
            url: LEEDS.to_string()
        }
    );
    assert_eq!(events.iter().filter_map(ExtractionEvent::as_course).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_payload_without_objects_is_no_data() {
    let service = MockService::new().with_response(LEEDS, json!(["just", "strings"]));

    let events: Vec<_> = extractor(&service).extract_courses([LEEDS]).collect().await;

    assert_eq!(
        events.last(),
        Some(&ExtractionEvent::Status(StatusMessage::NoData {
            url: LEEDS.to_string()
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_throttle_between_urls_only() {
    let service = MockService::new();
    let start = Instant::now();

    let events: Vec<_> = extractor(&service)
        .extract_courses([LIVERPOOL, LEEDS, BRIGHTON])
        .collect()
        .await;

    let elapsed = start.elapsed();
    assert_eq!(events.len(), 6);
    assert!(elapsed >= Duration::from_secs(6), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(9), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_stream_is_lazy_and_sequential() {
    let service = MockService::new()
        .with_response(LIVERPOOL, json!({"course_name": "A"}))
        .with_response(LEEDS, json!({"course_name": "B"}));

    let mut events = extractor(&service).extract_courses([LIVERPOOL, LEEDS]);
    assert!(service.requests().is_empty());

    // Started, Course, Completed for the first URL
    for _ in 0..3 {
        events.next().await;
    }
    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].urls, vec![LIVERPOOL.to_string()]);

    while events.next().await.is_some() {}
    assert_eq!(service.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_collect_courses_deduplicates_by_name() {
    let service = MockService::new()
        .with_response(LIVERPOOL, json!({"course_name": "Accounting and Finance"}))
        .with_response(LEEDS, json!({"course_name": "  ACCOUNTING AND FINANCE "}))
        .with_response(BRIGHTON, json!([{"level": "PGCE"}, {"course_name": "Biology PGCE"}]));

    let mut seen_events = 0;
    let summary = collect_courses(
        extractor(&service).extract_courses([LIVERPOOL, LEEDS, BRIGHTON]),
        |_, _| seen_events += 1,
    )
    .await;

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(summary.courses.len(), 2);
    assert_eq!(summary.courses.records()[0].source_url, LIVERPOOL);
    assert_eq!(seen_events, 10);
    assert_eq!(summary.messages.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_collection_grows_as_unique_courses_arrive() {
    let service = MockService::new()
        .with_response(LIVERPOOL, json!({"course_name": "Accounting and Finance"}))
        .with_response(LEEDS, json!({"course_name": "accounting and finance"}))
        .with_response(BRIGHTON, json!({"course_name": "Biology PGCE"}));

    let mut sizes = Vec::new();
    collect_courses(
        extractor(&service).extract_courses([LIVERPOOL, LEEDS, BRIGHTON]),
        |event, courses| {
            if let Some(course) = event.as_course() {
                let newest = courses.records().last().map(|c| c.source_url.clone());
                sizes.push((course.source_url.clone(), courses.len(), newest));
            }
        },
    )
    .await;

    assert_eq!(
        sizes,
        vec![
            (LIVERPOOL.to_string(), 1, Some(LIVERPOOL.to_string())),
            (LEEDS.to_string(), 1, Some(LIVERPOOL.to_string())),
            (BRIGHTON.to_string(), 2, Some(BRIGHTON.to_string())),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_extract_all_courses_writes_unique_courses() {
    let service = MockService::new()
        .with_response(LIVERPOOL, json!({"course_name": "Aerospace Engineering BEng"}))
        .with_response(LEEDS, json!({"course_name": "aerospace engineering beng"}));
    let path = std::env::temp_dir().join(format!(
        "course-extractor-batch-{}.json",
        std::process::id()
    ));

    let courses = extract_all_courses(&extractor(&service), [LIVERPOOL, LEEDS], &path)
        .await
        .unwrap();

    assert_eq!(courses.len(), 1);
    assert_eq!(load_json(&path).unwrap(), courses);
    let _ = std::fs::remove_file(&path);
}
