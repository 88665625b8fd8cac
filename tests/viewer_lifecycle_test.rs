use std::sync::Arc;
use std::time::Duration;

use scrollfolio::document::{DocumentRef, DocumentSource, MemorySource, PageSizes};
use scrollfolio::event_source::HostEvent;
use scrollfolio::layout::{Align, LayoutConfig, PageMeta};
use scrollfolio::test_utils::test_helpers::{
    ManifestBuilder, RecordingRenderer, attach_and_settle, drain, play, play_script,
    render_and_measure, viewer_with, wait_until_settled,
};
use scrollfolio::viewer::{LoadState, Viewer, ViewerEvent};
use scrollfolio::{DocumentLoadError, NavigationError, PageMetadataError};

const SLOT: f64 = 792.0 + 72.0;

#[test]
fn test_default_document_window() {
    let mut viewer = viewer_with(ManifestBuilder::letter(10).build());
    attach_and_settle(&mut viewer);

    assert_eq!(viewer.load_state(), &LoadState::Ready);
    assert_eq!(viewer.visible_window().indices(), vec![0, 1, 2, 3, 4]);
    assert_eq!(viewer.visible_window().total_size, 10.0 * SLOT);
    assert_eq!(viewer.current_page(), 1);
}

#[test]
fn test_window_is_available_before_page_sizes_arrive() {
    let manifest = ManifestBuilder::uniform(10, 400.0, 400.0).latency(30).build();
    let mut viewer = viewer_with(manifest);
    viewer.attach("doc");

    // Page count arrives before the first page size
    let mut spins = 0;
    while viewer.load_state() != &LoadState::Ready && spins < 500 {
        viewer.poll();
        std::thread::sleep(Duration::from_millis(1));
        spins += 1;
    }
    assert_eq!(viewer.load_state(), &LoadState::Ready);
    assert_eq!(viewer.page_count(), 10);
    assert!(!viewer.visible_window().is_empty());
    assert!(viewer.scroll_to_page(10).is_ok());

    wait_until_settled(&mut viewer);
    assert_eq!(viewer.metadata().known_count(), 10);
    assert_eq!(viewer.visible_window().total_size, 10.0 * (400.0 + 72.0));
}

#[test]
fn test_zoom_rescales_layout() {
    let mut viewer = viewer_with(ManifestBuilder::letter(10).build());
    attach_and_settle(&mut viewer);
    let before = viewer.offset_of(9).unwrap();

    viewer.set_zoom(1.5);

    let after = viewer.offset_of(9).unwrap();
    assert_eq!(before, 9.0 * SLOT);
    assert_eq!(after, 9.0 * (792.0 * 1.5 + 72.0));
    assert_eq!(viewer.zoom_percent(), 150);
    assert_eq!(viewer.render_targets()[0].target_width, 612.0 * 1.5);
}

#[test]
fn test_page_failure_keeps_document_ready() {
    let manifest = ManifestBuilder::uniform(10, 500.0, 700.0)
        .failing(3, "xref table damaged")
        .build();
    let mut viewer = viewer_with(manifest);
    let events = viewer.subscribe();
    attach_and_settle(&mut viewer);

    assert_eq!(viewer.load_state(), &LoadState::Ready);
    assert_eq!(viewer.metadata().get(3), PageMeta::new(612.0, 792.0));
    assert_eq!(viewer.metadata().failed_pages(), vec![3]);

    let events = drain(&events);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ViewerEvent::LoadStateChanged(LoadState::Failed(_)))));
    assert!(events.contains(&ViewerEvent::MetadataComplete {
        known: 9,
        failed: 1
    }));
}

#[test]
fn test_out_of_range_navigation_leaves_viewport_alone() {
    let mut viewer = viewer_with(ManifestBuilder::letter(10).build());
    attach_and_settle(&mut viewer);
    viewer.on_scroll(1234.0);
    let before = viewer.viewport();
    let window_before = viewer.visible_window().clone();

    assert_eq!(
        viewer.scroll_to_index(15, Align::Start),
        Err(NavigationError::OutOfRange {
            index: 15,
            count: 10
        })
    );
    assert!(matches!(
        viewer.scroll_to_page(16),
        Err(NavigationError::OutOfRange { index: 15, .. })
    ));
    assert_eq!(viewer.viewport(), before);
    assert_eq!(viewer.visible_window(), &window_before);
}

#[test]
fn test_navigation_on_empty_document() {
    let mut viewer = viewer_with(ManifestBuilder::letter(0).build());
    attach_and_settle(&mut viewer);

    assert_eq!(viewer.load_state(), &LoadState::Ready);
    assert!(viewer.visible_window().is_empty());
    assert_eq!(viewer.scroll_to_page(1), Err(NavigationError::EmptyDocument));
}

#[test]
fn test_reattach_discards_previous_walk() {
    let slow = ManifestBuilder::uniform(50, 300.0, 300.0).latency(10).build();
    let fast = ManifestBuilder::uniform(3, 612.0, 1000.0).build();
    let source = MemorySource::new()
        .with_document("slow", slow)
        .with_document("fast", fast);
    let mut viewer = Viewer::new(Arc::new(source), LayoutConfig::default());
    viewer.set_viewport_size(960.0, 800.0);

    viewer.attach("slow");
    std::thread::sleep(Duration::from_millis(30));
    viewer.attach("fast");
    wait_until_settled(&mut viewer);

    // Give any straggler from the first walk time to arrive
    std::thread::sleep(Duration::from_millis(30));
    viewer.poll();

    assert_eq!(viewer.page_count(), 3);
    assert_eq!(viewer.metadata().known_count(), 3);
    assert_eq!(viewer.metadata().get(0), PageMeta::new(612.0, 1000.0));
}

#[test]
fn test_detach_cancels_and_goes_idle() {
    let manifest = ManifestBuilder::letter(40).latency(10).build();
    let mut viewer = viewer_with(manifest);
    let events = viewer.subscribe();

    viewer.attach("doc");
    std::thread::sleep(Duration::from_millis(25));
    viewer.detach();
    std::thread::sleep(Duration::from_millis(25));
    assert_eq!(viewer.poll(), 0);

    assert_eq!(viewer.load_state(), &LoadState::Idle);
    assert_eq!(viewer.page_count(), 0);
    assert!(viewer.visible_window().is_empty());

    let states: Vec<LoadState> = drain(&events)
        .into_iter()
        .filter_map(|e| match e {
            ViewerEvent::LoadStateChanged(state) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(states.first(), Some(&LoadState::Loading));
    assert_eq!(states.last(), Some(&LoadState::Idle));
}

#[test]
fn test_failed_document_shows_no_window() {
    let source = MemorySource::new();
    let mut viewer = Viewer::new(Arc::new(source), LayoutConfig::default());
    viewer.attach("missing.yaml");
    wait_until_settled(&mut viewer);

    match viewer.load_state() {
        LoadState::Failed(message) => assert!(message.contains("missing.yaml")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(viewer.visible_window().is_empty());
    assert_eq!(viewer.current_page(), 0);
}

#[test]
fn test_measurements_correct_estimates() {
    let mut viewer = viewer_with(ManifestBuilder::letter(20).build());
    attach_and_settle(&mut viewer);

    let mut renderer = RecordingRenderer::with_slot_height(500.0);
    render_and_measure(&mut viewer, &mut renderer);
    assert_eq!(renderer.indices(), vec![0, 1, 2, 3, 4]);

    // Shorter slots pull more pages into the window
    assert!(viewer.visible_window().last_index > 4);
    assert_eq!(viewer.offset_of(5), Some(5.0 * 500.0));
    assert!(viewer.render_targets()[..5].iter().all(|t| t.measured));
}

#[test]
fn test_scripted_session() {
    let mut viewer = viewer_with(ManifestBuilder::letter(30).build());
    let events = viewer.subscribe();

    let requests = play(
        &mut viewer,
        vec![
            HostEvent::Attach("doc".into()),
            HostEvent::Resize {
                width: 1280.0,
                height: 720.0,
            },
            HostEvent::GoToPage(12),
            HostEvent::Zoom(0.75),
        ],
    );

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].index, 11);
    assert_eq!(viewer.zoom_percent(), 75);
    assert!(drain(&events)
        .iter()
        .any(|e| matches!(e, ViewerEvent::ScrollRequested(r) if r.index == 11)));

    // Offset stays at page 12's old start; at 75% slots are 594 + 72 tall
    assert_eq!(viewer.viewport().scroll_offset, 11.0 * SLOT);
    assert_eq!(viewer.current_page(), 15);
}

#[test]
fn test_yaml_scripted_session() {
    let mut viewer = viewer_with(ManifestBuilder::letter(30).build());

    let requests = play_script(
        &mut viewer,
        r#"
- attach: doc
- resize: { width: 1280, height: 720 }
- go_to_page: 12
- zoom: 0.75
- measured: { index: 0, height: 500 }
- go_to_page: 31
"#,
    );

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].index, 11);
    assert_eq!(viewer.zoom_percent(), 75);
    assert_eq!(viewer.slot_size(0), Some(500.0));
    assert_eq!(viewer.current_page(), 15);
}

/// Pages of this source panic when asked for page 3
struct CrashingPages;

impl PageSizes for CrashingPages {
    fn page_count(&self) -> usize {
        5
    }

    fn page_size(&mut self, index: usize) -> Result<PageMeta, PageMetadataError> {
        if index == 3 {
            panic!("renderer crashed on page {index}");
        }
        Ok(PageMeta::new(500.0, 500.0))
    }
}

struct CrashingSource;

impl DocumentSource for CrashingSource {
    fn open(&self, _document: &DocumentRef) -> Result<Box<dyn PageSizes>, DocumentLoadError> {
        Ok(Box::new(CrashingPages))
    }
}

#[test]
fn test_panicking_page_does_not_stall_load() {
    let mut viewer = Viewer::new(Arc::new(CrashingSource), LayoutConfig::default());
    viewer.set_viewport_size(960.0, 800.0);
    viewer.attach("doc");
    wait_until_settled(&mut viewer);

    assert_eq!(viewer.load_state(), &LoadState::Ready);
    assert_eq!(viewer.metadata().known_count(), 4);
    assert_eq!(viewer.metadata().failed_pages(), vec![3]);
    assert_eq!(viewer.metadata().get(4), PageMeta::new(500.0, 500.0));
}

#[test]
fn test_loading_until_document_opens() {
    let source = MemorySource::new()
        .with_document("doc", ManifestBuilder::letter(4).build())
        .with_open_latency(Duration::from_millis(50));
    let mut viewer = Viewer::new(Arc::new(source), LayoutConfig::default());
    viewer.set_viewport_size(960.0, 800.0);

    viewer.attach("doc");
    viewer.poll();
    assert_eq!(viewer.load_state(), &LoadState::Loading);
    assert!(viewer.visible_window().is_empty());

    wait_until_settled(&mut viewer);
    assert_eq!(viewer.load_state(), &LoadState::Ready);
    assert_eq!(viewer.page_count(), 4);
}

#[test]
fn test_mixed_page_sizes_stack_in_order() {
    let manifest = ManifestBuilder::letter(5)
        .page(1, 612.0, 1584.0)
        .page(3, 1824.0, 912.0)
        .build();
    let mut viewer = viewer_with(manifest);
    attach_and_settle(&mut viewer);

    // Page 4 is wider than the 912px column and shrinks to fit it
    assert_eq!(viewer.slot_size(1), Some(1584.0 + 72.0));
    assert_eq!(viewer.slot_size(3), Some(456.0 + 72.0));
    assert_eq!(viewer.offset_of(4), Some(2.0 * SLOT + 1656.0 + 528.0));
}
