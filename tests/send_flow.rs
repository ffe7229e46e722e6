use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use eframe_sketchpad::config::GalleryConfig;
use eframe_sketchpad::export::PngDataUrl;
use eframe_sketchpad::gallery::{CompositionId, GalleryStore};
use eframe_sketchpad::runtime::{self, TaskFuture};
use eframe_sketchpad::send::{
    Notice, SENT_MESSAGE, SendError, SendFlow, SendGateway, SendRequest, SendStep,
};
use eframe_sketchpad::storage::MemoryStore;
use parking_lot::Mutex;

/// Records requests and answers with a fixed outcome.
struct ScriptedGateway {
    calls: AtomicUsize,
    last: Mutex<Option<SendRequest>>,
    outcome: Result<(), SendError>,
}

impl ScriptedGateway {
    fn new(outcome: Result<(), SendError>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            outcome,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SendGateway for ScriptedGateway {
    fn send(&self, request: SendRequest) -> TaskFuture<Result<(), SendError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(request);
        let outcome = self.outcome.clone();
        runtime::boxed(async move { outcome })
    }
}

fn gallery_with_two_selected() -> (GalleryStore, [CompositionId; 2]) {
    let mut gallery = GalleryStore::load(Box::new(MemoryStore::new()), GalleryConfig::default());
    let a = gallery.save_at(PngDataUrl::from_png_bytes(b"\x89PNGa"), 1);
    let b = gallery.save_at(PngDataUrl::from_png_bytes(b"\x89PNGb"), 2);
    gallery.save_at(PngDataUrl::from_png_bytes(b"\x89PNGc"), 3);
    gallery.toggle_select(a);
    gallery.toggle_select(b);
    (gallery, [a, b])
}

fn dispatch(flow: &mut SendFlow, gallery: &GalleryStore, gateway: &ScriptedGateway) {
    match flow.submit(gallery, gateway) {
        Ok(SendStep::Dispatched(task)) => futures::executor::block_on(task),
        other => panic!("expected a dispatched send, got {other:?}"),
    }
}

#[test]
fn test_scenario_c_invalid_email_never_reaches_gateway() {
    let (gallery, selected) = gallery_with_two_selected();
    let gateway = ScriptedGateway::new(Ok(()));
    let mut flow = SendFlow::new();

    assert!(matches!(flow.submit(&gallery, gateway.as_ref()), Ok(SendStep::EmailRequested)));
    assert!(flow.is_entering_email());

    flow.email = "not-an-email".to_owned();
    let result = flow.submit(&gallery, gateway.as_ref());
    assert!(matches!(result, Err(SendError::InvalidEmail)));

    assert_eq!(gateway.calls(), 0);
    assert!(matches!(
        flow.notice(),
        Some(Notice::Error(text)) if text == "Please enter a valid email."
    ));
    assert_eq!(gallery.selection().len(), 2);
    assert!(selected.iter().all(|id| gallery.is_selected(*id)));
}

#[test]
fn test_empty_selection_is_rejected() {
    let gallery = GalleryStore::load(Box::new(MemoryStore::new()), GalleryConfig::default());
    let gateway = ScriptedGateway::new(Ok(()));
    let mut flow = SendFlow::new();
    assert!(matches!(
        flow.submit(&gallery, gateway.as_ref()),
        Err(SendError::EmptySelection)
    ));
    assert_eq!(gateway.calls(), 0);
}

#[test]
fn test_successful_send_clears_selection() {
    let (mut gallery, _) = gallery_with_two_selected();
    let gateway = ScriptedGateway::new(Ok(()));
    let mut flow = SendFlow::new();
    flow.submit(&gallery, gateway.as_ref()).unwrap();
    flow.email = "  visitor@example.com ".to_owned();

    dispatch(&mut flow, &gallery, &gateway);
    assert_eq!(gateway.calls(), 1);
    let request = gateway.last.lock().take().unwrap();
    assert_eq!(request.images, gallery.selected_images());

    assert_eq!(flow.poll(&mut gallery), Some(Ok(())));
    assert!(gallery.selection().is_empty());
    assert!(!flow.is_entering_email());
    assert!(!flow.in_flight());
    assert!(matches!(flow.notice(), Some(Notice::Info(text)) if text == SENT_MESSAGE));
}

#[test]
fn test_failed_send_keeps_selection() {
    let (mut gallery, _) = gallery_with_two_selected();
    let gateway = ScriptedGateway::new(Err(SendError::Status(502)));
    let mut flow = SendFlow::new();
    flow.submit(&gallery, gateway.as_ref()).unwrap();
    flow.email = "visitor@example.com".to_owned();

    dispatch(&mut flow, &gallery, &gateway);
    assert_eq!(flow.poll(&mut gallery), Some(Err(SendError::Status(502))));
    assert_eq!(gallery.selection().len(), 2);
    assert!(flow.is_entering_email());
    assert!(matches!(
        flow.notice(),
        Some(Notice::Error(text)) if text == "Failed to send. Please try again later."
    ));
}

#[test]
fn test_second_submit_while_in_flight_is_refused() {
    let (gallery, _) = gallery_with_two_selected();
    let gateway = ScriptedGateway::new(Ok(()));
    let mut flow = SendFlow::new();
    flow.submit(&gallery, gateway.as_ref()).unwrap();
    flow.email = "visitor@example.com".to_owned();

    let pending = flow.submit(&gallery, gateway.as_ref()).unwrap();
    assert!(flow.in_flight());
    assert_eq!(flow.button_label(), "Sending…");
    assert!(matches!(flow.submit(&gallery, gateway.as_ref()), Err(SendError::InFlight)));
    assert_eq!(gateway.calls(), 1);
    drop(pending);
}
