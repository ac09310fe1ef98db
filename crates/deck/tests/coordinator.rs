//! Coordinator lifecycle and render loop against the mock surface, on a
//! paused clock so render ticks are deterministic.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{key_frame, solid, Call, Recorder, BLACK, BLUE, GREEN, RED};
use deck::{
    prepare_session, Coordinator, CoordinatorConfig, CoordinatorError, HandlerErrorPolicy,
    Resources,
};
use image::RgbaImage;
use surface::mocks::{MockEventHandle, MockEvents, MockSurface, Push};
use surface::{config, DeviceError, KeyId, SurfaceEvent};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type Run = JoinHandle<(Coordinator<MockSurface>, Result<(), CoordinatorError>)>;

/// Start `coordinator` on a background task; returns the event injector.
fn spawn(mut coordinator: Coordinator<MockSurface>, token: &CancellationToken) -> (Run, MockEventHandle) {
    let events = MockEvents::new();
    let handle = events.handle();
    let token = token.clone();
    let run = tokio::spawn(async move {
        let result = coordinator.start(events, &token).await;
        (coordinator, result)
    });
    (run, handle)
}

async fn tick() {
    tokio::time::sleep(Duration::from_millis(500)).await;
}

fn key_pushes(pushes: &[Push]) -> Vec<(KeyId, RgbaImage)> {
    pushes
        .iter()
        .filter_map(|p| match p {
            Push::Key(k, img) => Some((*k, img.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn renders_immediately_then_every_interval() {
    let device = Arc::new(MockSurface::new());
    let a = Recorder::new("a").arc();
    a.show_key(KeyId::Key1, key_frame(RED));
    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(a.clone(), Resources::new().keys([KeyId::Key1]));

    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(key_pushes(&device.pushes()).len(), 1, "initial render");
    tick().await;
    assert_eq!(key_pushes(&device.pushes()).len(), 2, "one more tick after 500 ms");

    token.cancel();
    let (mut coordinator, result) = run.await.unwrap();
    assert!(result.is_ok());
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn overlay_dismissal_clears_all_keys_first() {
    let device = Arc::new(MockSurface::new());
    let owner = Recorder::new("owner").arc();
    owner.show_key(KeyId::Key2, key_frame(RED));
    let overlay = Recorder::new("overlay").with_overlay().arc();
    overlay.show_overlay_key(KeyId::Key7, key_frame(GREEN));
    overlay.set_overlay_active(true);

    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(owner.clone(), Resources::new().keys([KeyId::Key2]));
    coordinator.register_module(overlay.clone(), Resources::new());
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);

    tokio::time::sleep(Duration::from_millis(250)).await;
    // Overlay tick: only the overlay's key, the owner is not rendered.
    let first = key_pushes(&device.take_pushes());
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].0, KeyId::Key7);
    assert!(!owner.calls().contains(&Call::RenderKeys));

    overlay.set_overlay_active(false);
    tick().await;
    let second = key_pushes(&device.take_pushes());
    let blank = RgbaImage::from_pixel(120, 120, BLACK);
    assert_eq!(second.len(), 9);
    for (i, (key, img)) in second.iter().take(8).enumerate() {
        assert_eq!(*key, KeyId::ALL[i]);
        assert_eq!(img, &blank);
    }
    assert_eq!(second[8].0, KeyId::Key2);

    // The clear happens once per dismissal, not on every tick.
    tick().await;
    assert_eq!(key_pushes(&device.take_pushes()).len(), 1);

    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn overlay_strip_is_pushed_as_is() {
    let device = Arc::new(MockSurface::new());
    let left = Recorder::new("left").arc();
    left.show_strip(solid(400, 100, RED));
    let overlay = Recorder::new("overlay").with_overlay().arc();
    overlay.show_overlay_strip(solid(800, 100, BLUE));
    overlay.set_overlay_active(true);

    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(left.clone(), Resources::new().strip(config::strip_left_half()));
    coordinator.register_module(overlay.clone(), Resources::new());
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);

    tokio::time::sleep(Duration::from_millis(250)).await;
    let frames = device.strip_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].get_pixel(10, 10), &BLUE);
    assert!(!left.calls().contains(&Call::RenderStrip));

    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn strip_halves_are_composited_side_by_side() {
    let device = Arc::new(MockSurface::new());
    let left = Recorder::new("left").arc();
    left.show_strip(solid(400, 100, RED));
    let right = Recorder::new("right").arc();
    right.show_strip(solid(400, 100, BLUE));

    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(left, Resources::new().strip(config::strip_left_half()));
    coordinator.register_module(right, Resources::new().strip(config::strip_right_half()));
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);

    tokio::time::sleep(Duration::from_millis(250)).await;
    let frame = device.strip_frames().pop().unwrap();
    assert_eq!(frame.dimensions(), (800, 100));
    for x in [0, 200, 399] {
        assert_eq!(frame.get_pixel(x, 50), &RED, "x = {x}");
    }
    for x in [400, 600, 799] {
        assert_eq!(frame.get_pixel(x, 50), &BLUE, "x = {x}");
    }

    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_module_is_left_alone() {
    let device = Arc::new(MockSurface::new());
    let broken = Recorder::new("broken").failing_init().arc();
    broken.show_key(KeyId::Key1, key_frame(RED));
    broken.show_strip(solid(400, 100, RED));
    let healthy = Recorder::new("healthy").arc();
    healthy.show_key(KeyId::Key2, key_frame(GREEN));

    let mut coordinator = Coordinator::new(device.clone());
    let broken_handle = coordinator.register_module(
        broken.clone(),
        Resources::new().keys([KeyId::Key1]).strip(config::strip_left_half()),
    );
    let healthy_handle =
        coordinator.register_module(healthy.clone(), Resources::new().keys([KeyId::Key2]));
    let token = CancellationToken::new();
    let (run, events) = spawn(coordinator, &token);

    events.push(SurfaceEvent::KeyDown(KeyId::Key1));
    events.push(SurfaceEvent::KeyUp(KeyId::Key1));
    events.push(SurfaceEvent::KeyDown(KeyId::Key2));
    events.push(SurfaceEvent::KeyUp(KeyId::Key2));
    tick().await;
    tick().await;

    token.cancel();
    let (mut coordinator, result) = run.await.unwrap();
    assert!(result.is_ok());
    assert!(coordinator.is_failed(broken_handle));
    assert!(!coordinator.is_failed(healthy_handle));
    coordinator.stop().await.unwrap();

    assert_eq!(broken.calls(), vec![Call::Init, Call::Stop]);
    assert_eq!(healthy.events().len(), 2);
    assert!(key_pushes(&device.pushes()).iter().all(|(k, _)| *k == KeyId::Key2));
}

#[tokio::test(start_paused = true)]
async fn stop_reaches_every_module_and_joins_render_loop() {
    let device = Arc::new(MockSurface::new());
    let a = Recorder::new("a").failing_stop().arc();
    let b = Recorder::new("b").failing_init().arc();
    let c = Recorder::new("c").arc();
    c.show_key(KeyId::Key3, key_frame(RED));

    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(a.clone(), Resources::new());
    coordinator.register_module(b.clone(), Resources::new());
    coordinator.register_module(c.clone(), Resources::new().keys([KeyId::Key3]));
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);
    tick().await;

    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    let err = coordinator.stop().await.unwrap_err();
    match err {
        CoordinatorError::ModuleStop { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "a");
        }
        other => panic!("unexpected error: {other}"),
    }
    for m in [&a, &b, &c] {
        assert_eq!(m.calls().last(), Some(&Call::Stop));
    }
    assert!(!coordinator.is_running());

    // Render task is gone: no pushes after stop, however long we wait.
    device.take_pushes();
    tick().await;
    tick().await;
    assert!(device.pushes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn module_scope_is_cancelled_by_stop() {
    let device = Arc::new(MockSurface::new());
    let a = Recorder::new("a").arc();
    let mut coordinator = Coordinator::new(device);
    coordinator.register_module(a.clone(), Resources::new());
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);
    tick().await;

    let scope = a.init_token().unwrap();
    assert!(!scope.is_cancelled());
    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    coordinator.stop().await.unwrap();
    assert!(scope.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn disconnect_ends_start_and_double_start_is_rejected() {
    let device = Arc::new(MockSurface::new());
    let mut coordinator = Coordinator::new(device);
    coordinator.register_module(Recorder::new("a").arc(), Resources::new());
    let token = CancellationToken::new();
    let (run, events) = spawn(coordinator, &token);

    events.fail(DeviceError::Disconnected);
    let (mut coordinator, result) = run.await.unwrap();
    let err = result.unwrap_err();
    assert!(err.is_disconnect(), "got {err}");

    let again = coordinator.start(MockEvents::new(), &token).await;
    assert!(matches!(again, Err(CoordinatorError::AlreadyStarted)));
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn handler_error_can_end_the_connection() {
    let device = Arc::new(MockSurface::new());
    let a = Recorder::new("a").arc();
    a.fail_handlers(true);
    let config = CoordinatorConfig {
        handler_errors: HandlerErrorPolicy::Disconnect,
        ..CoordinatorConfig::default()
    };
    let mut coordinator = Coordinator::with_config(device, config);
    coordinator.register_module(a.clone(), Resources::new().keys([KeyId::Key1]));
    let token = CancellationToken::new();
    let (run, events) = spawn(coordinator, &token);

    events.push(SurfaceEvent::KeyDown(KeyId::Key1));
    let (mut coordinator, result) = run.await.unwrap();
    assert!(matches!(result, Err(CoordinatorError::Handler { .. })));
    assert!(!result.unwrap_err().is_disconnect());
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_pushes_do_not_stop_the_tick() {
    let device = Arc::new(MockSurface::new());
    device.fail_key_pushes(true);
    let a = Recorder::new("a").arc();
    a.show_key(KeyId::Key1, key_frame(RED));
    a.show_strip(solid(400, 100, RED));
    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(
        a,
        Resources::new().keys([KeyId::Key1]).strip(config::strip_left_half()),
    );
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);
    tokio::time::sleep(Duration::from_millis(250)).await;
    tick().await;

    // Ticks at 0 and 500 ms both pushed the strip despite key failures.
    assert_eq!(device.strip_frames().len(), 2);
    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    coordinator.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn device_without_strip_gets_no_strip_pushes() {
    let device = Arc::new(MockSurface::with_strip(None));
    let a = Recorder::new("a").arc();
    a.show_strip(solid(400, 100, RED));
    let mut coordinator = Coordinator::new(device.clone());
    coordinator.register_module(a.clone(), Resources::new().strip(config::strip_left_half()));
    let token = CancellationToken::new();
    let (run, _events) = spawn(coordinator, &token);
    tick().await;

    assert!(device.strip_frames().is_empty());
    assert!(!a.calls().contains(&Call::RenderStrip));
    token.cancel();
    let (mut coordinator, _) = run.await.unwrap();
    coordinator.stop().await.unwrap();
}

#[tokio::test]
async fn stop_before_start_is_a_no_op() {
    let a = Recorder::new("a").arc();
    let mut coordinator = Coordinator::new(Arc::new(MockSurface::new()));
    coordinator.register_module(a.clone(), Resources::new());
    assert_eq!(coordinator.module_count(), 1);
    coordinator.stop().await.unwrap();
    assert!(a.calls().is_empty());
}

#[tokio::test]
async fn session_preparation_sets_brightness_and_blanks_keys() {
    let device = MockSurface::new();
    prepare_session(&device, 80).await.unwrap();
    let pushes = device.pushes();
    assert_eq!(pushes[0], Push::Brightness(80));
    let cleared: Vec<_> = pushes[1..]
        .iter()
        .map(|p| match p {
            Push::ClearKey(k) => *k,
            other => panic!("unexpected push {other:?}"),
        })
        .collect();
    assert_eq!(cleared, KeyId::ALL.to_vec());
}
