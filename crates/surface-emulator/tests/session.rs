//! End-to-end behaviour of an emulated session: scripted input, pushed
//! frames, unplugging and screenshots.

use image::{Rgba, RgbaImage};
use surface::{DeviceError, EventSource, KeyId, Point, SurfaceDevice, SurfaceEvent};
use surface_emulator::{Emulator, EmulatorConfig};

#[tokio::test]
async fn scripted_input_reaches_the_session() {
    let emu = Emulator::new();
    let (_device, mut input) = emu.connect().unwrap();
    let queue = emu.input().expect("live session has an input queue");

    queue.press_key(KeyId::Key3);
    queue.release_key(KeyId::Key3);

    assert_eq!(input.next_event().await, Ok(SurfaceEvent::KeyDown(KeyId::Key3)));
    assert_eq!(input.next_event().await, Ok(SurfaceEvent::KeyUp(KeyId::Key3)));
}

#[tokio::test]
async fn unplug_ends_the_stream_after_queued_events() {
    let emu = Emulator::new();
    let (device, mut input) = emu.connect().unwrap();
    emu.input().unwrap().swipe_strip(Point::new(10, 50), Point::new(300, 50));
    emu.unplug();

    assert!(matches!(
        input.next_event().await,
        Ok(SurfaceEvent::StripSwipe { .. })
    ));
    assert_eq!(input.next_event().await, Err(DeviceError::Disconnected));
    assert_eq!(
        device.clear_key(KeyId::Key1).await,
        Err(DeviceError::Disconnected)
    );
    assert!(emu.input().is_none());
}

#[tokio::test]
async fn reconnect_gets_a_fresh_queue() {
    let emu = Emulator::new();
    let (_d1, mut first) = emu.connect().unwrap();
    emu.input().unwrap().press_key(KeyId::Key1);

    let (_d2, mut second) = emu.connect().unwrap();
    // Old stream drains then terminates.
    assert_eq!(first.next_event().await, Ok(SurfaceEvent::KeyDown(KeyId::Key1)));
    assert_eq!(first.next_event().await, Err(DeviceError::Disconnected));
    assert!(second.poll_event().is_none());
}

#[tokio::test]
async fn screenshot_places_keys_and_strip() {
    let emu = Emulator::new();
    let (device, _input) = emu.connect().unwrap();
    let red = RgbaImage::from_pixel(120, 120, Rgba([255, 0, 0, 255]));
    let blue = RgbaImage::from_pixel(800, 100, Rgba([0, 0, 255, 255]));
    device.set_key_image(KeyId::Key6, &red).await.unwrap();
    device.set_strip_image(&blue).await.unwrap();

    let shot = emu.render();
    assert_eq!(shot.dimensions(), EmulatorConfig::DEFAULT.screenshot_size());
    // Key6 is second row, second column: x = 20 + 140, y = 20 + 140.
    assert_eq!(shot.get_pixel(160 + 60, 160 + 60), &Rgba([255, 0, 0, 255]));
    // Strip starts below the key rows.
    assert_eq!(shot.get_pixel(420, 300 + 50), &Rgba([0, 0, 255, 255]));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("surface.png");
    emu.screenshot(&path).unwrap();
    assert!(path.exists());
}
