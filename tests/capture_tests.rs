// Tests for frame geometry, PCM conversion and the capture manager's
// hardware controls.

use std::time::Duration;

use iris_live::capture::{
    f32_to_pcm16, CameraCapabilities, CaptureConfig, CaptureManager, MediaChunk, RawFrame,
    SyntheticDevice, ZoomDirection,
};
use iris_live::CaptureError;
use tokio::sync::mpsc;

fn gradient_frame(width: u32, height: u32) -> RawFrame {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(x as u8);
            pixels.push(y as u8);
            pixels.push(0);
        }
    }
    RawFrame {
        width,
        height,
        pixels,
    }
}

#[test]
fn test_pcm16_conversion() {
    let pcm = f32_to_pcm16(&[0.0, 0.5, -0.5]);
    assert_eq!(pcm.len(), 6);
    assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 0);
    assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), 16384);
    assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), -16384);
}

#[test]
fn test_pcm16_conversion_clamps() {
    let pcm = f32_to_pcm16(&[1.5, -1.5, 1.0]);
    assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), i16::MAX);
    assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), i16::MIN);
    // 1.0 * 32768 overflows i16 and must clamp, not wrap.
    assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), i16::MAX);
}

#[test]
fn test_center_crop_landscape() {
    let cropped = gradient_frame(8, 4).crop_center_square();
    assert_eq!((cropped.width, cropped.height), (4, 4));

    // Two columns trimmed from each side: first pixel is x=2, y=0.
    assert_eq!(cropped.pixels[0], 2);
    assert_eq!(cropped.pixels[1], 0);
}

#[test]
fn test_center_crop_square_is_identity() {
    let frame = gradient_frame(4, 4);
    let cropped = frame.crop_center_square();
    assert_eq!(cropped.pixels, frame.pixels);
}

#[test]
fn test_scale_to_halves() {
    let scaled = gradient_frame(8, 8).scale_to(4);
    assert_eq!((scaled.width, scaled.height), (4, 4));
    assert_eq!(scaled.pixels.len(), 4 * 4 * 3);

    // Nearest-neighbour: output pixel (1, 1) samples source (2, 2).
    let idx = ((1 * 4 + 1) * 3) as usize;
    assert_eq!(scaled.pixels[idx], 2);
    assert_eq!(scaled.pixels[idx + 1], 2);
}

#[test]
fn test_scale_to_upscales_small_frames() {
    let scaled = gradient_frame(4, 4).scale_to(8);
    assert_eq!((scaled.width, scaled.height), (8, 8));

    // Output pixel (3, 3) samples source (1, 1).
    let idx = ((3 * 8 + 3) * 3) as usize;
    assert_eq!(scaled.pixels[idx], 1);
    assert_eq!(scaled.pixels[idx + 1], 1);
}

#[tokio::test]
async fn test_acquire_is_idempotent() {
    let device = SyntheticDevice::new();
    let mut manager = CaptureManager::new(CaptureConfig::default());

    assert!(!manager.is_acquired());
    manager.acquire(&device).await.unwrap();
    assert!(manager.is_acquired());

    let capabilities = manager.capabilities().unwrap();
    assert!(capabilities.has_torch);
    assert!(capabilities.has_zoom);

    // A second acquire reuses the warm tracks.
    manager.acquire(&device).await.unwrap();
    assert!(manager.is_acquired());
}

#[tokio::test]
async fn test_acquire_permission_denied() {
    let device = SyntheticDevice::failing(CaptureError::PermissionDenied);
    let mut manager = CaptureManager::new(CaptureConfig::default());

    let err = manager.acquire(&device).await.unwrap_err();
    assert!(matches!(err, CaptureError::PermissionDenied));
    assert!(!manager.is_acquired());
}

#[tokio::test]
async fn test_zoom_clamps_at_the_bounds() {
    let device = SyntheticDevice::new(); // zoom 1.0..3.0, step 0.5
    let mut manager = CaptureManager::new(CaptureConfig::default());
    manager.acquire(&device).await.unwrap();

    assert_eq!(manager.current_zoom(), 1.0);
    for expected in [1.5, 2.0, 2.5, 3.0] {
        let zoom = manager.change_zoom(ZoomDirection::In);
        assert!((zoom - expected).abs() < 1e-9);
    }

    // At the maximum, zooming in further is a no-op.
    for _ in 0..3 {
        assert!((manager.change_zoom(ZoomDirection::In) - 3.0).abs() < 1e-9);
    }

    let zoom = manager.change_zoom(ZoomDirection::Out);
    assert!((zoom - 2.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_zoom_bound_not_on_step_grid() {
    let device = SyntheticDevice::with_capabilities(CameraCapabilities {
        has_torch: false,
        has_zoom: true,
        min_zoom: 1.0,
        max_zoom: 2.2,
        zoom_step: 0.5,
    });
    let mut manager = CaptureManager::new(CaptureConfig::default());
    manager.acquire(&device).await.unwrap();

    manager.change_zoom(ZoomDirection::In); // 1.5
    manager.change_zoom(ZoomDirection::In); // 2.0
    let zoom = manager.change_zoom(ZoomDirection::In); // clamped to 2.2
    assert!((zoom - 2.2).abs() < 1e-9);
    let zoom = manager.change_zoom(ZoomDirection::In);
    assert!((zoom - 2.2).abs() < 1e-9, "no-op expected at the bound");
}

#[tokio::test]
async fn test_controls_without_capability_are_noops() {
    let device = SyntheticDevice::with_capabilities(CameraCapabilities::default());
    let mut manager = CaptureManager::new(CaptureConfig::default());
    manager.acquire(&device).await.unwrap();

    assert!(!manager.toggle_torch());
    assert!(!manager.flashlight_on());
    assert_eq!(manager.change_zoom(ZoomDirection::In), 1.0);
    assert_eq!(manager.change_zoom(ZoomDirection::Out), 1.0);
}

#[tokio::test]
async fn test_torch_toggles_and_release_resets() {
    let device = SyntheticDevice::new();
    let mut manager = CaptureManager::new(CaptureConfig::default());
    manager.acquire(&device).await.unwrap();

    assert!(manager.toggle_torch());
    assert!(manager.flashlight_on());

    manager.release().await;
    assert!(!manager.is_acquired());
    assert!(!manager.flashlight_on());
    assert!(manager.capabilities().is_none());
    assert_eq!(manager.current_zoom(), 1.0);

    // Releasing again is safe.
    manager.release().await;
    assert!(!manager.is_acquired());
}

#[tokio::test]
async fn test_audio_pump_emits_pcm_chunks() {
    let device = SyntheticDevice::new();
    let config = CaptureConfig {
        window_samples: 512, // small windows so the test finishes quickly
        ..CaptureConfig::default()
    };
    let mut manager = CaptureManager::new(config);
    manager.acquire(&device).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let pump = manager.start_audio(tx).await.unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("audio chunk within deadline")
        .expect("channel open");

    match chunk {
        MediaChunk::Audio { pcm, sample_rate } => {
            assert_eq!(pcm.len(), 512 * 2);
            assert_eq!(sample_rate, 16000);
        }
        other => panic!("expected audio chunk, got {:?}", other),
    }

    pump.abort();
    manager.release().await;
}

#[tokio::test]
async fn test_video_pump_emits_square_jpeg_frames() {
    let device = SyntheticDevice::new();
    let config = CaptureConfig {
        frame_rate: 20.0, // fast cadence so the test finishes quickly
        ..CaptureConfig::default()
    };
    let mut manager = CaptureManager::new(config);
    manager.acquire(&device).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let pump = manager.start_video(tx).unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("video frame within deadline")
        .expect("channel open");

    match chunk {
        MediaChunk::VideoFrame { jpeg } => {
            assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
            // The synthetic envelope records the encoded dimensions.
            let width = u32::from_be_bytes([jpeg[2], jpeg[3], jpeg[4], jpeg[5]]);
            let height = u32::from_be_bytes([jpeg[6], jpeg[7], jpeg[8], jpeg[9]]);
            // 1280x720 source: cropped to 720x720, then scaled to the target.
            assert_eq!((width, height), (768, 768));
        }
        other => panic!("expected video frame, got {:?}", other),
    }

    pump.abort();
    manager.release().await;
}

#[tokio::test]
async fn test_video_pump_skips_ticks_without_a_frame() {
    let device = SyntheticDevice::without_frames();
    let config = CaptureConfig {
        frame_rate: 50.0,
        ..CaptureConfig::default()
    };
    let mut manager = CaptureManager::new(config);
    manager.acquire(&device).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let pump = manager.start_video(tx).unwrap();

    // Many tick periods pass with no ready frame: nothing is emitted and the
    // pump keeps running, waiting for the camera to warm up.
    let waited = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(waited.is_err(), "no frame source, no chunks expected");
    assert!(!pump.is_finished());

    pump.abort();
    manager.release().await;
}

#[tokio::test]
async fn test_pumps_require_acquisition() {
    let mut manager = CaptureManager::new(CaptureConfig::default());

    let (tx, _rx) = mpsc::channel(1);
    assert!(manager.start_audio(tx.clone()).await.is_err());
    assert!(manager.start_video(tx).is_err());
}
