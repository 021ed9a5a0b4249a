//! Integration Tests
//!
//! End-to-end playback scenarios against the public API, driven by the
//! simulated backend's virtual clock.

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;

use playhead::engine::{
    ChannelLayout, DecodedAudioBuffer, EventKind, EventLog, Loader, PlaybackController,
    SimulatedBackend, TrackSource, WavLoader,
};
use playhead::LoadError;

/// Mono buffer at 1 kHz, one frame per millisecond
fn track_of(duration_ms: usize) -> DecodedAudioBuffer {
    DecodedAudioBuffer::silent(duration_ms, ChannelLayout::Mono, 1000)
}

fn setup(duration_ms: usize) -> (PlaybackController, SimulatedBackend, EventLog) {
    let backend = SimulatedBackend::new();
    let mut controller = PlaybackController::new(backend.clone());
    let log = EventLog::new();
    controller.subscribe(log.clone());

    let ticket = controller.load_track(TrackSource::by_reference("track.wav"));
    controller.complete_load(ticket, Ok(track_of(duration_ms)));
    log.clear();
    (controller, backend, log)
}

// === Position accuracy ===

#[test]
fn test_play_pause_play_scenario() {
    let (mut controller, backend, _) = setup(10_000);

    controller.play();
    backend.advance(2_500.0);
    controller.pause();
    assert_abs_diff_eq!(controller.current_time_millis(), 2_500.0, epsilon = 1e-6);

    controller.play();
    backend.advance(2_500.0);
    assert_abs_diff_eq!(controller.current_time_millis(), 5_000.0, epsilon = 1e-6);
}

#[test]
fn test_double_rate_scenario() {
    let (mut controller, backend, _) = setup(10_000);
    controller.seek(1_000.0);
    controller.set_playback_rate(2.0);
    controller.play();
    backend.advance(1_000.0);
    assert_abs_diff_eq!(controller.current_time_millis(), 3_000.0, epsilon = 1e-6);
}

#[test]
fn test_many_pause_resume_cycles_do_not_drift() {
    let (mut controller, backend, _) = setup(100_000);
    controller.set_playback_rate(1.3);

    for _ in 0..1_000 {
        controller.play();
        backend.advance(7.0);
        controller.pause();
    }
    assert_abs_diff_eq!(controller.current_time_millis(), 7_000.0 * 1.3, epsilon = 1e-6);
}

#[test]
fn test_rate_change_keeps_position_continuous() {
    let (mut controller, backend, _) = setup(60_000);
    controller.play();

    let rates = [1.5, 0.5, 3.0, 1.0, 0.75];
    for &rate in &rates {
        for _ in 0..10 {
            backend.advance(16.0);
            controller.poll();
        }
        let before = controller.current_time_millis();
        controller.set_playback_rate(rate);
        let after = controller.current_time_millis();
        assert_abs_diff_eq!(before, after, epsilon = 1e-6);
    }
    assert!(!controller.paused());
    assert_eq!(backend.live_sources().len(), 1);
}

// === Seeking ===

#[test]
fn test_seek_while_paused_creates_no_source() {
    let (mut controller, backend, log) = setup(10_000);
    controller.seek(6_250.0);

    assert_eq!(controller.current_time_millis(), 6_250.0);
    assert_eq!(backend.created_sources(), 0);
    assert_eq!(log.names(), vec!["timeupdate", "seeked"]);
}

#[test]
fn test_seek_then_play_starts_at_target() {
    let (mut controller, backend, _) = setup(10_000);
    controller.seek(3_000.0);
    controller.play();
    backend.advance(250.0);
    assert_abs_diff_eq!(controller.current_time_millis(), 3_250.0, epsilon = 1e-6);
    assert_eq!(backend.live_sources()[0].offset_millis, 3_000.0);
}

// === Natural end ===

#[test]
fn test_natural_end_exactly_once() {
    let (mut controller, backend, log) = setup(2_000);
    controller.play();
    for _ in 0..200 {
        backend.advance(16.0);
        controller.poll();
    }

    assert_eq!(log.count("ended"), 1);
    assert!(controller.paused());
    assert_eq!(controller.current_time_millis(), 0.0);
}

#[test]
fn test_natural_end_at_double_rate() {
    let (mut controller, backend, log) = setup(2_000);
    controller.set_playback_rate(2.0);
    controller.play();

    backend.advance(999.0);
    controller.poll();
    assert_eq!(log.count("ended"), 0);

    backend.advance(1.0);
    controller.poll();
    assert_eq!(log.count("ended"), 1);
}

#[test]
fn test_pause_right_before_end_suppresses_ended() {
    let (mut controller, backend, log) = setup(2_000);
    controller.play();
    backend.advance(1_999.0);
    let source = backend.live_sources()[0].handle;
    controller.pause();

    backend.inject_ended(source);
    backend.advance(10.0);
    controller.poll();

    assert_eq!(log.count("ended"), 0);
    assert_abs_diff_eq!(controller.current_time_millis(), 1_999.0, epsilon = 1e-6);
}

#[test]
fn test_seek_right_before_end_suppresses_ended() {
    let (mut controller, backend, log) = setup(2_000);
    controller.play();
    backend.advance(1_999.0);
    let source = backend.live_sources()[0].handle;
    controller.seek(500.0);

    backend.inject_ended(source);
    controller.poll();

    assert_eq!(log.count("ended"), 0);
    assert!(!controller.paused());
}

// === Loading ===

#[test]
fn test_load_events_carry_engine_id() {
    let backend = SimulatedBackend::new();
    let mut controller = PlaybackController::new(backend);
    let log = EventLog::new();
    controller.subscribe(log.clone());

    let ticket = controller.load_track(TrackSource::by_blob(vec![0u8; 4]));
    controller.complete_load(ticket, Ok(track_of(500)));

    let events = log.events();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.engine == controller.id()));
    assert_eq!(events[0].kind, EventKind::LoadedData);
}

#[test]
fn test_in_flight_load_never_populates_newer_track() {
    let (mut controller, _, log) = setup(10_000);
    controller.play();

    let stale = controller.load_track(TrackSource::by_reference("a.wav"));
    let current = controller.load_track(TrackSource::by_reference("b.wav"));

    controller.complete_load(stale, Ok(track_of(1_111)));
    assert!(controller.is_loading());
    assert_eq!(controller.duration_millis(), 0.0);

    controller.complete_load(current, Ok(track_of(2_222)));
    assert_eq!(controller.duration_millis(), 2_222.0);
    assert_eq!(log.count("loadeddata"), 1);
    assert_eq!(log.count("ended"), 0);
}

#[test]
fn test_failed_load_reports_error_event() {
    struct Failing;
    impl Loader for Failing {
        fn load(&self, source: &TrackSource) -> Result<DecodedAudioBuffer, LoadError> {
            Err(LoadError::UnsupportedSource {
                source_desc: source.to_string(),
            })
        }
    }

    let (mut controller, _, log) = setup(1_000);
    controller.load_track_with(&Failing, TrackSource::by_reference("https://x/y.wav"));

    assert_eq!(log.names(), vec!["error"]);
    assert!(controller.paused());
    assert_eq!(controller.duration_millis(), 0.0);
}

#[test]
fn test_wav_loader_end_to_end() {
    use hound::{SampleFormat, WavSpec, WavWriter};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    let spec = WavSpec {
        channels: 2,
        sample_rate: 48_000,
        bits_per_sample: 24,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for _ in 0..48_000 * 2 {
        writer.write_sample(1_000_i32).unwrap();
    }
    writer.finalize().unwrap();

    let backend = SimulatedBackend::new();
    let mut controller = PlaybackController::new(backend.clone());
    controller.load_track_with(
        &WavLoader::new(),
        TrackSource::by_reference(path.display().to_string()),
    );
    assert_abs_diff_eq!(controller.duration_millis(), 1_000.0, epsilon = 1e-9);

    controller.play();
    backend.advance(400.0);
    assert_abs_diff_eq!(controller.current_time_millis(), 400.0, epsilon = 1e-9);
}

// === Volume ===

#[test]
fn test_volume_clamp_fires_once() {
    let (mut controller, backend, log) = setup(1_000);
    controller.set_volume(0.3);
    log.clear();

    controller.set_volume(1.5);
    controller.set_volume(1.0);
    assert_eq!(controller.volume(), 1.0);
    assert_eq!(log.names(), vec!["volumechange"]);
    assert_eq!(backend.output_gain(), 1.0);
}
